pub mod haptic;
pub mod imu;
pub mod led;

use std::thread;
use std::time::Duration;

use crate::feedback::Actuators;

use self::haptic::HapticDriver;
use self::led::StatusLed;

/// Vibration motor and status LED as the feedback output pair.
pub struct BoardOutputs<'d> {
    pub haptic: HapticDriver<'d>,
    pub led: StatusLed<'d>,
}

impl Actuators for BoardOutputs<'_> {
    fn set_indicator(&mut self, on: bool) {
        self.led.set(on);
    }

    fn set_haptic(&mut self, on: bool) {
        self.haptic.set(on);
    }

    fn wait(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}
