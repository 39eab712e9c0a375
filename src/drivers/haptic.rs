// ServeSense - Haptic Motor Driver
//
// Simple GPIO-driven vibration motor.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(mut pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        let _ = pin.set_low();
        Self { pin }
    }

    pub fn set(&mut self, on: bool) {
        let _ = if on { self.pin.set_high() } else { self.pin.set_low() };
    }
}
