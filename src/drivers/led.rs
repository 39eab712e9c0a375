// ServeSense - Status LED Driver
//
// The Xiao ESP32-S3 user LED sinks current: driving the pin LOW lights it.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

pub struct StatusLed<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
    active_low: bool,
}

impl<'d> StatusLed<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>, active_low: bool) -> Self {
        let mut led = Self { pin, active_low };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        let high = on != self.active_low;
        let _ = if high { self.pin.set_high() } else { self.pin.set_low() };
    }
}
