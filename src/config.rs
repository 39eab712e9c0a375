// ServeSense - Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-S3 + ICM-20600 breakout

use std::time::Duration;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-S3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_RECORD_SWITCH: i32 = 2;   // D1    - Record toggle (INPUT_PULLUP, closed = LOW)
pub const PIN_CAPTURE_BUTTON: i32 = 0;  // BOOT  - Push button (INPUT_PULLUP, active LOW)
pub const PIN_VIBRATION_MOTOR: i32 = 1; // D0/A0 - Vibration motor
pub const PIN_STATUS_LED: i32 = 21;     // Built-in user LED (active LOW)
pub const PIN_I2C_SDA: i32 = 5;         // D4    - I2C data line
pub const PIN_I2C_SCL: i32 = 6;         // D5    - I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_ICM20600: u8 = 0x69;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_CONSOLE: usize = 4096;
pub const STACK_HEARTBEAT: usize = 3072;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SAMPLE_PERIOD_MS: u64 = 25;          // ~40 Hz classifier capture
pub const LOGGER_SAMPLE_PERIOD_MS: u64 = 10;   // 100 Hz logger capture
pub const LOOP_TICK_MS: u64 = 5;               // control loop idle wait
pub const SWITCH_DEBOUNCE_MS: u64 = 50;
pub const BUTTON_DEBOUNCE_MS: u64 = 200;
pub const HEARTBEAT_INTERVAL_MS: u64 = 2000;
pub const HALT_POLL_MS: u64 = 100;
pub const CONSOLE_POLL_MS: u64 = 20;

// ---------------------------------------------------------------------------
// Model (int8 TFLite, input (160, 6), output (4,))
// ---------------------------------------------------------------------------
pub const SEQUENCE_LENGTH: usize = 160;   // 160 samples @ 40 Hz = 4 seconds
pub const NUM_FEATURES: usize = 6;        // ax, ay, az, gx, gy, gz
pub const INPUT_TENSOR_LEN: usize = SEQUENCE_LENGTH * NUM_FEATURES; // 960
pub const NUM_CLASSES: usize = 4;
pub const CONFIDENCE_THRESHOLD: f32 = 0.35;
pub const CONFIDENCE_MARGIN: f32 = 0.08;  // top1 - top2, only when enabled
pub const RESULT_MSG_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// ICM-20600 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_2G: f32 = 16384.0;  // LSB/g   at ±2 g
pub const GYRO_SCALE_250: f32 = 131.0;    // LSB/°/s at ±250 °/s

// ---------------------------------------------------------------------------
// Deployment configuration
// ---------------------------------------------------------------------------

/// Electrical level that means "capture requested" on the input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveLevel {
    Low,
    High,
}

impl ActiveLevel {
    pub fn is_active(self, pin_high: bool) -> bool {
        match self {
            Self::Low => !pin_high,
            Self::High => pin_high,
        }
    }
}

/// How the physical input maps onto capture requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Closed = start recording, open = stop.
    ToggleSwitch,
    /// Every accepted press flips between idle and recording.
    PushButton,
}

/// Values that differ between deployments of the same firmware.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_period: Duration,
    pub debounce: Duration,
    pub active_level: ActiveLevel,
    pub input_mode: InputMode,
    pub confidence_threshold: f32,
    /// Required lead of the best score over the runner-up. `None` disables the
    /// rule and only the absolute threshold applies.
    pub margin: Option<f32>,
    /// Publish every captured sample on the telemetry stream.
    pub stream_samples: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(SAMPLE_PERIOD_MS),
            debounce: Duration::from_millis(SWITCH_DEBOUNCE_MS),
            active_level: ActiveLevel::Low,
            input_mode: InputMode::ToggleSwitch,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            margin: None,
            stream_samples: false,
        }
    }
}

impl PipelineConfig {
    /// BOOT-button wiring with 100 Hz capture and the sample stream enabled.
    pub fn button() -> Self {
        Self {
            sample_period: Duration::from_millis(LOGGER_SAMPLE_PERIOD_MS),
            debounce: Duration::from_millis(BUTTON_DEBOUNCE_MS),
            input_mode: InputMode::PushButton,
            stream_samples: true,
            ..Self::default()
        }
    }

    /// GPIO number of the capture input for this deployment.
    pub fn input_pin(&self) -> i32 {
        match self.input_mode {
            InputMode::ToggleSwitch => PIN_RECORD_SWITCH,
            InputMode::PushButton => PIN_CAPTURE_BUTTON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_low_inverts_pin_level() {
        assert!(ActiveLevel::Low.is_active(false));
        assert!(!ActiveLevel::Low.is_active(true));
        assert!(ActiveLevel::High.is_active(true));
    }

    #[test]
    fn button_preset_keeps_decision_constants() {
        let cfg = PipelineConfig::button();
        assert_eq!(cfg.input_mode, InputMode::PushButton);
        assert_eq!(cfg.debounce, Duration::from_millis(200));
        assert_eq!(cfg.confidence_threshold, CONFIDENCE_THRESHOLD);
        assert_eq!(cfg.input_pin(), PIN_CAPTURE_BUTTON);
        assert!(cfg.margin.is_none());
    }
}
