// ServeSense - System Events & Data Types

use crate::config::{NUM_CLASSES, NUM_FEATURES};

// ---------------------------------------------------------------------------
// Sensor Data (6-axis IMU reading from ICM-20600)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorData {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
}

impl SensorData {
    /// Feature order expected by the model: ax, ay, az, gx, gy, gz.
    pub fn features(&self) -> [f32; NUM_FEATURES] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }
}

// ---------------------------------------------------------------------------
// Serve Classification
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeClass {
    GoodServe,
    JerkyMotion,
    LacksPronation,
    ShortSwing,
}

impl ServeClass {
    /// Model output order.
    pub const ALL: [ServeClass; NUM_CLASSES] = [
        Self::GoodServe,
        Self::JerkyMotion,
        Self::LacksPronation,
        Self::ShortSwing,
    ];

    /// Label string used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GoodServe      => "good-serve",
            Self::JerkyMotion    => "jerky-motion",
            Self::LacksPronation => "lacks-pronation",
            Self::ShortSwing     => "short-swing",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Outcome label of one classification cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Confident(ServeClass),
    Unknown,
}

impl Label {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confident(class) => class.label(),
            Self::Unknown => Self::UNKNOWN,
        }
    }
}

// ---------------------------------------------------------------------------
// Capture control
// ---------------------------------------------------------------------------

/// Single-byte command written by the telemetry peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stop,
    Start,
    Mark,
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(Self::Stop),
            0x01 => Ok(Self::Start),
            0x02 => Ok(Self::Mark),
            other => Err(other),
        }
    }
}

/// Events drained by the control loop once per iteration. Produced by the
/// debounced physical input and by the command console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    Start,
    Stop,
    /// Push-button press: start when idle, stop when recording.
    Toggle,
    Mark,
}

impl From<Command> for CaptureEvent {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Stop => Self::Stop,
            Command::Start => Self::Start,
            Command::Mark => Self::Mark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes() {
        assert_eq!(Command::try_from(0x00), Ok(Command::Stop));
        assert_eq!(Command::try_from(0x01), Ok(Command::Start));
        assert_eq!(Command::try_from(0x02), Ok(Command::Mark));
        assert_eq!(Command::try_from(0x7f), Err(0x7f));
    }

    #[test]
    fn class_order_matches_labels() {
        let labels: Vec<_> = ServeClass::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            ["good-serve", "jerky-motion", "lacks-pronation", "short-swing"]
        );
        assert_eq!(ServeClass::from_index(2), Some(ServeClass::LacksPronation));
        assert_eq!(ServeClass::from_index(4), None);
        assert_eq!(Label::Unknown.as_str(), "unknown");
    }
}
