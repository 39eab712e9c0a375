// ServeSense - Telemetry
//
// Notification side of the point-to-point link.  A transport receives the
// exact characteristic payloads; a missing peer simply drops them.

use std::io::Write;

use crate::events::SensorData;

/// Channel ids, named after the GATT characteristics of the ServeSense
/// service (0xFF00).
pub const CHANNEL_IMU: u16 = 0xFF01;
pub const CHANNEL_CONTROL: u16 = 0xFF02;
pub const CHANNEL_STATE: u16 = 0xFF04;
pub const CHANNEL_RESULT: u16 = 0xFF05;

pub const IMU_PACKET_LEN: usize = 36;

pub const FLAG_CAPTURE: u8 = 0x01;
pub const FLAG_MARKER: u8 = 0x02;

pub trait Telemetry {
    /// Single byte: 1 = recording, 0 = idle.
    fn notify_state(&mut self, recording: bool);
    fn notify_result(&mut self, message: &str);
    fn notify_sample(&mut self, packet: &ImuPacket);
}

/// One streamed IMU sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuPacket {
    pub millis: u32,
    pub session: u16,
    pub sequence: u16,
    pub data: SensorData,
    pub flags: u8,
}

impl ImuPacket {
    /// Packed little-endian layout, 36 bytes:
    /// millis u32 | session u16 | sequence u16 | ax ay az gx gy gz f32 | flags u8 | reserved [u8; 3]
    pub fn encode(&self) -> [u8; IMU_PACKET_LEN] {
        let mut buf = [0u8; IMU_PACKET_LEN];
        buf[0..4].copy_from_slice(&self.millis.to_le_bytes());
        buf[4..6].copy_from_slice(&self.session.to_le_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_le_bytes());
        let d = &self.data;
        for (i, v) in [d.ax, d.ay, d.az, d.gx, d.gy, d.gz].iter().enumerate() {
            let at = 8 + i * 4;
            buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        buf[32] = self.flags;
        buf
    }
}

/// Writes every notification as one text line `<channel> <payload>` on a
/// byte stream (UART console on the device).  Binary payloads are hex.
/// Write errors drop the notification.
pub struct SerialTelemetry<W: Write> {
    out: W,
}

impl<W: Write> SerialTelemetry<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, channel: u16, payload: core::fmt::Arguments<'_>) {
        let res = writeln!(self.out, "{:04x} {}", channel, payload).and_then(|_| self.out.flush());
        if let Err(e) = res {
            log::debug!("Telemetry channel {:04x} dropped: {}", channel, e);
        }
    }
}

impl<W: Write> Telemetry for SerialTelemetry<W> {
    fn notify_state(&mut self, recording: bool) {
        self.send(CHANNEL_STATE, format_args!("{:02x}", recording as u8));
    }

    fn notify_result(&mut self, message: &str) {
        self.send(CHANNEL_RESULT, format_args!("{}", message));
    }

    fn notify_sample(&mut self, packet: &ImuPacket) {
        let bytes = packet.encode();
        self.send(CHANNEL_IMU, format_args!("{}", Hex(&bytes)));
    }
}

struct Hex<'a>(&'a [u8]);

impl core::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingTelemetry {
        pub states: Vec<bool>,
        pub results: Vec<String>,
        pub samples: Vec<ImuPacket>,
    }

    impl Telemetry for RecordingTelemetry {
        fn notify_state(&mut self, recording: bool) {
            self.states.push(recording);
        }

        fn notify_result(&mut self, message: &str) {
            self.results.push(message.to_string());
        }

        fn notify_sample(&mut self, packet: &ImuPacket) {
            self.samples.push(*packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Disconnected;

    impl Write for Disconnected {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::NotConnected.into())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn packet_layout() {
        let pkt = ImuPacket {
            millis: 0x0102_0304,
            session: 7,
            sequence: 513,
            data: SensorData { ax: 1.0, ay: 0.0, az: 0.0, gx: 0.0, gy: 0.0, gz: -2.0 },
            flags: FLAG_CAPTURE | FLAG_MARKER,
        };
        let b = pkt.encode();
        assert_eq!(&b[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&b[4..6], &[7, 0]);
        assert_eq!(&b[6..8], &[0x01, 0x02]);
        assert_eq!(&b[8..12], &1.0f32.to_le_bytes());
        assert_eq!(&b[28..32], &(-2.0f32).to_le_bytes());
        assert_eq!(b[32], 0x03);
        assert_eq!(&b[33..], &[0, 0, 0]);
    }

    #[test]
    fn serial_lines() {
        let mut t = SerialTelemetry::new(Vec::new());
        t.notify_state(true);
        t.notify_result("good-serve:90.0,5.0,3.0,2.0");
        t.notify_state(false);
        let text = String::from_utf8(t.into_inner()).unwrap();
        assert_eq!(text, "ff04 01\nff05 good-serve:90.0,5.0,3.0,2.0\nff04 00\n");
    }

    #[test]
    fn sample_line_is_hex_packet() {
        let mut t = SerialTelemetry::new(Vec::new());
        t.notify_sample(&ImuPacket {
            millis: 1,
            session: 1,
            sequence: 0,
            data: SensorData::default(),
            flags: FLAG_CAPTURE,
        });
        let text = String::from_utf8(t.into_inner()).unwrap();
        let payload = text.trim_end().strip_prefix("ff01 ").unwrap();
        assert_eq!(payload.len(), IMU_PACKET_LEN * 2);
        assert!(payload.starts_with("010000000100"));
    }

    #[test]
    fn disconnected_peer_is_silent() {
        let mut t = SerialTelemetry::new(Disconnected);
        t.notify_state(true);
        t.notify_result("unknown:1.0,1.0,1.0,1.0");
    }
}
