// ServeSense - Command Console Task
//
// Reads control bytes from the serial console and forwards them to the
// control loop's event queue.  Accepts the raw protocol bytes (0x00 stop,
// 0x01 start, 0x02 mark) as well as their ASCII digits for terminal use.

use std::io::{self, Read};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::config::CONSOLE_POLL_MS;
use crate::events::{CaptureEvent, Command};
use crate::telemetry::CHANNEL_CONTROL;

/// `None` for line terminators, otherwise the parsed command or the
/// unrecognised byte.
pub fn parse_console_byte(byte: u8) -> Option<Result<Command, u8>> {
    match byte {
        b'\r' | b'\n' => None,
        b'0'..=b'2' => Some(Command::try_from(byte - b'0')),
        other => Some(Command::try_from(other)),
    }
}

/// Forward every byte currently available on `reader`.  Returns `Ok(false)`
/// once the control loop's queue is gone.
pub fn drain_console<R: Read>(reader: &mut R, event_tx: &Sender<CaptureEvent>) -> io::Result<bool> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            // Nothing buffered right now.
            Ok(0) => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
            Err(e) => return Err(e),
        }

        let cmd = match parse_console_byte(byte[0]) {
            None => continue,
            Some(Ok(cmd)) => cmd,
            Some(Err(other)) => {
                log::warn!("[CTRL] unknown cmd 0x{:02X}", other);
                continue;
            }
        };

        log::info!("[CTRL] {:?}", cmd);
        if event_tx.send(cmd.into()).is_err() {
            return Ok(false);
        }
    }
}

pub fn console_task<R: Read>(mut reader: R, event_tx: Sender<CaptureEvent>) {
    log::info!("Console task started (channel {:04x})", CHANNEL_CONTROL);

    let poll = Duration::from_millis(CONSOLE_POLL_MS);
    loop {
        match drain_console(&mut reader, &event_tx) {
            Ok(true) => thread::sleep(poll),
            Ok(false) => {
                log::warn!("Event queue closed - exiting console task");
                return;
            }
            Err(e) => {
                log::warn!("Console read error: {} - exiting console task", e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn ascii_and_raw_bytes() {
        assert_eq!(parse_console_byte(b'1'), Some(Ok(Command::Start)));
        assert_eq!(parse_console_byte(0x02), Some(Ok(Command::Mark)));
        assert_eq!(parse_console_byte(b'\n'), None);
        assert_eq!(parse_console_byte(b'x'), Some(Err(b'x')));
    }

    #[test]
    fn forwards_available_commands() {
        let (tx, rx) = mpsc::channel();
        let mut input = Cursor::new(b"1\r\n2\n9\x00".to_vec());
        assert!(drain_console(&mut input, &tx).unwrap());
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![CaptureEvent::Start, CaptureEvent::Mark, CaptureEvent::Stop]
        );
    }

    #[test]
    fn reports_closed_queue() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut input = Cursor::new(b"1".to_vec());
        assert!(!drain_console(&mut input, &tx).unwrap());
    }
}
