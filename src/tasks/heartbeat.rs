// ServeSense - Heartbeat Task
//
// Logs the capture-active flag every 2 s so a serial monitor shows the
// firmware is alive even when no capture is running.

use std::thread;
use std::time::Duration;

use crate::capture::CaptureFlag;
use crate::config::HEARTBEAT_INTERVAL_MS;

pub fn heartbeat_task(flag: CaptureFlag) {
    log::info!("Heartbeat task started");

    let interval = Duration::from_millis(HEARTBEAT_INTERVAL_MS);
    loop {
        thread::sleep(interval);
        log::info!(
            "[HEARTBEAT] Recording={}",
            if flag.is_active() { "YES" } else { "NO" }
        );
    }
}
