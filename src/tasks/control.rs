// ServeSense - Control Task
//
// Drives the controller forever at a fixed idle tick.  Debounce and sample
// pacing are timestamp-based inside the controller, so the tick only bounds
// the polling latency.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::LOOP_TICK_MS;
use crate::controller::{Controller, SensorSource};
use crate::feedback::Actuators;
use crate::model::InferenceEngine;
use crate::telemetry::Telemetry;

pub fn control_task<S, E, A, T, P>(mut controller: Controller<S, E, A, T>, mut pin_high: P) -> !
where
    S: SensorSource,
    E: InferenceEngine,
    A: Actuators,
    T: Telemetry,
    P: FnMut() -> bool,
{
    log::info!("[Ready - flip the switch to record a serve]");

    let tick = Duration::from_millis(LOOP_TICK_MS);
    loop {
        controller.step(pin_high(), Instant::now());
        thread::sleep(tick);
    }
}
