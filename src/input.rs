// ServeSense - Capture Input Manager
//
// Debounced toggle/button handler.  Polled once per control-loop iteration
// with the raw pin level; accepted edges are pushed into the capture event
// queue that the loop drains afterwards.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::config::{ActiveLevel, InputMode, PipelineConfig};
use crate::events::CaptureEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Edge lockout filter: the first level change is accepted at once, then
/// every further change is dropped until `debounce` has passed since the last
/// accepted edge.
#[derive(Debug)]
pub struct Debouncer {
    debounce: Duration,
    last_raw: bool,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    /// `initial` is the level seen at boot; it never produces an edge by
    /// itself.
    pub fn new(debounce: Duration, initial: bool) -> Self {
        Self {
            debounce,
            last_raw: initial,
            last_accepted: None,
        }
    }

    pub fn update(&mut self, active: bool, now: Instant) -> Option<Edge> {
        if active == self.last_raw {
            return None;
        }
        self.last_raw = active;

        if let Some(last) = self.last_accepted {
            let since = now.saturating_duration_since(last);
            if since < self.debounce {
                log::trace!("Edge suppressed {} ms after the last one", since.as_millis());
                return None;
            }
        }

        self.last_accepted = Some(now);
        Some(if active { Edge::Rising } else { Edge::Falling })
    }

    /// Last raw level seen.
    pub fn level(&self) -> bool {
        self.last_raw
    }
}

pub struct InputManager {
    debouncer: Debouncer,
    active_level: ActiveLevel,
    mode: InputMode,
    event_tx: Sender<CaptureEvent>,
}

impl InputManager {
    pub fn new(
        config: &PipelineConfig,
        initial_pin_high: bool,
        event_tx: Sender<CaptureEvent>,
    ) -> Self {
        let initial = config.active_level.is_active(initial_pin_high);
        // A switch already closed at power-on means "record now".
        if initial && config.input_mode == InputMode::ToggleSwitch {
            log::info!("Record switch closed at boot - starting capture");
            let _ = event_tx.send(CaptureEvent::Start);
        }
        Self {
            debouncer: Debouncer::new(config.debounce, initial),
            active_level: config.active_level,
            mode: config.input_mode,
            event_tx,
        }
    }

    /// Call every loop iteration with the current pin level.
    pub fn update(&mut self, pin_high: bool, now: Instant) {
        let active = self.active_level.is_active(pin_high);
        let Some(edge) = self.debouncer.update(active, now) else {
            return;
        };

        let event = match (self.mode, edge) {
            (InputMode::ToggleSwitch, Edge::Rising) => CaptureEvent::Start,
            (InputMode::ToggleSwitch, Edge::Falling) => CaptureEvent::Stop,
            (InputMode::PushButton, Edge::Rising) => CaptureEvent::Toggle,
            // Button release carries no meaning.
            (InputMode::PushButton, Edge::Falling) => return,
        };

        log::debug!("Input edge {:?} -> {:?}", edge, event);
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_edge_is_accepted_immediately() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(50), false);
        assert_eq!(d.update(false, t0 + ms(10)), None);
        assert_eq!(d.update(true, t0 + ms(20)), Some(Edge::Rising));
        assert_eq!(d.update(true, t0 + ms(30)), None);
        assert!(d.level());
    }

    #[test]
    fn edges_inside_lockout_give_one_transition() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(200), false);
        assert_eq!(d.update(true, t0), Some(Edge::Rising));
        assert_eq!(d.update(false, t0 + ms(80)), None);
        assert_eq!(d.update(true, t0 + ms(120)), None);
        assert_eq!(d.update(false, t0 + ms(150)), None);
        for step in 16..60 {
            assert_eq!(d.update(false, t0 + ms(step * 10)), None);
        }
    }

    #[test]
    fn edge_after_lockout_is_accepted() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(50), true);
        assert_eq!(d.update(false, t0 + ms(500)), Some(Edge::Falling));
        assert_eq!(d.update(true, t0 + ms(520)), None);
        assert_eq!(d.update(false, t0 + ms(540)), None);
        assert_eq!(d.update(true, t0 + ms(600)), Some(Edge::Rising));
    }

    #[test]
    fn boot_level_produces_no_edge() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(50), true);
        assert_eq!(d.update(true, t0 + ms(500)), None);
        assert!(d.level());
    }

    #[test]
    fn toggle_switch_emits_start_and_stop() {
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel();
        let cfg = PipelineConfig::default();
        // Active low: pin high = switch open.
        let mut input = InputManager::new(&cfg, true, tx);

        input.update(false, t0 + ms(10));
        input.update(false, t0 + ms(70));
        input.update(true, t0 + ms(200));
        input.update(true, t0 + ms(260));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![CaptureEvent::Start, CaptureEvent::Stop]);
    }

    #[test]
    fn switch_closed_at_boot_starts_capture() {
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel();
        let mut input = InputManager::new(&PipelineConfig::default(), false, tx);
        input.update(false, t0 + ms(500));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![CaptureEvent::Start]);
    }

    #[test]
    fn button_held_at_boot_is_not_a_press() {
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel();
        let mut input = InputManager::new(&PipelineConfig::button(), false, tx);
        input.update(false, t0 + ms(100));
        input.update(true, t0 + ms(300));

        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn quick_tap_toggles_once() {
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel();
        let mut input = InputManager::new(&PipelineConfig::button(), true, tx);

        input.update(false, t0 + ms(10));
        input.update(true, t0 + ms(130));
        input.update(true, t0 + ms(700));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![CaptureEvent::Toggle]);
    }

    #[test]
    fn push_button_emits_toggle_on_press_only() {
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel();
        let cfg = PipelineConfig::button();
        let mut input = InputManager::new(&cfg, true, tx);

        input.update(false, t0 + ms(10));
        input.update(true, t0 + ms(300));
        input.update(false, t0 + ms(600));
        input.update(true, t0 + ms(900));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![CaptureEvent::Toggle, CaptureEvent::Toggle]);
    }
}
