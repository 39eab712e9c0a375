// ServeSense - Feedback Patterns
//
// Each outcome maps to a fixed sequence of (on, off) pulses played on the
// vibration motor and status LED together.  Playback blocks the calling
// thread.

use std::time::Duration;

use crate::events::{Label, ServeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub on_ms: u16,
    pub off_ms: u16,
}

const fn pulse(on_ms: u16, off_ms: u16) -> Pulse {
    Pulse { on_ms, off_ms }
}

pub type FeedbackPattern = &'static [Pulse];

/// Boot: one 1 s pulse.
pub const STARTUP: FeedbackPattern = &[pulse(1000, 0)];
/// Three quick happy pulses.
pub const GOOD_SERVE: FeedbackPattern = &[pulse(100, 100), pulse(100, 100), pulse(100, 100)];
/// Two long, rough pulses.
pub const JERKY_MOTION: FeedbackPattern = &[pulse(400, 200), pulse(400, 200)];
/// One long warning pulse followed by two short ones.
pub const LACKS_PRONATION: FeedbackPattern = &[pulse(500, 150), pulse(100, 100), pulse(100, 100)];
/// Four very short rapid pulses.
pub const SHORT_SWING: FeedbackPattern = &[pulse(80, 80), pulse(80, 80), pulse(80, 80), pulse(80, 80)];

pub fn pattern_for(class: ServeClass) -> FeedbackPattern {
    match class {
        ServeClass::GoodServe => GOOD_SERVE,
        ServeClass::JerkyMotion => JERKY_MOTION,
        ServeClass::LacksPronation => LACKS_PRONATION,
        ServeClass::ShortSwing => SHORT_SWING,
    }
}

/// `None` for unknown results: nothing plays.
pub fn pattern_for_label(label: Label) -> Option<FeedbackPattern> {
    match label {
        Label::Confident(class) => Some(pattern_for(class)),
        Label::Unknown => None,
    }
}

/// The two binary outputs plus the blocking wait used between edges.
pub trait Actuators {
    fn set_indicator(&mut self, on: bool);
    fn set_haptic(&mut self, on: bool);
    fn wait(&mut self, duration: Duration);
}

/// Play `pattern` on both outputs, then force both off.
pub fn play<A: Actuators + ?Sized>(outputs: &mut A, pattern: FeedbackPattern) {
    for p in pattern {
        outputs.set_haptic(true);
        outputs.set_indicator(true);
        outputs.wait(Duration::from_millis(p.on_ms as u64));
        outputs.set_haptic(false);
        outputs.set_indicator(false);
        if p.off_ms > 0 {
            outputs.wait(Duration::from_millis(p.off_ms as u64));
        }
    }
    idle(outputs);
}

/// Both outputs inactive.
pub fn idle<A: Actuators + ?Sized>(outputs: &mut A) {
    outputs.set_haptic(false);
    outputs.set_indicator(false);
}


#[cfg(test)]
mod tests {
    use super::mock::{RecordingActuators, Step};
    use super::*;

    #[test]
    fn every_class_has_a_pattern() {
        for class in ServeClass::ALL {
            assert!(!pattern_for(class).is_empty());
        }
        assert!(pattern_for_label(Label::Unknown).is_none());
    }

    #[test]
    fn playback_follows_table_timing() {
        let mut out = RecordingActuators::default();
        play(&mut out, LACKS_PRONATION);
        let waits: Vec<u64> = out
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Wait(ms) => Some(*ms),
                _ => None,
            })
            .collect();
        assert_eq!(waits, vec![500, 150, 100, 100, 100, 100]);
        assert_eq!(out.haptic_pulses(), 3);
    }

    #[test]
    fn outputs_end_inactive() {
        for pattern in [STARTUP, GOOD_SERVE, JERKY_MOTION, LACKS_PRONATION, SHORT_SWING] {
            let mut out = RecordingActuators::default();
            play(&mut out, pattern);
            assert!(!out.haptic);
            assert!(!out.indicator);
        }
    }

    #[test]
    fn startup_has_no_trailing_rest() {
        let mut out = RecordingActuators::default();
        play(&mut out, STARTUP);
        assert_eq!(out.steps.iter().filter(|s| matches!(s, Step::Wait(_))).count(), 1);
    }
}
