// ServeSense - Capture State Machine & Sample Buffer
//
// Idle <-> Recording.  The machine owns the current session buffer and the
// capture-active flag; it is driven only by the control loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{NUM_FEATURES, SEQUENCE_LENGTH};
use crate::events::{CaptureEvent, SensorData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Capture-active flag shared with other threads. Written only by the control
/// loop; other contexts may read it at any time.
#[derive(Debug, Clone, Default)]
pub struct CaptureFlag(Arc<AtomicBool>);

impl CaptureFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

/// One bounded capture, stored in a fixed arena indexed by `len`.
#[derive(Debug)]
pub struct CaptureSession {
    id: u16,
    len: usize,
    samples: [[f32; NUM_FEATURES]; SEQUENCE_LENGTH],
}

impl CaptureSession {
    fn empty() -> Self {
        Self {
            id: 0,
            len: 0,
            samples: [[0.0; NUM_FEATURES]; SEQUENCE_LENGTH],
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= SEQUENCE_LENGTH
    }

    /// Captured samples in order.
    pub fn samples(&self) -> &[[f32; NUM_FEATURES]] {
        &self.samples[..self.len]
    }

    /// Append one reading.  Returns `false` once the buffer is full; the
    /// reading is dropped.
    pub fn push(&mut self, data: &SensorData) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples[self.len] = data.features();
        self.len += 1;
        true
    }

    fn restart(&mut self, id: u16) {
        self.id = id;
        self.len = 0;
    }
}

/// Result of feeding one event into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started { session: u16 },
    /// Recording ended; `samples` is the frozen session length.
    Stopped { session: u16, samples: usize },
    Marked,
    Ignored,
}

#[derive(Debug)]
pub struct CaptureMachine {
    state: CaptureState,
    next_id: u16,
    session: CaptureSession,
    flag: CaptureFlag,
    /// Boundary markers only matter to the sample stream.
    track_markers: bool,
    marker_pending: bool,
}

impl CaptureMachine {
    pub fn new(flag: CaptureFlag, track_markers: bool) -> Self {
        flag.set(false);
        Self {
            state: CaptureState::Idle,
            next_id: 0,
            session: CaptureSession::empty(),
            flag,
            track_markers,
            marker_pending: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn flag(&self) -> CaptureFlag {
        self.flag.clone()
    }

    pub fn handle(&mut self, event: CaptureEvent) -> Transition {
        match (event, self.state) {
            (CaptureEvent::Start, CaptureState::Idle)
            | (CaptureEvent::Toggle, CaptureState::Idle) => {
                // u16 to match the packet field. Wraps after 65535 sessions
                // and skips 0, which is the never-recorded session.
                self.next_id = self.next_id.wrapping_add(1).max(1);
                self.session.restart(self.next_id);
                self.state = CaptureState::Recording;
                self.marker_pending = self.track_markers;
                self.flag.set(true);
                Transition::Started { session: self.next_id }
            }
            (CaptureEvent::Stop, CaptureState::Recording)
            | (CaptureEvent::Toggle, CaptureState::Recording) => {
                self.state = CaptureState::Idle;
                self.flag.set(false);
                Transition::Stopped {
                    session: self.session.id,
                    samples: self.session.len,
                }
            }
            (CaptureEvent::Mark, _) => {
                self.marker_pending = self.track_markers;
                Transition::Marked
            }
            _ => Transition::Ignored,
        }
    }

    /// Store a sensor reading for the active session.  No-op while idle.
    pub fn record(&mut self, data: &SensorData) -> bool {
        self.is_recording() && self.session.push(data)
    }

    /// Returns and clears the boundary marker.
    pub fn take_marker(&mut self) -> bool {
        std::mem::take(&mut self.marker_pending)
    }
}
