// ServeSense - Control Loop
//
// One iteration: poll the capture input -> drain capture events -> sample the
// IMU while recording.  A stop with a non-empty session runs
// quantize -> infer -> decide -> feedback before the iteration returns.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::capture::{CaptureFlag, CaptureMachine, Transition};
use crate::config::{PipelineConfig, INPUT_TENSOR_LEN};
use crate::decision::{Classification, DecisionPolicy};
use crate::events::{CaptureEvent, SensorData};
use crate::feedback::{self, Actuators};
use crate::input::InputManager;
use crate::model::InferenceEngine;
use crate::quantize::{quantize_session, InputTensor};
use crate::telemetry::{ImuPacket, Telemetry, FLAG_CAPTURE, FLAG_MARKER};

/// Six-axis reading source.  An `Err` is a transient failure: the tick is
/// skipped.
pub trait SensorSource {
    fn read(&mut self) -> anyhow::Result<SensorData>;
}

pub struct Controller<S, E, A, T> {
    config: PipelineConfig,
    policy: DecisionPolicy,
    input: InputManager,
    event_tx: Sender<CaptureEvent>,
    event_rx: Receiver<CaptureEvent>,
    capture: CaptureMachine,
    sensor: S,
    engine: E,
    actuators: A,
    telemetry: T,
    tensor: InputTensor,
    boot: Instant,
    last_sample: Option<Instant>,
    sequence: u16,
}

impl<S, E, A, T> Controller<S, E, A, T>
where
    S: SensorSource,
    E: InferenceEngine,
    A: Actuators,
    T: Telemetry,
{
    pub fn new(
        config: PipelineConfig,
        sensor: S,
        engine: E,
        actuators: A,
        telemetry: T,
        initial_pin_high: bool,
        now: Instant,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let input = InputManager::new(&config, initial_pin_high, event_tx.clone());
        let capture = CaptureMachine::new(CaptureFlag::new(), config.stream_samples);
        Self {
            policy: DecisionPolicy::from_config(&config),
            config,
            input,
            event_tx,
            event_rx,
            capture,
            sensor,
            engine,
            actuators,
            telemetry,
            tensor: [0; INPUT_TENSOR_LEN],
            boot: now,
            last_sample: None,
            sequence: 0,
        }
    }

    /// Queue handle for other producers of capture events (command console).
    pub fn event_sender(&self) -> Sender<CaptureEvent> {
        self.event_tx.clone()
    }

    pub fn capture_flag(&self) -> CaptureFlag {
        self.capture.flag()
    }

    pub fn capture(&self) -> &CaptureMachine {
        &self.capture
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one loop iteration with the current capture-input pin level.
    pub fn step(&mut self, pin_high: bool, now: Instant) {
        self.input.update(pin_high, now);

        while let Ok(event) = self.event_rx.try_recv() {
            self.apply(event, now);
        }

        if self.capture.is_recording() {
            self.sample(now);
        }
    }

    fn apply(&mut self, event: CaptureEvent, now: Instant) {
        match self.capture.handle(event) {
            Transition::Started { session } => {
                log::info!("[RECORDING STARTED] session {}", session);
                self.last_sample = None;
                self.sequence = 0;
                self.actuators.set_indicator(true);
                self.telemetry.notify_state(true);
            }
            Transition::Stopped { session, samples } => {
                log::info!("[RECORDING STOPPED] session {}: {} samples collected", session, samples);
                self.actuators.set_indicator(false);
                self.telemetry.notify_state(false);
                if samples > 0 {
                    self.run_cycle(now);
                }
            }
            Transition::Marked => {
                log::info!("Boundary marker at {} ms", self.millis(now));
            }
            Transition::Ignored => {
                log::debug!("{:?} ignored in {:?}", event, self.capture.state());
            }
        }
    }

    fn sample(&mut self, now: Instant) {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.config.sample_period {
                return;
            }
        }
        // Post-fill readings are only worth taking for the raw stream.
        if self.capture.session().is_full() && !self.config.stream_samples {
            return;
        }
        self.last_sample = Some(now);

        let data = match self.sensor.read() {
            Ok(d) => d,
            Err(e) => {
                log::warn!("IMU read error: {}", e);
                return;
            }
        };

        if self.capture.record(&data) {
            let len = self.capture.session().len();
            if len % 20 == 0 {
                log::debug!("{} samples", len);
            }
        }

        if self.config.stream_samples {
            let mut flags = FLAG_CAPTURE;
            if self.capture.take_marker() {
                flags |= FLAG_MARKER;
            }
            let packet = ImuPacket {
                millis: self.millis(now) as u32,
                session: self.capture.session().id(),
                sequence: self.sequence,
                data,
                flags,
            };
            self.sequence = self.sequence.wrapping_add(1);
            self.telemetry.notify_sample(&packet);
        }
    }

    /// Quantize the frozen session, run the model and apply the decision
    /// policy.
    pub fn classify_session(&mut self, now: Instant) -> anyhow::Result<Classification> {
        let input_params = self.engine.input_params();
        quantize_session(self.capture.session(), input_params, &mut self.tensor);
        let output = self.engine.invoke(&self.tensor)?;
        Ok(self.policy.decide(&output, self.engine.output_params(), self.millis(now)))
    }

    fn run_cycle(&mut self, now: Instant) {
        let result = match self.classify_session(now) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Inference failed: {:#} - ready for next capture", e);
                return;
            }
        };

        if result.is_confident() {
            log::info!(
                "Prediction: {} ({:.1}%)",
                result.label.as_str(),
                result.confidence() * 100.0
            );
        } else {
            log::info!(
                "Prediction: UNKNOWN (max confidence: {:.1}%)",
                result.confidence() * 100.0
            );
        }

        match result.to_message() {
            Ok(msg) => self.telemetry.notify_result(&msg),
            Err(_) => log::warn!("Result does not fit the notification buffer: {:?}", result.scores),
        }

        match feedback::pattern_for_label(result.label) {
            Some(pattern) => feedback::play(&mut self.actuators, pattern),
            None => feedback::idle(&mut self.actuators),
        }
    }

    fn millis(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.boot).as_millis() as u64
    }
}
