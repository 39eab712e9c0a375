// ServeSense - Decision Policy
//
// Dequantizes the model output into independent per-class scores, picks the
// best class (first index wins ties) and accepts it only at or above the
// confidence threshold.

use core::fmt::Write;

use heapless::String;

use crate::config::{PipelineConfig, NUM_CLASSES, RESULT_MSG_CAPACITY};
use crate::events::{Label, ServeClass};
use crate::model::OutputTensor;
use crate::quantize::QuantParams;

/// Wire form of a result: `"<label>:<c0>,<c1>,...,<cK-1>"`.
pub type ResultMessage = String<RESULT_MSG_CAPACITY>;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Label,
    /// Index of the highest score, reported even when the label is unknown.
    pub best: usize,
    pub scores: [f32; NUM_CLASSES],
    /// Milliseconds since boot.
    pub timestamp_ms: u64,
}

impl Classification {
    pub fn is_confident(&self) -> bool {
        matches!(self.label, Label::Confident(_))
    }

    pub fn confidence(&self) -> f32 {
        self.scores[self.best]
    }

    /// Encode as percentages with one fractional digit, canonical class order.
    pub fn to_message(&self) -> Result<ResultMessage, core::fmt::Error> {
        let mut msg = ResultMessage::new();
        write!(msg, "{}:", self.label.as_str())?;
        for (i, score) in self.scores.iter().enumerate() {
            if i > 0 {
                msg.push(',').map_err(|_| core::fmt::Error)?;
            }
            write!(msg, "{:.1}", score * 100.0)?;
        }
        Ok(msg)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    pub threshold: f32,
    pub margin: Option<f32>,
}

impl DecisionPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold, margin: None }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            threshold: config.confidence_threshold,
            margin: config.margin,
        }
    }

    pub fn decide(
        &self,
        output: &OutputTensor,
        params: QuantParams,
        timestamp_ms: u64,
    ) -> Classification {
        let mut scores = [0.0f32; NUM_CLASSES];
        for (score, &q) in scores.iter_mut().zip(output.iter()) {
            *score = params.dequantize(q);
        }
        self.decide_scores(scores, timestamp_ms)
    }

    pub fn decide_scores(&self, scores: [f32; NUM_CLASSES], timestamp_ms: u64) -> Classification {
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best] {
                best = i;
            }
        }

        let mut confident = scores[best] >= self.threshold;
        if let (true, Some(margin)) = (confident, self.margin) {
            let runner_up = scores
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != best)
                .map(|(_, &s)| s)
                .fold(f32::NEG_INFINITY, f32::max);
            confident = scores[best] - runner_up >= margin;
        }

        let label = match ServeClass::from_index(best) {
            Some(class) if confident => Label::Confident(class),
            _ => Label::Unknown,
        };

        Classification {
            label,
            best,
            scores,
            timestamp_ms,
        }
    }
}
