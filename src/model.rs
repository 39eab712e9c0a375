// ServeSense - Inference Engine Interface
//
// This module provides a safe Rust API over the int8 serve classifier.
//
// Architecture:
//   1. STUB mode (default) - a deterministic heuristic engine so the rest of
//      the firmware can be developed and tested without the C++ TensorFlow
//      Lite Micro runtime compiled in.
//   2. FFI mode - enable the `tflite-micro` feature to link the real model via
//      the `serve_model_*` C shim built by build.rs.
//
// The control loop quantizes a capture into a 960-byte tensor (160 samples x
// 6 axes), calls `invoke`, and hands the 4 output bytes to the decision
// policy.

use crate::config::*;
use crate::quantize::{InputTensor, QuantParams};

/// Fixed-shape model output, one int8 per class.
pub type OutputTensor = [i8; NUM_CLASSES];

/// Tensor shape declared by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    pub sequence_length: usize,
    pub feature_count: usize,
    pub class_count: usize,
}

impl ModelShape {
    /// Shape this firmware was built for.
    pub const EXPECTED: ModelShape = ModelShape {
        sequence_length: SEQUENCE_LENGTH,
        feature_count: NUM_FEATURES,
        class_count: NUM_CLASSES,
    };
}

/// A deterministic pure function from a quantized input tensor to a quantized
/// output tensor.
pub trait InferenceEngine {
    fn shape(&self) -> ModelShape;
    fn input_params(&self) -> QuantParams;
    fn output_params(&self) -> QuantParams;
    fn invoke(&mut self, input: &InputTensor) -> anyhow::Result<OutputTensor>;
}

/// Startup check: the model must match the compiled-in tensor shape and carry
/// usable quantization parameters.
pub fn verify_engine<E: InferenceEngine + ?Sized>(engine: &E) -> anyhow::Result<()> {
    let shape = engine.shape();
    if shape != ModelShape::EXPECTED {
        anyhow::bail!(
            "model shape mismatch: expected {:?}, got {:?}",
            ModelShape::EXPECTED,
            shape
        );
    }
    for (name, params) in [("input", engine.input_params()), ("output", engine.output_params())] {
        if !(params.scale.is_finite() && params.scale > 0.0) {
            anyhow::bail!("{} scale must be positive, got {}", name, params.scale);
        }
    }
    log::info!(
        "Model ready - input ({}, {}), {} classes",
        shape.sequence_length,
        shape.feature_count,
        shape.class_count
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Stub back-end - development / testing without the C++ runtime
// ---------------------------------------------------------------------------

/// Scores a capture from the mean absolute gyro rate and the fraction of the
/// window that holds motion.  Lets the pipeline work end-to-end before the
/// real model is linked.
#[derive(Debug, Clone)]
pub struct StubEngine {
    input: QuantParams,
    output: QuantParams,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self {
            // ±2 g / ±250 °/s folded into one int8 range.
            input: QuantParams::new(2.0, 0),
            // Softmax-style output: [0, 1) in 1/256 steps.
            output: QuantParams::new(1.0 / 256.0, -128),
        }
    }
}

impl InferenceEngine for StubEngine {
    fn shape(&self) -> ModelShape {
        ModelShape::EXPECTED
    }

    fn input_params(&self) -> QuantParams {
        self.input
    }

    fn output_params(&self) -> QuantParams {
        self.output
    }

    fn invoke(&mut self, input: &InputTensor) -> anyhow::Result<OutputTensor> {
        let pad = self.input.quantize(0.0);
        let mut gyro_sum = 0.0f32;
        let mut active_rows = 0usize;

        for row in input.chunks_exact(NUM_FEATURES) {
            if row.iter().any(|&q| q != pad) {
                active_rows += 1;
            }
            gyro_sum += row[3..]
                .iter()
                .map(|&q| self.input.dequantize(q).abs())
                .sum::<f32>();
        }

        let mean_gyro = gyro_sum / (SEQUENCE_LENGTH * 3) as f32;
        let coverage = active_rows as f32 / SEQUENCE_LENGTH as f32;

        let scores = if coverage < 0.5 {
            [0.10, 0.10, 0.10, 0.70] // short-swing
        } else if mean_gyro < 20.0 {
            [0.20, 0.15, 0.60, 0.05] // lacks-pronation
        } else if mean_gyro > 120.0 {
            [0.10, 0.75, 0.10, 0.05] // jerky-motion
        } else {
            [0.85, 0.05, 0.05, 0.05] // good-serve
        };

        log::debug!(
            "STUB inference - mean |g| = {:.1}, coverage = {:.2}, scores = {:?}",
            mean_gyro,
            coverage,
            scores
        );

        let mut out = [0i8; NUM_CLASSES];
        for (q, s) in out.iter_mut().zip(scores) {
            *q = self.output.quantize(s);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Real FFI back-end - calls the C++ TensorFlow Lite Micro shim
// ---------------------------------------------------------------------------
#[cfg(feature = "tflite-micro")]
mod ffi {
    #[repr(C)]
    #[derive(Default)]
    pub struct ServeModelInfo {
        pub input_scale: f32,
        pub input_zero_point: i32,
        pub output_scale: f32,
        pub output_zero_point: i32,
        pub sequence_length: i32,
        pub feature_count: i32,
        pub class_count: i32,
    }

    extern "C" {
        /// Loads the model, checks the schema version and allocates tensors
        /// in the static arena.  0 on success.
        pub fn serve_model_init(info: *mut ServeModelInfo) -> i32;

        /// Copies `input_len` bytes into the input tensor, invokes the
        /// interpreter and copies `output_len` bytes out.  0 on success.
        pub fn serve_model_invoke(
            input: *const i8,
            input_len: usize,
            output: *mut i8,
            output_len: usize,
        ) -> i32;
    }
}

/// TensorFlow Lite Micro interpreter linked from `serve-model/`.
#[cfg(feature = "tflite-micro")]
pub struct TfliteEngine {
    shape: ModelShape,
    input: QuantParams,
    output: QuantParams,
}

#[cfg(feature = "tflite-micro")]
impl TfliteEngine {
    /// Fails on schema mismatch or arena allocation failure.
    pub fn new() -> anyhow::Result<Self> {
        let mut info = ffi::ServeModelInfo::default();
        // SAFETY: `info` outlives the call; the shim only writes through it.
        let err = unsafe { ffi::serve_model_init(&mut info) };
        if err != 0 {
            anyhow::bail!("TFLite Micro init failed ({})", err);
        }

        Ok(Self {
            shape: ModelShape {
                sequence_length: usize::try_from(info.sequence_length)?,
                feature_count: usize::try_from(info.feature_count)?,
                class_count: usize::try_from(info.class_count)?,
            },
            input: QuantParams::new(info.input_scale, info.input_zero_point),
            output: QuantParams::new(info.output_scale, info.output_zero_point),
        })
    }
}

#[cfg(feature = "tflite-micro")]
impl InferenceEngine for TfliteEngine {
    fn shape(&self) -> ModelShape {
        self.shape
    }

    fn input_params(&self) -> QuantParams {
        self.input
    }

    fn output_params(&self) -> QuantParams {
        self.output
    }

    fn invoke(&mut self, input: &InputTensor) -> anyhow::Result<OutputTensor> {
        let mut out = [0i8; NUM_CLASSES];
        // SAFETY: both buffers are valid for the lengths passed; single caller
        // (the control loop) so the interpreter is never re-entered.
        let err = unsafe {
            ffi::serve_model_invoke(input.as_ptr(), input.len(), out.as_mut_ptr(), out.len())
        };
        if err != 0 {
            anyhow::bail!("TFLite Micro invoke failed ({})", err);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BadShape;

    impl InferenceEngine for BadShape {
        fn shape(&self) -> ModelShape {
            ModelShape { class_count: 9, ..ModelShape::EXPECTED }
        }
        fn input_params(&self) -> QuantParams {
            QuantParams::new(1.0, 0)
        }
        fn output_params(&self) -> QuantParams {
            QuantParams::new(1.0, 0)
        }
        fn invoke(&mut self, _input: &InputTensor) -> anyhow::Result<OutputTensor> {
            Ok([0; NUM_CLASSES])
        }
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        assert!(verify_engine(&BadShape).is_err());
        assert!(verify_engine(&StubEngine::default()).is_ok());
    }

    #[test]
    fn stub_is_deterministic() {
        let mut engine = StubEngine::default();
        let input = [3i8; INPUT_TENSOR_LEN];
        let a = engine.invoke(&input).unwrap();
        let b = engine.invoke(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn stub_flags_short_captures() {
        let mut engine = StubEngine::default();
        let mut input = [0i8; INPUT_TENSOR_LEN];
        input[..10 * NUM_FEATURES].fill(20);
        let out = engine.invoke(&input).unwrap();
        let params = engine.output_params();
        let best = (0..NUM_CLASSES)
            .max_by(|&a, &b| params.dequantize(out[a]).total_cmp(&params.dequantize(out[b])))
            .unwrap();
        assert_eq!(best, 3);
    }
}
