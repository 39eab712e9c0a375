// ServeSense - Affine Quantization
//
// q = round(x / scale) + zero_point, saturated to int8
// x = (q - zero_point) * scale

use crate::capture::CaptureSession;
use crate::config::{INPUT_TENSOR_LEN, NUM_FEATURES, SEQUENCE_LENGTH};

/// Fixed-shape model input: SEQUENCE_LENGTH x NUM_FEATURES, row-major.
pub type InputTensor = [i8; INPUT_TENSOR_LEN];

/// Per-tensor quantization parameters declared by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    pub fn quantize(&self, value: f32) -> i8 {
        // f32 -> i32 casts saturate and map NaN to 0.
        let q = ((value / self.scale).round() as i32).saturating_add(self.zero_point);
        q.clamp(i8::MIN as i32, i8::MAX as i32) as i8
    }

    pub fn dequantize(&self, q: i8) -> f32 {
        (q as i32 - self.zero_point) as f32 * self.scale
    }
}

/// Fill `out` from the frozen session.  Timesteps past the captured length
/// hold a physical 0.0, so their quantized value is the zero point.
pub fn quantize_session(session: &CaptureSession, params: QuantParams, out: &mut InputTensor) {
    quantize_samples(session.samples(), params, out)
}

pub fn quantize_samples(
    samples: &[[f32; NUM_FEATURES]],
    params: QuantParams,
    out: &mut InputTensor,
) {
    let used = samples.len().min(SEQUENCE_LENGTH);
    if samples.len() > SEQUENCE_LENGTH {
        log::warn!(
            "Truncating {} samples to {}",
            samples.len(),
            SEQUENCE_LENGTH
        );
    }

    let pad = params.quantize(0.0);
    for (i, row) in out.chunks_exact_mut(NUM_FEATURES).enumerate() {
        if i < used {
            for (slot, &raw) in row.iter_mut().zip(samples[i].iter()) {
                *slot = params.quantize(raw);
            }
        } else {
            row.fill(pad);
        }
    }

    log::debug!(
        "Quantized {} samples (scale {:.6}, zero_point {})",
        used,
        params.scale,
        params.zero_point
    );
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_quantized_value_in_int8_range(
            value in -1.0e6f32..1.0e6,
            scale in 1.0e-4f32..10.0,
            zp in -300i32..300,
        ) {
            let q = QuantParams::new(scale, zp).quantize(value) as i32;
            prop_assert!((-128..=127).contains(&q));
        }

        #[test]
        fn prop_padding_is_quantized_zero(
            len in 1usize..=SEQUENCE_LENGTH,
            scale in 1.0e-3f32..1.0,
            zp in -128i32..=127,
        ) {
            let p = QuantParams::new(scale, zp);
            let samples = vec![[0.7f32; NUM_FEATURES]; len];
            let mut out = [0i8; INPUT_TENSOR_LEN];
            quantize_samples(&samples, p, &mut out);
            let pad = zp.clamp(-128, 127) as i8;
            prop_assert!(out[len * NUM_FEATURES..].iter().all(|&q| q == pad));
        }

        #[test]
        fn prop_dequantize_within_one_step(
            value in -4.0f32..4.0,
            scale in 0.04f32..0.5,
            zp in -20i32..20,
        ) {
            let p = QuantParams::new(scale, zp);
            let q = p.quantize(value);
            // Skip saturated values; the range test covers them.
            prop_assume!(q > i8::MIN && q < i8::MAX);
            let back = p.dequantize(q);
            prop_assert!((back - value).abs() <= scale);
        }
    }
}
