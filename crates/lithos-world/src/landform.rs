//! Landform archetypes: per-octave noise shaping plus a per-height threshold curve.

use crate::error::WorldGenError;

/// One entry of a column's landform superposition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedIndex {
    pub index: usize,
    pub weight: f32,
}

/// Immutable after world-gen init and shared by every worker.
#[derive(Clone, Debug)]
pub struct LandformVariant {
    pub name: String,
    pub amplitudes: Vec<f32>,
    pub thresholds: Vec<f32>,
    y_curve: Vec<f32>,
}

impl LandformVariant {
    pub fn new(
        name: &str,
        amplitudes: Vec<f32>,
        thresholds: Vec<f32>,
        y_key_positions: &[f32],
        y_key_thresholds: &[f32],
        octaves: usize,
        world_height: usize,
    ) -> Result<Self, WorldGenError> {
        if amplitudes.len() != octaves || thresholds.len() != octaves {
            return Err(WorldGenError::OctaveLengthMismatch {
                landform: name.to_string(),
                expected: octaves,
                amplitudes: amplitudes.len(),
                thresholds: thresholds.len(),
            });
        }
        if amplitudes.iter().any(|a| !a.is_finite()) {
            return Err(WorldGenError::InvalidParameter {
                name: "landforms.amplitudes",
                reason: "amplitudes must be finite",
            });
        }
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(WorldGenError::InvalidParameter {
                name: "landforms.thresholds",
                reason: "octave thresholds must be finite and non-negative",
            });
        }
        let y_curve = build_y_curve(name, y_key_positions, y_key_thresholds, world_height)?;
        Ok(Self {
            name: name.to_string(),
            amplitudes,
            thresholds,
            y_curve,
        })
    }

    #[inline]
    pub fn octave_count(&self) -> usize {
        self.amplitudes.len()
    }

    #[inline]
    pub fn y_curve(&self) -> &[f32] {
        &self.y_curve
    }

    /// Linearly interpolated curve value; `y` is clamped to the table.
    #[inline]
    pub fn threshold_at(&self, y: f32) -> f32 {
        let last = self.y_curve.len() - 1;
        let y = y.max(0.0).min(last as f32);
        let base = y as usize;
        let next = (base + 1).min(last);
        let t = y - base as f32;
        let a = self.y_curve[base];
        a + (self.y_curve[next] - a) * t
    }
}

fn build_y_curve(
    landform: &str,
    positions: &[f32],
    thresholds: &[f32],
    world_height: usize,
) -> Result<Vec<f32>, WorldGenError> {
    if positions.len() != thresholds.len() {
        return Err(WorldGenError::YKeyLengthMismatch {
            landform: landform.to_string(),
            positions: positions.len(),
            thresholds: thresholds.len(),
        });
    }
    let invalid = |reason| WorldGenError::InvalidYKeys {
        landform: landform.to_string(),
        reason,
    };
    if positions.is_empty() {
        return Err(invalid("at least one key is required"));
    }
    if positions
        .iter()
        .chain(thresholds)
        .any(|v| !v.is_finite() || !(0.0..=1.0).contains(v))
    {
        return Err(invalid("keys must lie in [0, 1]"));
    }
    if positions.windows(2).any(|w| w[1] < w[0]) {
        return Err(invalid("positions must be ascending"));
    }
    // Column early exit assumes thresholds never fall with height.
    if thresholds.windows(2).any(|w| w[1] < w[0]) {
        return Err(invalid("thresholds must not decrease with height"));
    }

    let height_f = world_height as f32;
    let last = positions.len() - 1;
    let mut curve = Vec::with_capacity(world_height);
    let mut seg = 0usize;
    for y in 0..world_height {
        let rel = y as f32 / height_f;
        let value = if rel <= positions[0] {
            thresholds[0]
        } else if rel >= positions[last] {
            thresholds[last]
        } else {
            while seg + 1 < last && positions[seg + 1] <= rel {
                seg += 1;
            }
            let (p0, p1) = (positions[seg], positions[seg + 1]);
            let span = p1 - p0;
            if span <= f32::EPSILON {
                thresholds[seg + 1]
            } else {
                let t = (rel - p0) / span;
                thresholds[seg] + (thresholds[seg + 1] - thresholds[seg]) * t
            }
        };
        curve.push(value);
    }
    Ok(curve)
}

/// Sum of `weight * variant.threshold_at(y)` over the non-zero weights.
pub fn blended_threshold(variants: &[LandformVariant], weights: &[f32], y: f32) -> f32 {
    let mut sum = 0.0_f32;
    for (variant, &w) in variants.iter().zip(weights) {
        if w > 0.0 {
            sum += w * variant.threshold_at(y);
        }
    }
    sum
}

/// `out[i] = Σ weight * variant.<table>[i]` for amplitudes and thresholds.
pub fn blend_octaves(
    variants: &[LandformVariant],
    weights: &[f32],
    amps_out: &mut [f32],
    thrs_out: &mut [f32],
) {
    amps_out.fill(0.0);
    thrs_out.fill(0.0);
    for (variant, &w) in variants.iter().zip(weights) {
        if w <= 0.0 {
            continue;
        }
        for (out, a) in amps_out.iter_mut().zip(&variant.amplitudes) {
            *out += w * a;
        }
        for (out, t) in thrs_out.iter_mut().zip(&variant.thresholds) {
            *out += w * t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, positions: &[f32], thresholds: &[f32]) -> LandformVariant {
        LandformVariant::new(
            name,
            vec![0.5, 0.25, 0.125],
            vec![0.0; 3],
            positions,
            thresholds,
            3,
            256,
        )
        .unwrap()
    }

    #[test]
    fn curve_interpolates_key_points() {
        let v = variant("ramp", &[0.0, 1.0], &[0.0, 1.0]);
        assert_eq!(v.y_curve().len(), 256);
        assert!((v.threshold_at(128.0) - 0.5).abs() < 1e-6);
        assert!((v.threshold_at(64.5) - 64.5 / 256.0).abs() < 1e-5);
    }

    #[test]
    fn curve_lookup_clamps() {
        let v = variant("ramp", &[0.0, 1.0], &[0.0, 1.0]);
        assert_eq!(v.threshold_at(-40.0), v.y_curve()[0]);
        assert_eq!(v.threshold_at(10_000.0), v.y_curve()[255]);
    }

    #[test]
    fn octave_length_mismatch_is_fatal() {
        let err = LandformVariant::new(
            "broken",
            vec![0.5, 0.25],
            vec![0.0; 3],
            &[0.0, 1.0],
            &[0.0, 1.0],
            3,
            128,
        )
        .unwrap_err();
        assert!(matches!(err, WorldGenError::OctaveLengthMismatch { amplitudes: 2, .. }));
    }

    #[test]
    fn y_key_mismatch_is_fatal() {
        let err = LandformVariant::new(
            "broken",
            vec![0.5; 3],
            vec![0.0; 3],
            &[0.0, 0.5, 1.0],
            &[0.0, 1.0],
            3,
            128,
        )
        .unwrap_err();
        assert!(matches!(err, WorldGenError::YKeyLengthMismatch { .. }));
    }

    #[test]
    fn descending_positions_rejected() {
        let err = LandformVariant::new(
            "broken",
            vec![0.5; 3],
            vec![0.0; 3],
            &[0.6, 0.2],
            &[0.0, 1.0],
            3,
            128,
        )
        .unwrap_err();
        assert!(matches!(err, WorldGenError::InvalidYKeys { .. }));
    }

    #[test]
    fn falling_thresholds_rejected() {
        let err = LandformVariant::new(
            "broken",
            vec![0.5; 3],
            vec![0.0; 3],
            &[0.0, 0.5, 1.0],
            &[0.0, 0.8, 0.4],
            3,
            128,
        )
        .unwrap_err();
        assert!(matches!(err, WorldGenError::InvalidYKeys { .. }));
    }

    #[test]
    fn even_blend_is_arithmetic_mean() {
        let low = variant("low", &[0.0, 0.3, 1.0], &[0.0, 0.5, 1.0]);
        let high = variant("high", &[0.0, 0.7, 1.0], &[0.0, 0.5, 1.0]);
        let variants = vec![low, high];
        for y in [10.0, 80.0, 128.0, 170.0, 250.0] {
            let mean = 0.5 * (variants[0].threshold_at(y) + variants[1].threshold_at(y));
            let blended = blended_threshold(&variants, &[0.5, 0.5], y);
            assert!((blended - mean).abs() < 1e-6, "y={y}: {blended} vs {mean}");
        }
    }

    #[test]
    fn octave_blend_weights_each_table() {
        let a = variant("a", &[0.0, 1.0], &[0.0, 1.0]);
        let mut b = variant("b", &[0.0, 1.0], &[0.0, 1.0]);
        b.amplitudes = vec![1.0, 1.0, 1.0];
        b.thresholds = vec![0.2, 0.2, 0.2];
        let mut amps = vec![9.0; 3];
        let mut thrs = vec![9.0; 3];
        blend_octaves(&[a, b], &[0.25, 0.75], &mut amps, &mut thrs);
        assert!((amps[0] - (0.25 * 0.5 + 0.75)).abs() < 1e-6);
        assert!((thrs[2] - 0.15).abs() < 1e-6);
    }
}
