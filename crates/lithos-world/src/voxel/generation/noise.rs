use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::worldgen::{Fractal, WorldGenParams};

/// Forward threshold curve: maps the real line onto (0, 1).
#[inline]
pub fn threshold_curve(v: f32) -> f32 {
    0.5 + 0.5 * v / (1.0 + v * v).sqrt()
}

/// Inverse of [`threshold_curve`]; saturates to ±infinity outside (0, 1).
#[inline]
pub fn threshold_curve_inverse(t: f32) -> f32 {
    if t <= 0.0 {
        return f32::NEG_INFINITY;
    }
    if t >= 1.0 {
        return f32::INFINITY;
    }
    let v = 2.0 * t - 1.0;
    v / (1.0 - v * v).sqrt()
}

/// `sign(x) * max(0, |x| - threshold)`
#[inline]
pub fn soft_threshold(x: f32, threshold: f32) -> f32 {
    let m = x.abs() - threshold;
    if m <= 0.0 { 0.0 } else { m.copysign(x) }
}

/// Normalised fBm over a 2D field, in [-1, 1].
pub fn fractal2(noise: &FastNoiseLite, x: f32, z: f32, fractal: &Fractal) -> f32 {
    let mut amp = 1.0_f32;
    let mut freq = 1.0_f32 / fractal.scale.max(0.0001);
    let mut sum = 0.0_f32;
    let mut max_amp = 0.0_f32;
    for _ in 0..fractal.octaves.max(1) {
        sum += noise.get_noise_2d(x * freq, z * freq) * amp;
        max_amp += amp;
        amp *= fractal.persistence;
        freq *= fractal.lacunarity;
    }
    if max_amp > 0.0 { sum / max_amp } else { sum }
}

pub(crate) fn simplex(seed: i32, frequency: f32) -> FastNoiseLite {
    let mut n = FastNoiseLite::with_seed(seed);
    n.set_noise_type(Some(NoiseType::OpenSimplex2));
    n.set_frequency(Some(frequency));
    n
}

/// One independently seeded 3D simplex field per octave.
pub struct TerrainNoise {
    octaves: Vec<FastNoiseLite>,
    vertical_ratio: f32,
}

impl TerrainNoise {
    pub fn new(seed: i32, params: &WorldGenParams) -> Self {
        let mut freq = params.terrain_frequency;
        let mut octaves = Vec::with_capacity(params.octaves);
        for i in 0..params.octaves {
            let octave_seed = seed.wrapping_add((i as i32).wrapping_mul(7_919));
            octaves.push(simplex(octave_seed, freq));
            freq *= params.terrain_lacunarity;
        }
        Self {
            octaves,
            vertical_ratio: params.vertical_ratio,
        }
    }

    #[inline]
    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }

    /// Raw octave sample clamped to [-1, 1]; Y is stretched by the vertical ratio.
    #[inline]
    pub fn sample_octave(&self, octave: usize, x: f32, y: f32, z: f32) -> f32 {
        self.octaves[octave]
            .get_noise_3d(x, y * self.vertical_ratio, z)
            .clamp(-1.0, 1.0)
    }
}

/// Soft-thresholded octave sum for one column, with its analytic bound.
pub struct ColumnNoise<'a> {
    noise: &'a TerrainNoise,
    amps: &'a [f32],
    thrs: &'a [f32],
    x: f32,
    z: f32,
    bound: f32,
}

impl<'a> ColumnNoise<'a> {
    pub fn new(noise: &'a TerrainNoise, amps: &'a [f32], thrs: &'a [f32], x: f32, z: f32) -> Self {
        let bound = amps
            .iter()
            .zip(thrs)
            .map(|(a, t)| (a.abs() - t).max(0.0))
            .sum();
        Self {
            noise,
            amps,
            thrs,
            x,
            z,
            bound,
        }
    }

    /// `sample(y)` always lies in `[-bound, bound]`.
    #[inline]
    pub fn bound(&self) -> f32 {
        self.bound
    }

    pub fn sample(&self, y: f32) -> f32 {
        let mut sum = 0.0_f32;
        for (i, (&amp, &thr)) in self.amps.iter().zip(self.thrs).enumerate() {
            // Octaves that can never clear their threshold contribute nothing.
            if amp.abs() <= thr {
                continue;
            }
            let n = self.noise.sample_octave(i, self.x, y, self.z);
            sum += soft_threshold(amp * n, thr);
        }
        sum
    }
}
