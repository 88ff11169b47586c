use fastnoise_lite::FastNoiseLite;

use crate::error::WorldGenError;
use crate::worldgen::{Fractal, WorldGenParams};

use super::noise::{fractal2, simplex};

/// Horizontal displacement in blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WarpVector {
    pub x: f32,
    pub z: f32,
}

impl WarpVector {
    #[inline]
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        f64::from(self.x).hypot(f64::from(self.z)) as f32
    }
}

/// Dead zone and cap applied to a raw warp vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistortionBand {
    pub threshold: f32,
    pub maximum: f32,
}

impl DistortionBand {
    pub fn new(band: &'static str, threshold: f32, maximum: f32) -> Result<Self, WorldGenError> {
        if !(threshold.is_finite() && maximum.is_finite() && threshold >= 0.0 && maximum > threshold)
        {
            return Err(WorldGenError::InvalidDistortionBand {
                band,
                threshold,
                maximum,
            });
        }
        Ok(Self { threshold, maximum })
    }

    #[inline]
    pub fn apply(&self, v: WarpVector) -> WarpVector {
        apply_isotropic_threshold(v, self.threshold, self.maximum)
    }
}

/// Zero inside `threshold`; beyond it the direction is kept and the length
/// eases towards `maximum` with a cubic falloff, never exceeding it.
///
/// Panics when `maximum > threshold >= 0` does not hold; such bands are
/// rejected at config load, so reaching the assert is a programming error.
pub fn apply_isotropic_threshold(v: WarpVector, threshold: f32, maximum: f32) -> WarpVector {
    assert!(
        threshold.is_finite() && maximum.is_finite() && threshold >= 0.0 && maximum > threshold,
        "degenerate distortion band: threshold {threshold}, maximum {maximum}"
    );
    let x = f64::from(v.x);
    let z = f64::from(v.z);
    // Normalise first so huge components cannot overflow the length.
    let scale = x.abs().max(z.abs());
    if !(scale > 0.0) {
        return WarpVector::default();
    }
    let (nx, nz) = if scale.is_infinite() {
        let axis = |c: f64| if c.is_infinite() { c.signum() } else { 0.0 };
        (axis(x), axis(z))
    } else {
        (x / scale, z / scale)
    };
    let unit_len = nx.hypot(nz);
    let len = scale * unit_len;
    let threshold = f64::from(threshold);
    if len <= threshold {
        return WarpVector::default();
    }
    let s = 1.0 - threshold / len;
    let falloff = 1.0 - s;
    let magnitude = f64::from(maximum) * (1.0 - falloff * falloff * falloff);
    WarpVector {
        x: (nx / unit_len * magnitude) as f32,
        z: (nz / unit_len * magnitude) as f32,
    }
}

/// Low-frequency horizontal warp shared by every per-column lookup.
pub struct DomainWarp {
    x_noise: FastNoiseLite,
    z_noise: FastNoiseLite,
    upheaval_noise: FastNoiseLite,
    warp: Fractal,
    upheaval: Fractal,
    strength: f32,
    terrain: DistortionBand,
    geology: DistortionBand,
    basin_depth: f32,
    ocean_depth: f32,
}

impl DomainWarp {
    pub fn new(seed: i32, params: &WorldGenParams) -> Self {
        Self {
            x_noise: simplex(seed ^ 0x5EED_0A11, 1.0),
            z_noise: simplex(seed ^ 0x0B1D_C0DE, 1.0),
            upheaval_noise: simplex(seed ^ 0x7A11_0F5E, 1.0),
            warp: params.warp.clone(),
            upheaval: params.upheaval_noise.clone(),
            strength: params.warp_strength,
            terrain: params.terrain_band,
            geology: params.geology_band,
            basin_depth: params.basin_depth,
            ocean_depth: params.ocean_depth,
        }
    }

    pub fn warp(&self, x: f32, z: f32) -> WarpVector {
        if self.strength == 0.0 {
            return WarpVector::default();
        }
        WarpVector {
            x: fractal2(&self.x_noise, x, z, &self.warp) * self.strength,
            z: fractal2(&self.z_noise, x, z, &self.warp) * self.strength,
        }
    }

    /// Small displacement used to shift the threshold curves vertically.
    #[inline]
    pub fn terrain_band(&self, v: WarpVector) -> WarpVector {
        self.terrain.apply(v)
    }

    /// Large displacement used to move the upheaval field horizontally.
    #[inline]
    pub fn geology_band(&self, v: WarpVector) -> WarpVector {
        self.geology.apply(v)
    }

    /// Non-negative downward shift of the terrain in blocks: basins carved by
    /// the upheaval field plus the ocean floor drop.
    pub fn ocean_and_upheaval_offset(
        &self,
        upheaval_strength: f32,
        oceanicity: f32,
        x: f32,
        z: f32,
        geo: WarpVector,
    ) -> f32 {
        let n = fractal2(&self.upheaval_noise, x + geo.x, z + geo.z, &self.upheaval);
        let n01 = (n * 0.5 + 0.5).clamp(0.0, 1.0);
        let basin = -(0.5 - n01).min(0.0) * 2.0;
        basin * upheaval_strength * self.basin_depth + oceanicity * self.ocean_depth
    }
}
