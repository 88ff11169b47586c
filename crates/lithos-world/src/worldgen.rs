use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::error::WorldGenError;
use crate::landform::LandformVariant;
use crate::voxel::generation::DistortionBand;
use crate::voxel::CHUNK_SIZE;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub distortion: Distortion,
    #[serde(default)]
    pub upheaval: Upheaval,
    #[serde(default)]
    pub ocean: Ocean,
    #[serde(default)]
    pub taper: Taper,
    #[serde(default)]
    pub climate: Climate,
    #[serde(default)]
    pub blocks: Blocks,
    #[serde(default)]
    pub threads: Threads,
    #[serde(default = "default_blur_radius")]
    pub landform_blur_radius: usize,
    /// Empty means the built-in plains/hills pair sized to the octave count.
    #[serde(default)]
    pub landforms: Vec<LandformDef>,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            terrain: Terrain::default(),
            distortion: Distortion::default(),
            upheaval: Upheaval::default(),
            ocean: Ocean::default(),
            taper: Taper::default(),
            climate: Climate::default(),
            blocks: Blocks::default(),
            threads: Threads::default(),
            landform_blur_radius: default_blur_radius(),
            landforms: Vec::new(),
        }
    }
}

fn default_blur_radius() -> usize {
    2
}

#[derive(Clone, Debug, Deserialize)]
pub struct Terrain {
    #[serde(default = "default_terrain_freq")]
    pub frequency: f32,
    #[serde(default = "default_terrain_lacunarity")]
    pub lacunarity: f32,
    #[serde(default = "default_vertical_ratio")]
    pub vertical_ratio: f32,
    #[serde(default)]
    pub octaves: Option<usize>,
}
fn default_terrain_freq() -> f32 {
    0.0025
}
fn default_terrain_lacunarity() -> f32 {
    2.0
}
fn default_vertical_ratio() -> f32 {
    2.0
}
impl Default for Terrain {
    fn default() -> Self {
        Self {
            frequency: default_terrain_freq(),
            lacunarity: default_terrain_lacunarity(),
            vertical_ratio: default_vertical_ratio(),
            octaves: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Fractal {
    #[serde(default = "d_oct")]
    pub octaves: i32,
    #[serde(default = "d_pers")]
    pub persistence: f32,
    #[serde(default = "d_lac")]
    pub lacunarity: f32,
    #[serde(default = "d_scale")]
    pub scale: f32,
}
fn d_oct() -> i32 {
    3
}
fn d_pers() -> f32 {
    0.5
}
fn d_lac() -> f32 {
    2.0
}
fn d_scale() -> f32 {
    256.0
}
impl Default for Fractal {
    fn default() -> Self {
        Self {
            octaves: d_oct(),
            persistence: d_pers(),
            lacunarity: d_lac(),
            scale: d_scale(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Distortion {
    #[serde(default)]
    pub warp: Fractal,
    #[serde(default = "default_warp_strength")]
    pub strength: f32,
    #[serde(default = "default_terrain_threshold")]
    pub terrain_threshold: f32,
    #[serde(default = "default_terrain_max")]
    pub terrain_max: f32,
    #[serde(default = "default_geology_threshold")]
    pub geology_threshold: f32,
    #[serde(default = "default_geology_max")]
    pub geology_max: f32,
}
fn default_warp_strength() -> f32 {
    48.0
}
fn default_terrain_threshold() -> f32 {
    2.0
}
fn default_terrain_max() -> f32 {
    8.0
}
fn default_geology_threshold() -> f32 {
    6.0
}
fn default_geology_max() -> f32 {
    32.0
}
impl Default for Distortion {
    fn default() -> Self {
        Self {
            warp: Fractal::default(),
            strength: default_warp_strength(),
            terrain_threshold: default_terrain_threshold(),
            terrain_max: default_terrain_max(),
            geology_threshold: default_geology_threshold(),
            geology_max: default_geology_max(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Upheaval {
    #[serde(default = "default_upheaval_noise")]
    pub noise: Fractal,
    #[serde(default = "default_basin_depth")]
    pub basin_depth: f32,
    /// Tuned constants; kept as-is rather than re-derived.
    #[serde(default = "default_taper_start_fraction")]
    pub taper_start_fraction: f32,
    #[serde(default = "default_taper_divisor")]
    pub taper_divisor: f32,
}
fn default_upheaval_noise() -> Fractal {
    Fractal {
        octaves: 3,
        persistence: 0.55,
        lacunarity: 2.0,
        scale: 384.0,
    }
}
fn default_basin_depth() -> f32 {
    24.0
}
fn default_taper_start_fraction() -> f32 {
    0.4
}
fn default_taper_divisor() -> f32 {
    400.0
}
impl Default for Upheaval {
    fn default() -> Self {
        Self {
            noise: default_upheaval_noise(),
            basin_depth: default_basin_depth(),
            taper_start_fraction: default_taper_start_fraction(),
            taper_divisor: default_taper_divisor(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ocean {
    #[serde(default = "default_ocean_depth")]
    pub depth: f32,
    #[serde(default = "default_flatten_strength")]
    pub flatten_strength: f32,
    #[serde(default = "default_flatten_band")]
    pub flatten_band: f32,
    #[serde(default = "default_salt_threshold")]
    pub salt_threshold: f32,
}
fn default_ocean_depth() -> f32 {
    40.0
}
fn default_flatten_strength() -> f32 {
    0.6
}
fn default_flatten_band() -> f32 {
    6.0
}
fn default_salt_threshold() -> f32 {
    0.5
}
impl Default for Ocean {
    fn default() -> Self {
        Self {
            depth: default_ocean_depth(),
            flatten_strength: default_flatten_strength(),
            flatten_band: default_flatten_band(),
            salt_threshold: default_salt_threshold(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Taper {
    #[serde(default = "default_taper_width")]
    pub width: f32,
    #[serde(default = "default_vertical_falloff")]
    pub vertical_falloff: f32,
    /// Generated chunks whose heights are kept for tapering later neighbors.
    #[serde(default = "default_height_store_capacity")]
    pub height_store_capacity: usize,
}
fn default_taper_width() -> f32 {
    16.0
}
fn default_vertical_falloff() -> f32 {
    12.0
}
fn default_height_store_capacity() -> usize {
    4096
}
impl Default for Taper {
    fn default() -> Self {
        Self {
            width: default_taper_width(),
            vertical_falloff: default_vertical_falloff(),
            height_store_capacity: default_height_store_capacity(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Climate {
    #[serde(default = "default_freeze_temp")]
    pub freeze_temperature: f32,
    #[serde(default = "default_min_temp")]
    pub min_temperature: f32,
    #[serde(default = "default_max_temp")]
    pub max_temperature: f32,
}
fn default_freeze_temp() -> f32 {
    -5.0
}
fn default_min_temp() -> f32 {
    -20.0
}
fn default_max_temp() -> f32 {
    40.0
}
impl Default for Climate {
    fn default() -> Self {
        Self {
            freeze_temperature: default_freeze_temp(),
            min_temperature: default_min_temp(),
            max_temperature: default_max_temp(),
        }
    }
}

/// Block and fluid ids written by the materializer. Air is always 0.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Blocks {
    #[serde(default = "default_mantle")]
    pub mantle: u16,
    #[serde(default = "default_rock")]
    pub rock: u16,
    #[serde(default = "default_water")]
    pub water: u16,
    #[serde(default = "default_salt_water")]
    pub salt_water: u16,
    #[serde(default = "default_ice")]
    pub ice: u16,
}
fn default_mantle() -> u16 {
    1
}
fn default_rock() -> u16 {
    2
}
fn default_water() -> u16 {
    3
}
fn default_salt_water() -> u16 {
    4
}
fn default_ice() -> u16 {
    5
}
impl Default for Blocks {
    fn default() -> Self {
        Self {
            mantle: default_mantle(),
            rock: default_rock(),
            water: default_water(),
            salt_water: default_salt_water(),
            ice: default_ice(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Threads {
    #[serde(default = "default_headroom")]
    pub reserved_headroom: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub constrained: bool,
}
fn default_headroom() -> usize {
    1
}
fn default_max_workers() -> usize {
    8
}
impl Default for Threads {
    fn default() -> Self {
        Self {
            reserved_headroom: default_headroom(),
            max_workers: default_max_workers(),
            constrained: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LandformDef {
    pub name: String,
    pub amplitudes: Vec<f32>,
    pub thresholds: Vec<f32>,
    pub y_key_positions: Vec<f32>,
    pub y_key_thresholds: Vec<f32>,
}

/// Plains and hills, with geometric amplitude falloff over `octaves`.
pub fn builtin_landforms(octaves: usize) -> Vec<LandformDef> {
    let geometric = |start: f32, falloff: f32| -> Vec<f32> {
        (0..octaves).map(|i| start * falloff.powi(i as i32)).collect()
    };
    vec![
        LandformDef {
            name: "plains".into(),
            amplitudes: geometric(0.45, 0.5),
            thresholds: vec![0.0; octaves],
            y_key_positions: vec![0.0, 0.40, 0.45, 0.50, 1.0],
            y_key_thresholds: vec![0.0, 0.35, 0.5, 0.7, 1.0],
        },
        LandformDef {
            name: "hills".into(),
            amplitudes: geometric(0.9, 0.55),
            thresholds: (0..octaves).map(|i| if i == 0 { 0.05 } else { 0.0 }).collect(),
            y_key_positions: vec![0.0, 0.38, 0.50, 0.62, 1.0],
            y_key_thresholds: vec![0.0, 0.3, 0.5, 0.75, 1.0],
        },
    ]
}

/// World extents in blocks. `height` is the full column height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldDims {
    pub size_x: usize,
    pub height: usize,
    pub size_z: usize,
    pub sea_level: usize,
}

impl WorldDims {
    pub fn new(size_x: usize, height: usize, size_z: usize, sea_level: usize) -> Self {
        Self {
            size_x,
            height,
            size_z,
            sea_level,
        }
    }

    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.height < 2 * CHUNK_SIZE || self.height % CHUNK_SIZE != 0 {
            return Err(WorldGenError::InvalidWorldDims(format!(
                "height {} must be a multiple of {} and at least {}",
                self.height,
                CHUNK_SIZE,
                2 * CHUNK_SIZE
            )));
        }
        if self.height > usize::from(u16::MAX) {
            return Err(WorldGenError::InvalidWorldDims(format!(
                "height {} does not fit the u16 height maps",
                self.height
            )));
        }
        if self.sea_level < 1 || self.sea_level > self.height - 2 {
            return Err(WorldGenError::InvalidWorldDims(format!(
                "sea level {} outside [1, {}]",
                self.sea_level,
                self.height - 2
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn sub_chunks(&self) -> usize {
        self.height / CHUNK_SIZE
    }
}

/// 7 octaves at 64 blocks, one more per doubling, capped at 11.
pub fn terrain_octave_count(world_height: usize) -> usize {
    let log2 = (usize::BITS - 1 - world_height.max(1).leading_zeros()) as usize;
    (log2 + 1).clamp(7, 11)
}

#[derive(Clone, Copy, Debug)]
pub struct ThreadParams {
    pub reserved_headroom: usize,
    pub max_workers: usize,
    pub constrained: bool,
}

// Flattened params used in tight loops (snapshot of config)
#[derive(Clone, Debug)]
pub struct WorldGenParams {
    pub dims: WorldDims,
    pub octaves: usize,
    pub terrain_frequency: f32,
    pub terrain_lacunarity: f32,
    pub vertical_ratio: f32,
    pub warp: Fractal,
    pub warp_strength: f32,
    pub terrain_band: DistortionBand,
    pub geology_band: DistortionBand,
    pub upheaval_noise: Fractal,
    pub basin_depth: f32,
    pub upheaval_taper_start: f32,
    pub upheaval_taper_divisor: f32,
    pub ocean_depth: f32,
    pub ocean_flatten_strength: f32,
    pub ocean_flatten_band: f32,
    pub salt_threshold: f32,
    pub taper_width: f32,
    pub taper_vertical_falloff: f32,
    pub height_store_capacity: usize,
    pub freeze_temperature: f32,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub blocks: Blocks,
    pub threads: ThreadParams,
    pub landform_blur_radius: usize,
    pub landforms: Vec<LandformVariant>,
}

impl WorldGenParams {
    pub fn default_for(dims: WorldDims) -> Result<Self, WorldGenError> {
        Self::from_config(&WorldGenConfig::default(), dims)
    }

    pub fn from_config(cfg: &WorldGenConfig, dims: WorldDims) -> Result<Self, WorldGenError> {
        dims.validate()?;
        let octaves = cfg
            .terrain
            .octaves
            .unwrap_or_else(|| terrain_octave_count(dims.height));
        if octaves == 0 || octaves > 16 {
            return Err(WorldGenError::InvalidParameter {
                name: "terrain.octaves",
                reason: "must be between 1 and 16",
            });
        }
        positive("terrain.frequency", cfg.terrain.frequency)?;
        positive("terrain.lacunarity", cfg.terrain.lacunarity)?;
        positive("terrain.vertical_ratio", cfg.terrain.vertical_ratio)?;
        check_fractal("distortion.warp", &cfg.distortion.warp)?;
        check_fractal("upheaval.noise", &cfg.upheaval.noise)?;
        non_negative("distortion.strength", cfg.distortion.strength)?;
        let terrain_band = DistortionBand::new(
            "terrain",
            cfg.distortion.terrain_threshold,
            cfg.distortion.terrain_max,
        )?;
        let geology_band = DistortionBand::new(
            "geology",
            cfg.distortion.geology_threshold,
            cfg.distortion.geology_max,
        )?;
        non_negative("upheaval.basin_depth", cfg.upheaval.basin_depth)?;
        positive("upheaval.taper_divisor", cfg.upheaval.taper_divisor)?;
        if !(0.0..=1.0).contains(&cfg.upheaval.taper_start_fraction) {
            return Err(WorldGenError::InvalidParameter {
                name: "upheaval.taper_start_fraction",
                reason: "must lie in [0, 1]",
            });
        }
        non_negative("ocean.depth", cfg.ocean.depth)?;
        non_negative("ocean.flatten_strength", cfg.ocean.flatten_strength)?;
        positive("ocean.flatten_band", cfg.ocean.flatten_band)?;
        positive("taper.width", cfg.taper.width)?;
        positive("taper.vertical_falloff", cfg.taper.vertical_falloff)?;
        if cfg.taper.height_store_capacity == 0 {
            return Err(WorldGenError::InvalidParameter {
                name: "taper.height_store_capacity",
                reason: "must be at least 1",
            });
        }
        if !(cfg.climate.max_temperature > cfg.climate.min_temperature) {
            return Err(WorldGenError::InvalidParameter {
                name: "climate.max_temperature",
                reason: "must exceed climate.min_temperature",
            });
        }
        if cfg.threads.max_workers == 0 {
            return Err(WorldGenError::InvalidParameter {
                name: "threads.max_workers",
                reason: "must be at least 1",
            });
        }

        let defs = if cfg.landforms.is_empty() {
            builtin_landforms(octaves)
        } else {
            cfg.landforms.clone()
        };
        let landforms = defs
            .iter()
            .map(|def| {
                LandformVariant::new(
                    &def.name,
                    def.amplitudes.clone(),
                    def.thresholds.clone(),
                    &def.y_key_positions,
                    &def.y_key_thresholds,
                    octaves,
                    dims.height,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if cfg.landform_blur_radius == 0 {
            log::warn!("landform_blur_radius is 0; landform borders will be hard edges");
        }

        Ok(Self {
            dims,
            octaves,
            terrain_frequency: cfg.terrain.frequency,
            terrain_lacunarity: cfg.terrain.lacunarity,
            vertical_ratio: cfg.terrain.vertical_ratio,
            warp: cfg.distortion.warp.clone(),
            warp_strength: cfg.distortion.strength,
            terrain_band,
            geology_band,
            upheaval_noise: cfg.upheaval.noise.clone(),
            basin_depth: cfg.upheaval.basin_depth,
            upheaval_taper_start: cfg.upheaval.taper_start_fraction * dims.height as f32,
            upheaval_taper_divisor: cfg.upheaval.taper_divisor,
            ocean_depth: cfg.ocean.depth,
            ocean_flatten_strength: cfg.ocean.flatten_strength,
            ocean_flatten_band: cfg.ocean.flatten_band,
            salt_threshold: cfg.ocean.salt_threshold,
            taper_width: cfg.taper.width,
            taper_vertical_falloff: cfg.taper.vertical_falloff,
            height_store_capacity: cfg.taper.height_store_capacity,
            freeze_temperature: cfg.climate.freeze_temperature,
            min_temperature: cfg.climate.min_temperature,
            max_temperature: cfg.climate.max_temperature,
            blocks: cfg.blocks,
            threads: ThreadParams {
                reserved_headroom: cfg.threads.reserved_headroom,
                max_workers: cfg.threads.max_workers,
                constrained: cfg.threads.constrained,
            },
            landform_blur_radius: cfg.landform_blur_radius,
            landforms,
        })
    }
}

fn positive(name: &'static str, v: f32) -> Result<(), WorldGenError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(WorldGenError::InvalidParameter {
            name,
            reason: "must be finite and positive",
        })
    }
}

fn non_negative(name: &'static str, v: f32) -> Result<(), WorldGenError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(WorldGenError::InvalidParameter {
            name,
            reason: "must be finite and non-negative",
        })
    }
}

fn check_fractal(name: &'static str, fractal: &Fractal) -> Result<(), WorldGenError> {
    if fractal.octaves < 1 {
        return Err(WorldGenError::InvalidParameter {
            name,
            reason: "fractal needs at least one octave",
        });
    }
    positive(name, fractal.scale)?;
    positive(name, fractal.lacunarity)?;
    non_negative(name, fractal.persistence)
}

pub fn load_params_from_path(
    path: &Path,
    dims: WorldDims,
) -> Result<WorldGenParams, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    load_params_from_str(&s, dims)
}

pub fn load_params_from_str(s: &str, dims: WorldDims) -> Result<WorldGenParams, Box<dyn Error>> {
    let cfg: WorldGenConfig = toml::from_str(s)?;
    Ok(WorldGenParams::from_config(&cfg, dims)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> WorldDims {
        WorldDims::new(256, 256, 256, 110)
    }

    #[test]
    fn octave_count_tracks_height() {
        assert_eq!(terrain_octave_count(64), 7);
        assert_eq!(terrain_octave_count(256), 9);
        assert_eq!(terrain_octave_count(512), 10);
        assert_eq!(terrain_octave_count(1024), 11);
        assert_eq!(terrain_octave_count(4096), 11);
    }

    #[test]
    fn defaults_build() {
        let params = WorldGenParams::default_for(dims()).unwrap();
        assert_eq!(params.octaves, 9);
        assert_eq!(params.landforms.len(), 2);
        assert!(params.landforms.iter().all(|l| l.octave_count() == 9));
        assert_eq!(params.upheaval_taper_start, 0.4 * 256.0);
        assert_eq!(params.height_store_capacity, 4096);
    }

    #[test]
    fn height_store_capacity_from_toml() {
        let params = load_params_from_str("[taper]\nheight_store_capacity = 64\n", dims()).unwrap();
        assert_eq!(params.height_store_capacity, 64);
        let err = load_params_from_str("[taper]\nheight_store_capacity = 0\n", dims()).unwrap_err();
        let err = err.downcast::<WorldGenError>().unwrap();
        assert!(matches!(
            *err,
            WorldGenError::InvalidParameter { name: "taper.height_store_capacity", .. }
        ));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let params = load_params_from_str("", dims()).unwrap();
        assert_eq!(params.landforms[0].name, "plains");
    }

    #[test]
    fn toml_landforms_are_validated() {
        let src = r#"
            [terrain]
            octaves = 3

            [[landforms]]
            name = "mesa"
            amplitudes = [0.5, 0.25]
            thresholds = [0.0, 0.0, 0.0]
            y_key_positions = [0.0, 1.0]
            y_key_thresholds = [0.0, 1.0]
        "#;
        let err = load_params_from_str(src, dims()).unwrap_err();
        let err = err.downcast::<WorldGenError>().unwrap();
        assert!(matches!(*err, WorldGenError::OctaveLengthMismatch { expected: 3, .. }));
    }

    #[test]
    fn degenerate_distortion_band_rejected() {
        let mut cfg = WorldGenConfig::default();
        cfg.distortion.terrain_max = cfg.distortion.terrain_threshold;
        let err = WorldGenParams::from_config(&cfg, dims()).unwrap_err();
        assert!(matches!(err, WorldGenError::InvalidDistortionBand { band: "terrain", .. }));
    }

    #[test]
    fn bad_dims_rejected() {
        let err = WorldGenParams::default_for(WorldDims::new(64, 100, 64, 50)).unwrap_err();
        assert!(matches!(err, WorldGenError::InvalidWorldDims(_)));
        let err = WorldGenParams::default_for(WorldDims::new(64, 128, 64, 127)).unwrap_err();
        assert!(matches!(err, WorldGenError::InvalidWorldDims(_)));
    }
}
