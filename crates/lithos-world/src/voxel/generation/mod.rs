mod column;
mod column_plan;
mod distortion;
mod landform_map;
pub mod noise;
mod synthesizer;
mod taper;

pub use self::column::{ColumnContext, ColumnStats, LayerFlags, SolidityBits, WaterKind};
pub use self::column_plan::{ChunkOctaveCorners, ChunkTerrainPlan, build_chunk_terrain_plan};
pub use self::distortion::{DistortionBand, DomainWarp, WarpVector, apply_isotropic_threshold};
pub use self::landform_map::WeightedLandformMap;
pub use self::noise::{ColumnNoise, TerrainNoise};
pub use self::synthesizer::{ColumnTaper, NoiseFieldSynthesizer, ThresholdProfile, resolve_column};
pub use self::taper::{BorderTaper, Direction, NeighborHeights, TaperEntry, taper_threshold};
