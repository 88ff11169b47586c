use super::generation::ColumnStats;

/// Reusable per-worker buffers for column evaluation.
#[derive(Clone, Debug)]
pub struct TerrainScratch {
    pub amps: Vec<f32>,
    pub thrs: Vec<f32>,
    pub weights: Vec<f32>,
}

impl TerrainScratch {
    pub fn new(octaves: usize, variants: usize) -> Self {
        Self {
            amps: vec![0.0; octaves],
            thrs: vec![0.0; octaves],
            weights: vec![0.0; variants],
        }
    }

    #[inline]
    pub fn fits(&self, octaves: usize, variants: usize) -> bool {
        self.amps.len() == octaves && self.weights.len() == variants
    }
}

/// Per-chunk counters and timings, logged at debug.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkTerrainMetrics {
    pub columns: u32,
    pub solid_shortcuts: u32,
    pub air_shortcuts: u32,
    pub noise_samples: u32,
    pub early_exits: u32,
    pub evaluate_us: u32,
    pub materialize_us: u32,
}

impl ChunkTerrainMetrics {
    pub fn record_column(&mut self, stats: &ColumnStats) {
        self.columns += 1;
        self.solid_shortcuts += stats.solid_shortcuts;
        self.air_shortcuts += stats.air_shortcuts;
        self.noise_samples += stats.noise_samples;
        if stats.early_exit {
            self.early_exits += 1;
        }
    }

    /// Share of evaluated blocks that needed no noise sample.
    pub fn shortcut_ratio(&self) -> f32 {
        let shortcuts = self.solid_shortcuts + self.air_shortcuts;
        let total = shortcuts + self.noise_samples;
        if total == 0 {
            0.0
        } else {
            shortcuts as f32 / total as f32
        }
    }
}
