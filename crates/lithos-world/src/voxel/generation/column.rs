use crate::worldgen::WorldGenParams;

/// One bit per block of a column; bit set means solid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolidityBits {
    words: Vec<u64>,
    len: usize,
}

impl SolidityBits {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, y: usize) -> bool {
        y < self.len && (self.words[y >> 6] >> (y & 63)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, y: usize, solid: bool) {
        debug_assert!(y < self.len);
        let mask = 1u64 << (y & 63);
        if solid {
            self.words[y >> 6] |= mask;
        } else {
            self.words[y >> 6] &= !mask;
        }
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Highest solid Y, if any.
    pub fn top_solid(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + 63 - w.leading_zeros() as usize)
    }

    pub fn count_solid(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// What fills air below sea level in a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaterKind {
    Fresh,
    Salt,
    /// Frozen surface over fresh or salt water.
    Ice { salt: bool },
}

impl WaterKind {
    pub fn classify(celsius: f32, oceanicity: f32, params: &WorldGenParams) -> Self {
        let salt = oceanicity > params.salt_threshold;
        if celsius < params.freeze_temperature {
            WaterKind::Ice { salt }
        } else if salt {
            WaterKind::Salt
        } else {
            WaterKind::Fresh
        }
    }

    #[inline]
    pub fn is_salt(self) -> bool {
        matches!(self, WaterKind::Salt | WaterKind::Ice { salt: true })
    }
}

/// Per-column counters rolled up into chunk metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnStats {
    pub solid_shortcuts: u32,
    pub air_shortcuts: u32,
    pub noise_samples: u32,
    pub early_exit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnContext {
    pub solid: SolidityBits,
    pub water: WaterKind,
    pub stats: ColumnStats,
}

impl ColumnContext {
    pub fn new(height: usize) -> Self {
        Self {
            solid: SolidityBits::new(height),
            water: WaterKind::Fresh,
            stats: ColumnStats::default(),
        }
    }

    pub fn reset(&mut self) {
        self.solid.clear();
        self.water = WaterKind::Fresh;
        self.stats = ColumnStats::default();
    }
}

/// Per-layer flags for a whole chunk, combined by logical AND.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerFlags {
    fully_solid: Vec<u64>,
    fully_empty: Vec<u64>,
    height: usize,
}

impl LayerFlags {
    /// Identity of the AND reduction: every layer both solid and empty.
    pub fn new(height: usize) -> Self {
        let words = height.div_ceil(64);
        Self {
            fully_solid: vec![u64::MAX; words],
            fully_empty: vec![u64::MAX; words],
            height,
        }
    }

    pub fn absorb(&mut self, column: &SolidityBits) {
        for ((solid, empty), bits) in self
            .fully_solid
            .iter_mut()
            .zip(self.fully_empty.iter_mut())
            .zip(column.words())
        {
            *solid &= *bits;
            *empty &= !*bits;
        }
    }

    pub fn merge(mut self, other: &LayerFlags) -> Self {
        for (a, b) in self.fully_solid.iter_mut().zip(&other.fully_solid) {
            *a &= *b;
        }
        for (a, b) in self.fully_empty.iter_mut().zip(&other.fully_empty) {
            *a &= *b;
        }
        self
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_fully_solid(&self, y: usize) -> bool {
        y < self.height && (self.fully_solid[y >> 6] >> (y & 63)) & 1 == 1
    }

    #[inline]
    pub fn is_fully_empty(&self, y: usize) -> bool {
        y < self.height && (self.fully_empty[y >> 6] >> (y & 63)) & 1 == 1
    }

    /// Number of consecutive fully solid layers starting at `from`.
    pub fn solid_run_from(&self, from: usize) -> usize {
        (from..self.height)
            .take_while(|&y| self.is_fully_solid(y))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::WorldDims;

    #[test]
    fn bits_track_top_solid() {
        let mut bits = SolidityBits::new(130);
        assert_eq!(bits.top_solid(), None);
        bits.set(0, true);
        bits.set(70, true);
        bits.set(129, true);
        assert_eq!(bits.top_solid(), Some(129));
        bits.set(129, false);
        assert_eq!(bits.top_solid(), Some(70));
        assert_eq!(bits.count_solid(), 2);
        assert!(!bits.get(500));
    }

    #[test]
    fn layer_flags_and_reduce() {
        let mut a = SolidityBits::new(64);
        let mut b = SolidityBits::new(64);
        for y in 0..10 {
            a.set(y, true);
            b.set(y, true);
        }
        a.set(20, true);
        let mut left = LayerFlags::new(64);
        left.absorb(&a);
        let mut right = LayerFlags::new(64);
        right.absorb(&b);
        let flags = left.merge(&right);
        assert_eq!(flags.solid_run_from(0), 10);
        assert!(!flags.is_fully_solid(20));
        assert!(!flags.is_fully_empty(20));
        assert!(flags.is_fully_empty(30));
    }

    #[test]
    fn water_classification() {
        let params = WorldGenParams::default_for(WorldDims::new(64, 128, 64, 60)).unwrap();
        assert_eq!(WaterKind::classify(10.0, 0.0, &params), WaterKind::Fresh);
        assert_eq!(WaterKind::classify(10.0, 0.9, &params), WaterKind::Salt);
        assert_eq!(
            WaterKind::classify(-15.0, 0.9, &params),
            WaterKind::Ice { salt: true }
        );
        assert!(WaterKind::Ice { salt: true }.is_salt());
        assert!(!WaterKind::Ice { salt: false }.is_salt());
    }
}
