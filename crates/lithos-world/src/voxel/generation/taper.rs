use std::sync::Arc;

use crate::voxel::{CHUNK_AREA, CHUNK_SIZE};

/// The eight horizontal neighbors of a chunk. North is -Z, east is +X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

/// How a chunk-local axis relates to the edge shared with a neighbor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeAxis {
    /// Runs along the shared edge; does not contribute distance.
    Along,
    /// Neighbor lies on the low side (local 0 touches it).
    Low,
    /// Neighbor lies on the high side (local 31 touches it).
    High,
}

struct DirectionRow {
    offset: (i32, i32),
    x: EdgeAxis,
    z: EdgeAxis,
}

const DIRECTION_TABLE: [DirectionRow; 8] = {
    use EdgeAxis::{Along, High, Low};
    [
        DirectionRow { offset: (0, -1), x: Along, z: Low },
        DirectionRow { offset: (1, 0), x: High, z: Along },
        DirectionRow { offset: (0, 1), x: Along, z: High },
        DirectionRow { offset: (-1, 0), x: Low, z: Along },
        DirectionRow { offset: (1, -1), x: High, z: Low },
        DirectionRow { offset: (1, 1), x: High, z: High },
        DirectionRow { offset: (-1, 1), x: Low, z: High },
        DirectionRow { offset: (-1, -1), x: Low, z: Low },
    ]
};

const LAST: usize = CHUNK_SIZE - 1;

impl EdgeAxis {
    #[inline]
    fn distance(self, l: usize) -> usize {
        match self {
            EdgeAxis::Along => 0,
            EdgeAxis::Low => l,
            EdgeAxis::High => LAST - l,
        }
    }

    #[inline]
    fn neighbor_local(self, l: usize) -> usize {
        match self {
            EdgeAxis::Along => l,
            EdgeAxis::Low => LAST,
            EdgeAxis::High => 0,
        }
    }
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn row(self) -> &'static DirectionRow {
        &DIRECTION_TABLE[self.index()]
    }

    /// Chunk offset `(dx, dz)` of the neighbor.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        self.row().offset
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        let (dx, dz) = self.offset();
        dx != 0 && dz != 0
    }

    /// Distance from a local column to the shared edge (cardinal) or the
    /// shared corner (diagonal, Chebyshev).
    #[inline]
    pub fn edge_distance(self, lx: usize, lz: usize) -> usize {
        let row = self.row();
        row.x.distance(lx).max(row.z.distance(lz))
    }

    /// Column in the neighbor chunk nearest to local `(lx, lz)`.
    #[inline]
    pub fn neighbor_column(self, lx: usize, lz: usize) -> (usize, usize) {
        let row = self.row();
        (row.x.neighbor_local(lx), row.z.neighbor_local(lz))
    }
}

/// Terrain height maps of already generated neighbors, indexed by [`Direction`].
#[derive(Clone, Debug, Default)]
pub struct NeighborHeights {
    slots: [Option<Arc<[u16]>>; 8],
}

impl NeighborHeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, dir: Direction, heights: Arc<[u16]>) {
        self.slots[dir.index()] = Some(heights);
    }

    #[inline]
    pub fn get(&self, dir: Direction) -> Option<&[u16]> {
        self.slots[dir.index()].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Height the neighbors expect at a column and how strongly to enforce it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaperEntry {
    pub neighbor_y: f32,
    pub weight: f32,
}

impl TaperEntry {
    #[inline]
    pub fn taper_y(&self) -> f32 {
        self.neighbor_y.round()
    }
}

#[derive(Clone, Debug)]
pub struct BorderTaper {
    entries: Vec<Option<TaperEntry>>,
}

impl BorderTaper {
    /// `None` when no neighbor contributes anywhere in the chunk.
    pub fn compute(neighbors: &NeighborHeights, width: f32) -> Option<BorderTaper> {
        if neighbors.is_empty() || !(width > 0.0) {
            return None;
        }
        let mut present = Vec::with_capacity(8);
        for dir in Direction::ALL {
            match neighbors.get(dir) {
                Some(h) if h.len() == CHUNK_AREA => present.push((dir, h)),
                Some(h) => {
                    log::warn!(
                        "ignoring {:?} neighbor heights with {} entries",
                        dir,
                        h.len()
                    );
                }
                None => {}
            }
        }
        if present.is_empty() {
            return None;
        }

        let mut entries = Vec::with_capacity(CHUNK_AREA);
        let mut contrib: Vec<(f32, f32)> = Vec::with_capacity(present.len());
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                contrib.clear();
                for &(dir, heights) in &present {
                    let dist = dir.edge_distance(lx, lz) as f32;
                    let w = (1.0 - dist / width).max(0.0);
                    if w <= 0.0 {
                        continue;
                    }
                    let (nx, nz) = dir.neighbor_column(lx, lz);
                    contrib.push((f32::from(heights[nz * CHUNK_SIZE + nx]), w));
                }
                entries.push(blend_neighbors(&contrib));
            }
        }
        Some(BorderTaper { entries })
    }

    #[inline]
    pub fn entry(&self, lx: usize, lz: usize) -> Option<TaperEntry> {
        self.entries[lz * CHUNK_SIZE + lx]
    }
}

/// Squared-weight average of `(height, w)` pairs, where each weight is also
/// scaled by `1 - w` of every other contributor. A neighbor touching the
/// column (`w == 1`) silences the others, so a shared edge follows only the
/// chunk across it. Where several neighbors touch (corners) the plain
/// squared-weight average is used.
fn blend_neighbors(contrib: &[(f32, f32)]) -> Option<TaperEntry> {
    if contrib.is_empty() {
        return None;
    }
    let mut max_w = 0.0_f32;
    let mut sum_hw = 0.0_f32;
    let mut sum_w = 0.0_f32;
    let mut plain_hw = 0.0_f32;
    let mut plain_w = 0.0_f32;
    for (i, &(h, w)) in contrib.iter().enumerate() {
        let w2 = w * w;
        max_w = max_w.max(w2);
        plain_hw += h * w2;
        plain_w += w2;
        let damp: f32 = contrib
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &(_, other))| 1.0 - other)
            .product();
        sum_hw += h * w2 * damp;
        sum_w += w2 * damp;
    }
    let neighbor_y = if sum_w > 0.0 {
        sum_hw / sum_w
    } else {
        plain_hw / plain_w
    };
    Some(TaperEntry {
        neighbor_y,
        weight: max_w,
    })
}

/// Pulls `k` towards a step at the taper height: solid at and below, air
/// above. Columns on the shared edge take the step outright.
pub fn taper_threshold(
    k: f32,
    entry: TaperEntry,
    y: f32,
    bound_min: f32,
    bound_max: f32,
    vertical_falloff: f32,
) -> f32 {
    let solid_step = bound_min - 1.0;
    let air_step = bound_max + 1.0;
    let k = k.clamp(solid_step, air_step);
    let taper_y = entry.taper_y();
    let step = if y <= taper_y { solid_step } else { air_step };
    let blend = if entry.weight >= 1.0 {
        1.0
    } else {
        let dy = (y - taper_y).abs();
        entry.weight * (1.0 - (dy - 1.0) / vertical_falloff).clamp(0.0, 1.0)
    };
    k + (step - k) * blend
}
