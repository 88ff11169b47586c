use std::sync::atomic::{AtomicBool, Ordering};

use crate::landform::WeightedIndex;
use crate::region::IntDataMap2D;

/// Box-blurred landform indices: each cell holds the share of every variant
/// inside a `(2R+1)^2` window around it.
#[derive(Clone, Debug)]
pub struct WeightedLandformMap {
    size: usize,
    variant_count: usize,
    cells: Vec<Vec<WeightedIndex>>,
}

static OUT_OF_RANGE_WARNED: AtomicBool = AtomicBool::new(false);

impl WeightedLandformMap {
    pub fn new(map: &IntDataMap2D, radius: usize, variant_count: usize) -> Self {
        let size = map.full_size();
        let variant_count = variant_count.max(1);
        let window = (2 * radius + 1) as f32;
        let cell_weight = 1.0 / (window * window);
        let r = radius as isize;

        let mut counts = vec![0u32; variant_count];
        let mut cells = Vec::with_capacity(size * size);
        for z in 0..size as isize {
            for x in 0..size as isize {
                counts.fill(0);
                for dz in -r..=r {
                    for dx in -r..=r {
                        let raw = map.get(x + dx, z + dz);
                        counts[clamp_index(raw, variant_count)] += 1;
                    }
                }
                let entries = counts
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c > 0)
                    .map(|(index, &c)| WeightedIndex {
                        index,
                        weight: c as f32 * cell_weight,
                    })
                    .collect();
                cells.push(entries);
            }
        }
        Self {
            size,
            variant_count,
            cells,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn variant_count(&self) -> usize {
        self.variant_count
    }

    #[inline]
    pub fn cell(&self, x: usize, z: usize) -> &[WeightedIndex] {
        &self.cells[z * self.size + x]
    }

    /// Bilinear interpolation of the four enclosing cells (cell centers sit at
    /// `i + 0.5`). `out` is zeroed first and must hold one slot per variant.
    pub fn weights_at(&self, x: f32, z: f32, out: &mut [f32]) {
        out.fill(0.0);
        let (x0, x1, tx) = self.axis(x);
        let (z0, z1, tz) = self.axis(z);
        let corners = [
            (x0, z0, (1.0 - tx) * (1.0 - tz)),
            (x1, z0, tx * (1.0 - tz)),
            (x0, z1, (1.0 - tx) * tz),
            (x1, z1, tx * tz),
        ];
        for (cx, cz, w) in corners {
            if w == 0.0 {
                continue;
            }
            for entry in self.cell(cx, cz) {
                if let Some(slot) = out.get_mut(entry.index) {
                    *slot += entry.weight * w;
                }
            }
        }
    }

    fn axis(&self, coord: f32) -> (usize, usize, f32) {
        let last = self.size.saturating_sub(1) as f32;
        let c = coord - 0.5;
        let base = c.floor();
        let frac = (c - base).clamp(0.0, 1.0);
        let i0 = base.clamp(0.0, last) as usize;
        let i1 = (base + 1.0).clamp(0.0, last) as usize;
        (i0, i1, frac)
    }
}

fn clamp_index(raw: i32, variant_count: usize) -> usize {
    let last = variant_count - 1;
    if raw < 0 || raw as usize > last {
        if !OUT_OF_RANGE_WARNED.swap(true, Ordering::Relaxed) {
            log::warn!(
                "landform index {} outside 0..{}; clamping",
                raw,
                variant_count
            );
        }
        return (raw.max(0) as usize).min(last);
    }
    raw as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split_map() -> IntDataMap2D {
        IntDataMap2D::from_fn(8, 0, 0, |x, _| if x < 4 { 0 } else { 1 })
    }

    #[test]
    fn boundary_midpoint_is_even_split() {
        let blurred = WeightedLandformMap::new(&split_map(), 1, 2);
        let mut out = [0.0; 2];
        blurred.weights_at(4.0, 3.0, &mut out);
        assert!((out[0] - 0.5).abs() < 1e-5, "{out:?}");
        assert!((out[1] - 0.5).abs() < 1e-5, "{out:?}");
    }

    #[test]
    fn radius_zero_keeps_hard_edges() {
        let blurred = WeightedLandformMap::new(&split_map(), 0, 2);
        let mut out = [0.0; 2];
        blurred.weights_at(1.5, 1.5, &mut out);
        assert_eq!(out, [1.0, 0.0]);
        blurred.weights_at(6.5, 6.5, &mut out);
        assert_eq!(out, [0.0, 1.0]);
    }

    #[test]
    fn out_of_range_indices_are_clamped() {
        let map = IntDataMap2D::from_fn(4, 0, 0, |x, _| if x < 2 { -3 } else { 9 });
        let blurred = WeightedLandformMap::new(&map, 0, 3);
        assert_eq!(blurred.cell(0, 0)[0].index, 0);
        assert_eq!(blurred.cell(3, 0)[0].index, 2);
    }

    #[test]
    fn stale_output_is_overwritten() {
        let blurred = WeightedLandformMap::new(&split_map(), 1, 2);
        let mut out = [7.0, 7.0];
        blurred.weights_at(0.5, 0.5, &mut out);
        assert!((out[0] + out[1] - 1.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn weights_are_normalised(
            seed in 0u32..10_000,
            radius in 0usize..4,
            x in -4.0f32..24.0,
            z in -4.0f32..24.0,
        ) {
            let map = IntDataMap2D::from_fn(16, 2, 2, |cx, cz| {
                let h = (cx as u32).wrapping_mul(73_856_093) ^ (cz as u32).wrapping_mul(19_349_663) ^ seed;
                (h % 4) as i32
            });
            let blurred = WeightedLandformMap::new(&map, radius, 4);
            let mut out = [0.0f32; 4];
            blurred.weights_at(x, z, &mut out);
            let sum: f32 = out.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4, "sum {}", sum);
            prop_assert!(out.iter().all(|w| *w >= 0.0));
        }
    }
}
