use std::f32::consts::FRAC_1_SQRT_2;

use crate::landform::{LandformVariant, blended_threshold};
use crate::region::RegionNoiseMaps;
use crate::worldgen::WorldGenParams;

use super::super::{TerrainScratch, World};
use super::column::{ColumnContext, WaterKind};
use super::column_plan::ChunkTerrainPlan;
use super::noise::{ColumnNoise, threshold_curve_inverse};
use super::taper::{TaperEntry, taper_threshold};

/// Threshold profile of one column: landform curves shifted by the warp and
/// basin offsets, plus the upheaval and ocean flattening terms.
pub struct ThresholdProfile<'a> {
    pub params: &'a WorldGenParams,
    pub variants: &'a [LandformVariant],
    pub weights: &'a [f32],
    pub y_offset: f32,
    pub upheaval: f32,
    pub oceanicity: f32,
}

impl ThresholdProfile<'_> {
    /// Blended threshold in curve space, before inversion.
    pub fn at(&self, y: f32) -> f32 {
        let p = self.params;
        let mut t = blended_threshold(self.variants, self.weights, y + self.y_offset);
        t += self.upheaval * (y - p.upheaval_taper_start).max(0.0) / p.upheaval_taper_divisor;
        let sea = p.dims.sea_level as f32;
        let flatten = ((y - sea) / p.ocean_flatten_band).clamp(0.0, 1.0);
        t += self.oceanicity * p.ocean_flatten_strength * flatten;
        t
    }
}

/// Border constraint for one column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnTaper {
    pub entry: TaperEntry,
    pub vertical_falloff: f32,
}

/// Fills `out.solid` for Y in `1..=height-2`; Y=0 is always solid and the top
/// block always air. `sample` is only called when the bounds cannot decide.
pub fn resolve_column(
    profile: &ThresholdProfile<'_>,
    taper: Option<ColumnTaper>,
    bound: f32,
    sample: impl FnMut(f32) -> f32,
    out: &mut ColumnContext,
) {
    resolve_column_with(profile, taper, bound, sample, out, true);
}

fn resolve_column_with(
    profile: &ThresholdProfile<'_>,
    taper: Option<ColumnTaper>,
    bound: f32,
    mut sample: impl FnMut(f32) -> f32,
    out: &mut ColumnContext,
    allow_early_exit: bool,
) {
    let height = out.solid.len();
    let (bound_min, bound_max) = (-bound, bound);
    out.solid.set(0, true);
    // Air shortcuts above this Y may end the column early.
    let free_above = taper.map_or(f32::NEG_INFINITY, |t| t.entry.taper_y());
    for y in 1..height.saturating_sub(1) {
        let yf = y as f32;
        let mut k = threshold_curve_inverse(profile.at(yf));
        if let Some(t) = taper {
            k = taper_threshold(k, t.entry, yf, bound_min, bound_max, t.vertical_falloff);
        }
        if k <= bound_min {
            out.stats.solid_shortcuts += 1;
            out.solid.set(y, true);
        } else if k >= bound_max {
            out.stats.air_shortcuts += 1;
            if allow_early_exit && yf > free_above {
                out.stats.early_exit = true;
                break;
            }
        } else {
            out.stats.noise_samples += 1;
            if sample(yf) - k > 0.0 {
                out.solid.set(y, true);
            }
        }
    }
}

/// Evaluates whole columns of one chunk. Pure in its inputs, so columns can be
/// computed in any order on any thread.
pub struct NoiseFieldSynthesizer<'a> {
    world: &'a World,
    maps: &'a RegionNoiseMaps,
    plan: &'a ChunkTerrainPlan,
}

impl<'a> NoiseFieldSynthesizer<'a> {
    pub fn new(world: &'a World, maps: &'a RegionNoiseMaps, plan: &'a ChunkTerrainPlan) -> Self {
        Self { world, maps, plan }
    }

    #[inline]
    pub fn world(&self) -> &World {
        self.world
    }

    #[inline]
    pub fn plan(&self) -> &ChunkTerrainPlan {
        self.plan
    }

    pub fn evaluate_column(
        &self,
        lx: usize,
        lz: usize,
        scratch: &mut TerrainScratch,
        out: &mut ColumnContext,
    ) {
        out.reset();
        let params = &*self.world.params;
        let plan = self.plan;
        plan.corners.column_octaves(lx, lz, scratch);

        let (wx, wz) = plan.world_column(lx, lz);
        let (fx, fz) = (lx as f32, lz as f32);
        let oceanicity = self.maps.oceanicity(&plan.frame.ocean, fx, fz);
        let upheaval = self.maps.upheaval(&plan.frame.upheaval, fx, fz);
        let celsius = self.maps.temperature_celsius(&plan.frame.climate, fx, fz);
        out.water = WaterKind::classify(celsius, oceanicity, params);

        let warp = self.world.domain_warp();
        let raw = warp.warp(wx, wz);
        let terrain = warp.terrain_band(raw);
        let geo = warp.geology_band(raw);
        let terrain_shift = (terrain.x + terrain.z) * FRAC_1_SQRT_2;
        let basin = warp.ocean_and_upheaval_offset(upheaval, oceanicity, wx, wz, geo);

        let profile = ThresholdProfile {
            params,
            variants: &params.landforms,
            weights: &scratch.weights,
            y_offset: terrain_shift + basin,
            upheaval,
            oceanicity,
        };
        let noise = ColumnNoise::new(
            self.world.terrain_noise(),
            &scratch.amps,
            &scratch.thrs,
            wx,
            wz,
        );
        let taper = plan
            .taper
            .as_ref()
            .and_then(|t| t.entry(lx, lz))
            .map(|entry| ColumnTaper {
                entry,
                vertical_falloff: params.taper_vertical_falloff,
            });
        resolve_column(&profile, taper, noise.bound(), |y| noise.sample(y), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::{LandformDef, WorldDims, WorldGenConfig};

    fn params_with_curve(positions: &[f32], thresholds: &[f32]) -> WorldGenParams {
        let mut cfg = WorldGenConfig::default();
        cfg.terrain.octaves = Some(4);
        cfg.landforms = vec![LandformDef {
            name: "test".into(),
            amplitudes: vec![0.5, 0.25, 0.125, 0.0625],
            thresholds: vec![0.0; 4],
            y_key_positions: positions.to_vec(),
            y_key_thresholds: thresholds.to_vec(),
        }];
        WorldGenParams::from_config(&cfg, WorldDims::new(64, 128, 64, 20)).unwrap()
    }

    fn profile<'a>(params: &'a WorldGenParams, weights: &'a [f32]) -> ThresholdProfile<'a> {
        ThresholdProfile {
            params,
            variants: &params.landforms,
            weights,
            y_offset: 0.0,
            upheaval: 0.0,
            oceanicity: 0.0,
        }
    }

    #[test]
    fn saturated_thresholds_never_sample() {
        // 0 up to y=63, 1 from y=64: every Y is decided by the bounds.
        let params = params_with_curve(&[0.0, 0.4921875, 0.5, 1.0], &[0.0, 0.0, 1.0, 1.0]);
        let weights = [1.0];
        let mut out = ColumnContext::new(128);
        let mut calls = 0;
        resolve_column(
            &profile(&params, &weights),
            None,
            0.9,
            |_| {
                calls += 1;
                0.0
            },
            &mut out,
        );
        assert_eq!(calls, 0);
        assert_eq!(out.solid.top_solid(), Some(63));
        assert!(out.stats.early_exit);
        assert_eq!(out.stats.air_shortcuts, 1);
    }

    #[test]
    fn boundary_values_short_circuit() {
        let params = params_with_curve(&[0.0, 1.0], &[0.5, 0.5]);
        let weights = [1.0];
        let mut out = ColumnContext::new(128);
        let mut calls = 0;
        // K = 0 at every Y; a zero bound puts K on both edges, and the solid
        // test wins.
        resolve_column(
            &profile(&params, &weights),
            None,
            0.0,
            |_| {
                calls += 1;
                0.0
            },
            &mut out,
        );
        assert_eq!(calls, 0);
        assert_eq!(out.solid.count_solid(), 127);
    }

    #[test]
    fn bottom_solid_top_air() {
        let params = params_with_curve(&[0.0, 1.0], &[1.0, 1.0]);
        let weights = [1.0];
        let mut out = ColumnContext::new(128);
        resolve_column(&profile(&params, &weights), None, 1.0, |_| 0.0, &mut out);
        assert!(out.solid.get(0));
        assert_eq!(out.solid.count_solid(), 1);

        let params = params_with_curve(&[0.0, 1.0], &[0.0, 0.0]);
        let mut out = ColumnContext::new(128);
        resolve_column(&profile(&params, &weights), None, 1.0, |_| 0.0, &mut out);
        assert!(!out.solid.get(127));
        assert_eq!(out.solid.top_solid(), Some(126));
    }

    #[test]
    fn early_exit_matches_full_scan() {
        let params = params_with_curve(&[0.0, 0.3, 0.6, 1.0], &[0.0, 0.2, 0.9, 1.0]);
        let weights = [1.0];
        let bound = 0.9375;
        let wave = |y: f32| (y * 0.37).sin() * bound;
        let mut fast = ColumnContext::new(128);
        let mut full = ColumnContext::new(128);
        resolve_column_with(&profile(&params, &weights), None, bound, wave, &mut fast, true);
        resolve_column_with(&profile(&params, &weights), None, bound, wave, &mut full, false);
        assert_eq!(fast.solid, full.solid);
        assert!(fast.stats.early_exit);
        assert!(fast.stats.air_shortcuts < full.stats.air_shortcuts);
    }

    #[test]
    fn taper_suppresses_early_exit_below_its_height() {
        // Natural surface near y=20, neighbor edge at y=90.
        let params = params_with_curve(&[0.0, 0.15, 0.16, 1.0], &[0.0, 0.0, 1.0, 1.0]);
        let weights = [1.0];
        let taper = ColumnTaper {
            entry: TaperEntry {
                neighbor_y: 90.0,
                weight: 1.0,
            },
            vertical_falloff: 12.0,
        };
        let mut out = ColumnContext::new(128);
        resolve_column(&profile(&params, &weights), Some(taper), 1.0, |_| 0.0, &mut out);
        assert_eq!(out.solid.top_solid(), Some(90));
    }

    #[test]
    fn ocean_flattening_raises_threshold_above_sea() {
        let params = params_with_curve(&[0.0, 1.0], &[0.2, 0.2]);
        let weights = [1.0];
        let mut p = profile(&params, &weights);
        p.oceanicity = 1.0;
        let below = p.at(10.0);
        let above = p.at(60.0);
        assert!((below - 0.2).abs() < 1e-6);
        assert!((above - (0.2 + params.ocean_flatten_strength)).abs() < 1e-5);
    }
}
