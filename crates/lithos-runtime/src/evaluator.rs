use std::thread;

use lithos_world::CHUNK_SIZE;
use lithos_world::voxel::generation::{ColumnContext, LayerFlags, NoiseFieldSynthesizer};
use lithos_world::worldgen::ThreadParams;
use lithos_world::World;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::gen_ctx_pool::ScratchPool;

/// `clamp(cpus - headroom, 1, max_workers)`, halved (min 1) when constrained.
pub fn worker_count(available: usize, threads: &ThreadParams) -> usize {
    let n = available
        .saturating_sub(threads.reserved_headroom)
        .clamp(1, threads.max_workers.max(1));
    if threads.constrained { (n / 2).max(1) } else { n }
}

/// Fans the columns of one chunk out over a dedicated rayon pool.
pub struct ColumnEvaluator {
    pool: ThreadPool,
    scratch: ScratchPool,
    workers: usize,
}

impl ColumnEvaluator {
    pub fn new(world: &World) -> Result<Self, ThreadPoolBuildError> {
        let available = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let workers = worker_count(available, &world.params.threads);
        Self::with_workers(world, workers)
    }

    pub fn with_workers(world: &World, workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lithos-terrain-{i}"))
            .build()?;
        let scratch = ScratchPool::with_capacity_from_workers(
            workers,
            world.params.octaves,
            world.params.landforms.len(),
        );
        log::info!("terrain evaluator: {} workers", workers);
        Ok(Self {
            pool,
            scratch,
            workers,
        })
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn scratch_pool(&self) -> &ScratchPool {
        &self.scratch
    }

    /// Each column writes only its own slot; layer flags are folded per split
    /// and AND-reduced once the parallel phase is over.
    pub fn evaluate(
        &self,
        synth: &NoiseFieldSynthesizer<'_>,
        columns: &mut [ColumnContext],
    ) -> LayerFlags {
        let height = synth.world().height();
        self.pool.install(|| {
            columns
                .par_iter_mut()
                .enumerate()
                .fold(
                    || (self.scratch.acquire(), LayerFlags::new(height)),
                    |(mut scratch, mut flags), (i, out)| {
                        synth.evaluate_column(i % CHUNK_SIZE, i / CHUNK_SIZE, &mut scratch, out);
                        flags.absorb(&out.solid);
                        (scratch, flags)
                    },
                )
                .map(|(_, flags)| flags)
                .reduce(|| LayerFlags::new(height), |a, b| a.merge(&b))
        })
    }

    /// Same per-column work on the calling thread.
    pub fn evaluate_serial(
        &self,
        synth: &NoiseFieldSynthesizer<'_>,
        columns: &mut [ColumnContext],
    ) -> LayerFlags {
        let mut flags = LayerFlags::new(synth.world().height());
        let mut scratch = self.scratch.acquire();
        for (i, out) in columns.iter_mut().enumerate() {
            synth.evaluate_column(i % CHUNK_SIZE, i / CHUNK_SIZE, &mut scratch, out);
            flags.absorb(&out.solid);
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn threads(headroom: usize, max: usize, constrained: bool) -> ThreadParams {
        ThreadParams {
            reserved_headroom: headroom,
            max_workers: max,
            constrained,
        }
    }

    #[test]
    fn worker_count_policy() {
        assert_eq!(worker_count(16, &threads(1, 8, false)), 8);
        assert_eq!(worker_count(4, &threads(1, 8, false)), 3);
        assert_eq!(worker_count(1, &threads(1, 8, false)), 1);
        assert_eq!(worker_count(4, &threads(1, 8, true)), 1);
        assert_eq!(worker_count(16, &threads(2, 12, true)), 6);
        assert_eq!(worker_count(2, &threads(0, 8, true)), 1);
    }

    proptest! {
        #[test]
        fn worker_count_stays_in_range(
            available in 0usize..256,
            headroom in 0usize..8,
            max in 0usize..64,
            constrained in any::<bool>(),
        ) {
            let n = worker_count(available, &threads(headroom, max, constrained));
            prop_assert!(n >= 1);
            prop_assert!(n <= max.max(1));
        }
    }
}
