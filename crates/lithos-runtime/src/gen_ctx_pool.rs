use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use lithos_world::TerrainScratch;

/// Lock-free pool of per-worker scratch buffers, reused across chunks.
///
/// Never blocks: when every pooled buffer is checked out (rayon may run more
/// fold splits than there are workers) a fresh one is allocated, and buffers
/// returned to a full pool are dropped.
pub struct ScratchPool {
    available_tx: Sender<TerrainScratch>,
    available_rx: Receiver<TerrainScratch>,
    allocated: AtomicUsize,
    capacity: usize,
    octaves: usize,
    variants: usize,
}

impl ScratchPool {
    pub fn new(capacity: usize, octaves: usize, variants: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            capacity,
            octaves,
            variants,
        }
    }

    pub fn with_capacity_from_workers(workers: usize, octaves: usize, variants: usize) -> Self {
        Self::new(workers.max(1) * 2, octaves, variants)
    }

    pub fn acquire(&self) -> PooledScratch<'_> {
        if let Ok(scratch) = self.available_rx.try_recv() {
            return PooledScratch {
                scratch: Some(scratch),
                pool: self,
            };
        }
        let prev = self.allocated.fetch_add(1, Ordering::AcqRel);
        if prev >= self.capacity {
            log::trace!(
                "scratch pool over capacity ({} > {}); allocating overflow buffer",
                prev + 1,
                self.capacity
            );
        }
        PooledScratch {
            scratch: Some(TerrainScratch::new(self.octaves, self.variants)),
            pool: self,
        }
    }

    /// Buffers created so far, including overflow ones.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    pub fn idle(&self) -> usize {
        self.available_rx.len()
    }

    fn release(&self, scratch: TerrainScratch) {
        if !scratch.fits(self.octaves, self.variants) {
            return;
        }
        let _ = self.available_tx.try_send(scratch);
    }
}

pub struct PooledScratch<'pool> {
    scratch: Option<TerrainScratch>,
    pool: &'pool ScratchPool,
}

impl Deref for PooledScratch<'_> {
    type Target = TerrainScratch;

    fn deref(&self) -> &Self::Target {
        self.scratch.as_ref().expect("scratch already released")
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scratch.as_mut().expect("scratch already released")
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.release(scratch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_reused() {
        let pool = ScratchPool::new(2, 9, 3);
        {
            let a = pool.acquire();
            assert_eq!(a.amps.len(), 9);
            assert_eq!(a.weights.len(), 3);
        }
        assert_eq!(pool.idle(), 1);
        let _b = pool.acquire();
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn overflow_does_not_block() {
        let pool = ScratchPool::new(1, 4, 2);
        let held: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
        assert_eq!(pool.allocated(), 4);
        drop(held);
        assert_eq!(pool.idle(), 1);
    }
}
