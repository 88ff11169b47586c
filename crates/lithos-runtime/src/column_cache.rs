use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LockResult, Mutex, RwLock};

use hashbrown::HashMap;
use lithos_world::ChunkCoord;
use lithos_world::voxel::generation::{Direction, NeighborHeights};

#[derive(Clone, Copy, Debug, Default)]
pub struct TerrainHeightStoreStats {
    pub inserts: u64,
    pub neighbor_hits: u64,
    pub neighbor_misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Terrain height maps of generated chunks, used to taper later neighbors.
/// Holds at most `capacity` chunks; the least recently used are evicted.
pub struct TerrainHeightStore {
    entries: RwLock<HashMap<ChunkCoord, Arc<[u16]>>>,
    order: Mutex<VecDeque<ChunkCoord>>,
    capacity: usize,
    inserts: AtomicU64,
    neighbor_hits: AtomicU64,
    neighbor_misses: AtomicU64,
    evictions: AtomicU64,
}

// A panicking writer leaves the map itself intact; keep serving it.
fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(|poisoned| {
        log::warn!("terrain height store lock poisoned; continuing with its contents");
        poisoned.into_inner()
    })
}

impl TerrainHeightStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            inserts: AtomicU64::new(0),
            neighbor_hits: AtomicU64::new(0),
            neighbor_misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn insert(&self, coord: ChunkCoord, heights: Arc<[u16]>) {
        recover(self.entries.write()).insert(coord, heights);
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.touch(coord);
        self.enforce_capacity();
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<Arc<[u16]>> {
        let found = recover(self.entries.read()).get(&coord).cloned();
        if found.is_some() {
            self.touch(coord);
        }
        found
    }

    pub fn remove(&self, coord: ChunkCoord) -> Option<Arc<[u16]>> {
        let removed = recover(self.entries.write()).remove(&coord);
        self.remove_from_order(coord);
        removed
    }

    /// Collects whichever of the eight neighbors have been generated.
    pub fn neighbors_of(&self, coord: ChunkCoord) -> NeighborHeights {
        let mut out = NeighborHeights::new();
        let mut hit = Vec::with_capacity(8);
        {
            let map = recover(self.entries.read());
            for dir in Direction::ALL {
                let (dx, dz) = dir.offset();
                let at = coord.offset(dx, dz);
                match map.get(&at) {
                    Some(heights) => {
                        out.set(dir, Arc::clone(heights));
                        hit.push(at);
                    }
                    None => {
                        self.neighbor_misses.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
        self.neighbor_hits
            .fetch_add(hit.len() as u64, Ordering::Relaxed);
        for at in hit {
            self.touch(at);
        }
        out
    }

    pub fn clear(&self) {
        let removed = {
            let mut map = recover(self.entries.write());
            let len = map.len() as u64;
            map.clear();
            len
        };
        if removed > 0 {
            self.evictions.fetch_add(removed, Ordering::Relaxed);
        }
        recover(self.order.lock()).clear();
    }

    pub fn len(&self) -> usize {
        recover(self.entries.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TerrainHeightStoreStats {
        TerrainHeightStoreStats {
            inserts: self.inserts.load(Ordering::Relaxed),
            neighbor_hits: self.neighbor_hits.load(Ordering::Relaxed),
            neighbor_misses: self.neighbor_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn touch(&self, coord: ChunkCoord) {
        let mut order = recover(self.order.lock());
        if let Some(pos) = order.iter().position(|c| *c == coord) {
            order.remove(pos);
        }
        order.push_back(coord);
    }

    fn remove_from_order(&self, coord: ChunkCoord) {
        let mut order = recover(self.order.lock());
        if let Some(pos) = order.iter().position(|c| *c == coord) {
            order.remove(pos);
        }
    }

    fn enforce_capacity(&self) {
        let mut victims = Vec::new();
        {
            let mut order = recover(self.order.lock());
            while order.len() > self.capacity {
                if let Some(old) = order.pop_front() {
                    victims.push(old);
                }
            }
        }
        if victims.is_empty() {
            return;
        }
        let mut map = recover(self.entries.write());
        for coord in victims {
            if map.remove(&coord).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
