use lithos_chunk::{AIR, ChunkColumnData, SUB_CHUNK_VOLUME};
use lithos_world::{CHUNK_SIZE, ChunkCoord};
use proptest::prelude::*;

fn local() -> impl Strategy<Value = usize> {
    0usize..CHUNK_SIZE
}

fn small_i32() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

proptest! {
    // idx maps each (x, y % 32, z) to a unique in-range index
    #[test]
    fn idx_is_unique_and_in_range(sub in 0usize..4) {
        let mut seen = vec![false; SUB_CHUNK_VOLUME];
        for y in sub * CHUNK_SIZE..(sub + 1) * CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let i = ChunkColumnData::idx(x, y, z);
                    prop_assert!(i < SUB_CHUNK_VOLUME);
                    prop_assert!(!seen[i]);
                    seen[i] = true;
                }
            }
        }
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // writes land in exactly one sub-chunk and read back
    #[test]
    fn set_then_get(x in local(), y in 0usize..128, z in local(), id in 1u16..u16::MAX) {
        let mut data = ChunkColumnData::new(ChunkCoord::new(0, 0), 128);
        data.set_block(x, y, z, id);
        data.set_fluid(x, y, z, id ^ 1);
        prop_assert_eq!(data.block(x, y, z), id);
        prop_assert_eq!(data.fluid(x, y, z), id ^ 1);
        let touched = data.sub_chunks.iter().filter(|s| !s.is_all_air()).count();
        prop_assert_eq!(touched, 1);
    }

    // contains_world matches the chunk bounds and aligns with block_world
    #[test]
    fn contains_world_and_block_world_agree(cx in small_i32(), cz in small_i32()) {
        let mut data = ChunkColumnData::new(ChunkCoord::new(cx, cz), 64);
        let (x0, z0) = ChunkCoord::new(cx, cz).base_block();
        data.set_block(31, 63, 31, 9);
        let s = CHUNK_SIZE as i32;
        let candidates = [
            (x0, 0, z0),
            (x0 + s - 1, 63, z0 + s - 1),
            (x0 - 1, 0, z0),
            (x0 + s, 0, z0),
            (x0, -1, z0),
            (x0, 64, z0),
            (x0, 0, z0 - 1),
            (x0, 0, z0 + s),
        ];
        for (wx, wy, wz) in candidates {
            let inside = (0..64).contains(&wy) && (x0..x0 + s).contains(&wx) && (z0..z0 + s).contains(&wz);
            prop_assert_eq!(data.contains_world(wx, wy, wz), inside);
            match data.block_world(wx, wy, wz) {
                None => prop_assert!(!inside),
                Some(b) => {
                    prop_assert!(inside);
                    let expected = if (wx - x0, wy, wz - z0) == (s - 1, 63, s - 1) { 9 } else { AIR };
                    prop_assert_eq!(b, expected);
                }
            }
        }
    }
}

#[test]
fn fill_layer_covers_whole_layer_only() {
    let mut data = ChunkColumnData::new(ChunkCoord::new(0, 0), 64);
    data.fill_layer(33, 4);
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            assert_eq!(data.block(x, 33, z), 4);
            assert_eq!(data.block(x, 32, z), AIR);
            assert_eq!(data.block(x, 34, z), AIR);
        }
    }
    assert!(data.sub_chunks[0].is_all_air());
}
