//! Shard placement engine
//!
//! Chooses which live server holds which shard index for one file. The
//! same placement is reused for every stripe, so shard identity
//! (`path.j`) stays pinned to one server regardless of stripe count.

use crate::error::{DistNetDiskError, Result};
use rand::Rng;
use tracing::warn;

/// Select one server index per shard slot
///
/// Uniform selection without replacement via a partial Fisher-Yates
/// shuffle. Requires `server_num >= data_shard_num`. When the slot count
/// `data_shard_num + parity_shard_num` exceeds `server_num`, selection
/// wraps in further passes over fresh pools, so every server is covered
/// once before any server repeats; repeated servers hold more than one
/// shard role, which shrinks effective fault tolerance for this file.
pub fn place_shards<R: Rng>(
    rng: &mut R,
    server_num: usize,
    data_shard_num: usize,
    parity_shard_num: usize,
) -> Result<Vec<usize>> {
    if data_shard_num == 0 {
        return Err(DistNetDiskError::Configuration(
            "data_shard_num must be > 0".to_string(),
        ));
    }
    if server_num < data_shard_num {
        return Err(DistNetDiskError::InsufficientServers {
            servers: server_num,
            data_shard_num,
            parity_shard_num,
        });
    }

    let total = data_shard_num + parity_shard_num;
    if server_num < total {
        warn!(
            servers = server_num,
            shard_slots = total,
            "fewer servers than shard slots, some servers will hold multiple shard roles"
        );
    }

    let mut slots = Vec::with_capacity(total);
    while slots.len() < total {
        let mut pool: Vec<usize> = (0..server_num).collect();
        let take = (total - slots.len()).min(server_num);
        for i in 0..take {
            let j = rng.gen_range(i..pool.len());
            pool.swap(i, j);
        }
        slots.extend_from_slice(&pool[..take]);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_selects_distinct_servers() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let slots = place_shards(&mut rng, 10, 4, 2).unwrap();
            assert_eq!(slots.len(), 6);
            assert!(slots.iter().all(|&s| s < 10));
            let distinct: HashSet<_> = slots.iter().collect();
            assert_eq!(distinct.len(), 6);
        }
    }

    #[test]
    fn test_insufficient_servers() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            place_shards(&mut rng, 2, 3, 1),
            Err(DistNetDiskError::InsufficientServers {
                servers: 2,
                data_shard_num: 3,
                parity_shard_num: 1,
            })
        ));
    }

    #[test]
    fn test_data_shards_alone_suffice() {
        // server_num >= data_shard_num is enough even when parity pushes
        // the slot count past the server count.
        let mut rng = StdRng::seed_from_u64(7);
        let slots = place_shards(&mut rng, 4, 4, 3).unwrap();
        assert_eq!(slots.len(), 7);
    }

    #[test]
    fn test_wrap_covers_every_server_before_repeating() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let slots = place_shards(&mut rng, 5, 5, 4).unwrap();
            assert_eq!(slots.len(), 9);
            // First pass uses all five servers exactly once.
            let first: HashSet<_> = slots[..5].iter().collect();
            assert_eq!(first.len(), 5);
            // Wrapped slots are distinct among themselves too.
            let rest: HashSet<_> = slots[5..].iter().collect();
            assert_eq!(rest.len(), 4);
        }
    }

    #[test]
    fn test_uses_whole_server_pool_over_time() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(place_shards(&mut rng, 8, 2, 1).unwrap());
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = place_shards(&mut StdRng::seed_from_u64(99), 10, 4, 2).unwrap();
        let b = place_shards(&mut StdRng::seed_from_u64(99), 10, 4, 2).unwrap();
        assert_eq!(a, b);
    }
}
