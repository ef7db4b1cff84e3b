//! Reed-Solomon shard codec
//!
//! Wraps the erasure-coding engine behind the fixed shard geometry of one
//! file: `data_shard_num` equal-length data buffers in, `data_shard_num +
//! parity_shard_num` equal-length shard buffers out, and reconstruction
//! from any subset with at least `data_shard_num` shards present.

use crate::error::{DistNetDiskError, Result};
use reed_solomon_erasure::galois_8::ReedSolomon;

/// Shard encoder/reconstructor for one (data, parity) geometry
pub struct ShardCodec {
    data_shard_num: usize,
    parity_shard_num: usize,
    // reed-solomon-erasure rejects zero parity shards, so the degenerate
    // parity_shard_num = 0 geometry carries no engine at all.
    engine: Option<ReedSolomon>,
}

impl ShardCodec {
    /// Create a codec for the given geometry
    pub fn new(data_shard_num: usize, parity_shard_num: usize) -> Result<Self> {
        if data_shard_num == 0 {
            return Err(DistNetDiskError::Configuration(
                "data_shard_num must be > 0".to_string(),
            ));
        }
        let engine = if parity_shard_num == 0 {
            None
        } else {
            Some(ReedSolomon::new(data_shard_num, parity_shard_num)?)
        };
        Ok(Self {
            data_shard_num,
            parity_shard_num,
            engine,
        })
    }

    /// Number of data shards per stripe
    pub fn data_shard_num(&self) -> usize {
        self.data_shard_num
    }

    /// Total shard slots per stripe
    pub fn total_shards(&self) -> usize {
        self.data_shard_num + self.parity_shard_num
    }

    /// Encode one stripe of data shards into data + parity shards
    ///
    /// Fails if the input count or any buffer length mismatches the
    /// geometry.
    pub fn encode(&self, mut shards: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        if shards.len() != self.data_shard_num {
            return Err(DistNetDiskError::ShardCountMismatch {
                expected: self.data_shard_num,
                actual: shards.len(),
            });
        }
        let shard_len = shards[0].len();
        for shard in &shards {
            if shard.len() != shard_len {
                return Err(DistNetDiskError::ShardSizeMismatch {
                    expected: shard_len,
                    actual: shard.len(),
                });
            }
        }

        for _ in 0..self.parity_shard_num {
            shards.push(vec![0u8; shard_len]);
        }
        if let Some(engine) = &self.engine {
            engine.encode(&mut shards)?;
        }
        Ok(shards)
    }

    /// Reconstruct all shards of one stripe from a partial set
    ///
    /// Missing slots are `None`; at least `data_shard_num` slots must be
    /// present.
    pub fn reconstruct(&self, mut shards: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>> {
        if shards.len() != self.total_shards() {
            return Err(DistNetDiskError::ShardCountMismatch {
                expected: self.total_shards(),
                actual: shards.len(),
            });
        }
        let available = shards.iter().filter(|s| s.is_some()).count();
        if available < self.data_shard_num {
            return Err(DistNetDiskError::InsufficientShards {
                available,
                required: self.data_shard_num,
            });
        }

        if let Some(engine) = &self.engine {
            engine.reconstruct(&mut shards)?;
        }
        shards
            .into_iter()
            .map(|shard| {
                shard.ok_or_else(|| {
                    DistNetDiskError::ErasureCoding("reconstruction left a shard empty".to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripe(data: usize, len: usize) -> Vec<Vec<u8>> {
        (0..data)
            .map(|i| (0..len).map(|j| ((i * len + j) % 256) as u8).collect())
            .collect()
    }

    #[test]
    fn test_encode_shape() {
        let codec = ShardCodec::new(4, 2).unwrap();
        let encoded = codec.encode(stripe(4, 64)).unwrap();
        assert_eq!(encoded.len(), 6);
        assert!(encoded.iter().all(|s| s.len() == 64));
    }

    #[test]
    fn test_reconstruct_with_losses() {
        let codec = ShardCodec::new(4, 2).unwrap();
        let original = stripe(4, 64);
        let encoded = codec.encode(original.clone()).unwrap();

        let mut partial: Vec<Option<Vec<u8>>> = encoded.into_iter().map(Some).collect();
        partial[1] = None; // data shard
        partial[5] = None; // parity shard

        let rebuilt = codec.reconstruct(partial).unwrap();
        assert_eq!(&rebuilt[..4], &original[..]);
    }

    #[test]
    fn test_reconstruct_too_many_missing() {
        let codec = ShardCodec::new(4, 2).unwrap();
        let encoded = codec.encode(stripe(4, 64)).unwrap();

        let mut partial: Vec<Option<Vec<u8>>> = encoded.into_iter().map(Some).collect();
        partial[0] = None;
        partial[2] = None;
        partial[4] = None;

        assert!(matches!(
            codec.reconstruct(partial),
            Err(DistNetDiskError::InsufficientShards {
                available: 3,
                required: 4
            })
        ));
    }

    #[test]
    fn test_encode_rejects_bad_shapes() {
        let codec = ShardCodec::new(4, 2).unwrap();
        assert!(matches!(
            codec.encode(stripe(3, 64)),
            Err(DistNetDiskError::ShardCountMismatch { .. })
        ));

        let mut uneven = stripe(4, 64);
        uneven[2].push(0);
        assert!(matches!(
            codec.encode(uneven),
            Err(DistNetDiskError::ShardSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_parity_passthrough() {
        let codec = ShardCodec::new(3, 0).unwrap();
        let original = stripe(3, 32);
        let encoded = codec.encode(original.clone()).unwrap();
        assert_eq!(encoded, original);

        let all: Vec<Option<Vec<u8>>> = encoded.into_iter().map(Some).collect();
        assert_eq!(codec.reconstruct(all).unwrap(), original);

        // No parity budget: a single missing shard is unrecoverable.
        let mut partial: Vec<Option<Vec<u8>>> = original.into_iter().map(Some).collect();
        partial[0] = None;
        assert!(matches!(
            codec.reconstruct(partial),
            Err(DistNetDiskError::InsufficientShards { .. })
        ));
    }

    #[test]
    fn test_zero_data_shards_rejected() {
        assert!(ShardCodec::new(0, 2).is_err());
    }
}
