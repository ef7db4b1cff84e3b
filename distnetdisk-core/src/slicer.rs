//! Stripe slicer
//!
//! Deterministically partitions a file of known length into stripes of
//! `data_shard_num` shard-sized buffers, zero-padding the final stripe.
//! Modeled as an explicit state machine over a single-pass reader: call
//! [`StripeSlicer::next_stripe`] until it returns `None`, then record
//! [`StripeSlicer::padding`] in the file's metadata so download can trim
//! the output precisely.

use crate::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Single-pass slicer over a byte stream of known length
///
/// Produces `floor(size / stripe_bytes)` full stripes, then one final
/// zero-padded stripe when the tail is non-empty. An empty file still
/// yields exactly one (fully padded) stripe, so every file has at least
/// one addressable shard set. The sequence is not restartable; slicing
/// twice re-reads the source from the start.
pub struct StripeSlicer<R> {
    reader: R,
    shard_size: usize,
    data_shard_num: usize,
    full_stripes: u64,
    tail_bytes: u64,
    stripe_count: u64,
    next_stripe: u64,
}

impl<R: AsyncRead + Unpin> StripeSlicer<R> {
    /// Create a slicer over `reader`, which must yield exactly
    /// `file_size` bytes.
    pub fn new(reader: R, file_size: u64, shard_size: usize, data_shard_num: usize) -> Self {
        let stripe_bytes = shard_size as u64 * data_shard_num as u64;
        let full_stripes = file_size / stripe_bytes;
        let tail_bytes = file_size % stripe_bytes;
        let has_padded_stripe = tail_bytes != 0 || file_size == 0;
        Self {
            reader,
            shard_size,
            data_shard_num,
            full_stripes,
            tail_bytes,
            stripe_count: full_stripes + u64::from(has_padded_stripe),
            next_stripe: 0,
        }
    }

    /// Byte length of one full stripe
    pub fn stripe_bytes(&self) -> u64 {
        self.shard_size as u64 * self.data_shard_num as u64
    }

    /// Total number of stripes this slicer will produce
    pub fn stripe_count(&self) -> u64 {
        self.stripe_count
    }

    /// Zero bytes appended to the final stripe
    ///
    /// Always in `[0, stripe_bytes)`; `file_size + padding` is a multiple
    /// of `stripe_bytes`.
    pub fn padding(&self) -> u64 {
        (self.stripe_bytes() - self.tail_bytes) % self.stripe_bytes()
    }

    /// Advance the state machine: read and slice the next stripe, or
    /// return `None` once the source is exhausted.
    pub async fn next_stripe(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
        if self.next_stripe >= self.stripe_count {
            return Ok(None);
        }
        let stripe_bytes = self.stripe_bytes() as usize;

        let mut buf = vec![0u8; stripe_bytes];
        if self.next_stripe < self.full_stripes {
            self.reader.read_exact(&mut buf).await?;
        } else {
            // Final stripe: only the tail carries file bytes, the rest
            // stays zero.
            self.reader
                .read_exact(&mut buf[..self.tail_bytes as usize])
                .await?;
        }
        self.next_stripe += 1;

        let shards = buf
            .chunks(self.shard_size)
            .map(|shard| shard.to_vec())
            .collect();
        Ok(Some(shards))
    }
}
