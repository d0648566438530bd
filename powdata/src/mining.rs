//! Nonce search over an auxiliary header.
//!
//! A search owns its header for the whole loop. To mine in parallel, give
//! each worker its own copy of the header and one of the ranges from
//! [`NonceRange::split`]; publishing a winning header back into a shared
//! record is the caller's business.

use bitcoin::pow::CompactTarget;
use thiserror::Error;

use crate::algo::PowAlgo;
use crate::aux_header::AuxHeader;
use crate::consensus::ConsensusParams;
use crate::pow::check_proof_of_work;
use crate::tracing::prelude::*;

/// Errors that can occur when creating nonce ranges.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceRangeError {
    #[error("Invalid range: start {0} > end {1}")]
    InvalidRange(u32, u32),
}

/// An inclusive range of nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceRange {
    start: u32,
    end: u32,
}

impl NonceRange {
    pub fn new(start: u32, end: u32) -> Result<Self, NonceRangeError> {
        if start > end {
            return Err(NonceRangeError::InvalidRange(start, end));
        }
        Ok(Self { start, end })
    }

    /// Every 32-bit nonce.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: u32::MAX,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of nonces in the range.
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Always false; a range holds at least one nonce.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, nonce: u32) -> bool {
        (self.start..=self.end).contains(&nonce)
    }

    /// Split into `n` contiguous, non-overlapping sub-ranges.
    ///
    /// Sizes differ by at most one, with the remainder going to the first
    /// few ranges. Returns `None` if `n` is 0 or exceeds the range length.
    pub fn split(&self, n: usize) -> Option<Vec<NonceRange>> {
        if n == 0 || n as u64 > self.len() {
            return None;
        }

        let total = self.len();
        let chunk = total / n as u64;
        let remainder = total % n as u64;

        let mut ranges = Vec::with_capacity(n);
        let mut start = u64::from(self.start);
        for i in 0..n as u64 {
            let size = chunk + u64::from(i < remainder);
            let end = start + size - 1;
            // Both bounds lie within the parent range, so they fit in u32
            ranges.push(NonceRange {
                start: start as u32,
                end: end as u32,
            });
            start = end + 1;
        }
        Some(ranges)
    }
}

/// Search `range` for a nonce that makes `header` pass the proof check.
///
/// Returns the winning nonce, which is also left in `header.nonce`. When the
/// range is exhausted `None` is returned and the header holds the last nonce
/// tried; vary another field such as `time` before searching again.
pub fn search(
    header: &mut AuxHeader,
    algo: PowAlgo,
    bits: CompactTarget,
    params: &ConsensusParams,
    range: NonceRange,
) -> Option<u32> {
    for nonce in range.start..=range.end {
        header.nonce = nonce;
        if check_proof_of_work(header, algo, bits, params) {
            debug!(nonce, %algo, tried = nonce - range.start + 1, "Found proof of work");
            return Some(nonce);
        }
    }

    trace!(start = range.start, end = range.end, "Nonce range exhausted");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hash_types::BlockHash;
    use bitcoin::hashes::Hash;

    const BITS_REGTEST: u32 = 0x207f_ffff;

    #[test]
    fn new_range() {
        let range = NonceRange::new(10, 20).unwrap();
        assert_eq!(range.len(), 11);
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));

        assert_eq!(NonceRange::new(5, 5).unwrap().len(), 1);
        assert_eq!(
            NonceRange::new(6, 5),
            Err(NonceRangeError::InvalidRange(6, 5))
        );
    }

    #[test]
    fn full_range() {
        let range = NonceRange::full();
        assert_eq!(range.len(), 1u64 << 32);
        assert!(range.contains(u32::MAX));
    }

    #[test]
    fn split_even() {
        let splits = NonceRange::new(0, 99).unwrap().split(4).unwrap();
        assert_eq!(splits.len(), 4);
        for (i, range) in splits.iter().enumerate() {
            assert_eq!(range.len(), 25);
            assert_eq!(range.start(), 25 * i as u32);
            assert_eq!(range.end(), 25 * i as u32 + 24);
        }
    }

    #[test]
    fn split_with_remainder() {
        let splits = NonceRange::new(0, 9).unwrap().split(3).unwrap();
        let sizes: Vec<u64> = splits.iter().map(NonceRange::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn split_full_range_covers_everything() {
        let splits = NonceRange::full().split(7).unwrap();
        assert_eq!(splits.first().unwrap().start(), 0);
        assert_eq!(splits.last().unwrap().end(), u32::MAX);
        for pair in splits.windows(2) {
            assert_eq!(pair[0].end() + 1, pair[1].start());
        }
        let total: u64 = splits.iter().map(NonceRange::len).sum();
        assert_eq!(total, 1u64 << 32);
    }

    #[test]
    fn split_rejects_bad_counts() {
        let range = NonceRange::new(0, 2).unwrap();
        assert!(range.split(0).is_none());
        assert!(range.split(4).is_none());
        assert_eq!(range.split(1).unwrap(), vec![range]);
    }

    #[test]
    fn search_finds_valid_nonce() {
        let params = ConsensusParams::regtest();
        let bits = CompactTarget::from_consensus(BITS_REGTEST);
        let mut header = AuxHeader::committing_to(BlockHash::from_byte_array([7; 32]), 0);

        for algo in [PowAlgo::Sha256d, PowAlgo::Neoscrypt] {
            let nonce = search(&mut header, algo, bits, &params, NonceRange::full()).unwrap();
            assert_eq!(header.nonce, nonce);
            assert!(check_proof_of_work(&header, algo, bits, &params));
        }
    }

    #[test]
    fn search_exhausts_impossible_target() {
        let params = ConsensusParams::regtest();
        let bits = CompactTarget::from_consensus(0);
        let mut header = AuxHeader::null();
        let range = NonceRange::new(100, 131).unwrap();

        assert_eq!(search(&mut header, PowAlgo::Sha256d, bits, &params, range), None);
        assert_eq!(header.nonce, 131);
    }

    #[test]
    fn independent_workers() {
        let params = ConsensusParams::regtest();
        let bits = CompactTarget::from_consensus(BITS_REGTEST);
        let template = AuxHeader::committing_to(BlockHash::from_byte_array([9; 32]), 0);
        let ranges = NonceRange::full().split(4).unwrap();

        let found: Vec<(NonceRange, Option<u32>)> = std::thread::scope(|s| {
            let handles: Vec<_> = ranges
                .iter()
                .map(|&range| {
                    let params = &params;
                    s.spawn(move || {
                        let mut header = template;
                        (range, search(&mut header, PowAlgo::Sha256d, bits, params, range))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (range, nonce) in found {
            let nonce = nonce.unwrap();
            assert!(range.contains(nonce));
            let mut header = template;
            header.nonce = nonce;
            assert!(check_proof_of_work(&header, PowAlgo::Sha256d, bits, &params));
        }
    }
}
