//! Chain work contributed by a block.
//!
//! The proof of a block is the expected number of hashes needed to meet its
//! target, `2^256 / (target + 1)`, scaled by the algorithm's
//! [work factor](PowAlgo::work_factor). Chain selection sums these.

use bitcoin::pow::CompactTarget;

use crate::algo::PowAlgo;
use crate::compact::{self, CompactError};
use crate::u256::{self, U256};

/// Work a block mined with `algo` at `bits` adds to its chain.
///
/// Malformed bits and zero targets contribute nothing and are errors.
pub fn block_proof(algo: PowAlgo, bits: CompactTarget) -> Result<U256, CompactError> {
    let target = u256::from_target(compact::decode(bits)?);
    if target == U256::ZERO {
        return Err(CompactError::Zero(bits.to_consensus()));
    }

    // 2^256 / (target + 1) without a 257-bit intermediate
    let proof = (!target / (target + U256::from(1_u64))) + U256::from(1_u64);
    Ok(proof.saturating_mul(U256::from(algo.work_factor())))
}
