//! Proof-of-work records and their validation.
//!
//! # Lifecycle
//!
//! ```text
//!   new()          set_core_algo/set_bits        commit() / adopt()
//!  Empty ───────────────────────► Configured ─────────────────────► Committed
//!                                                                      │  ▲
//!                                                                      └──┘
//!                                                              nonce search
//! ```
//!
//! Whether a record is "solved" is never stored: [`PowData::is_valid`]
//! recomputes it from the current fields every time.

use bitcoin::hash_types::BlockHash;
use bitcoin::pow::{CompactTarget, Target};
use thiserror::Error;

use crate::algo::PowAlgo;
use crate::aux_header::AuxHeader;
use crate::compact::{self, CompactError};
use crate::consensus::ConsensusParams;
use crate::error::PowError;
use crate::tracing::prelude::*;
use crate::u256;

/// Whether a record's auxiliary header has been set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuxSlot {
    #[default]
    Uninitialized,
    Committed(AuxHeader),
}

impl From<Option<AuxHeader>> for AuxSlot {
    fn from(header: Option<AuxHeader>) -> Self {
        header.map_or(AuxSlot::Uninitialized, AuxSlot::Committed)
    }
}

/// Reasons no proof can ever meet a claimed difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error(transparent)]
    Compact(#[from] CompactError),

    #[error("bits {bits:#010x} are easier than the {algo} limit")]
    AboveLimit { algo: PowAlgo, bits: u32 },
}

/// Proof-of-work data attached to a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowData {
    /// `None` until the producer picks an algorithm.
    algo: Option<PowAlgo>,
    bits: CompactTarget,
    /// Carried through serialization; does not change validation.
    merge_mined: bool,
    /// `None` until committed or adopted.
    aux: Option<AuxHeader>,
}

impl PowData {
    /// An empty record: no algorithm, zero bits, no auxiliary header.
    pub fn new() -> Self {
        Self {
            algo: None,
            bits: CompactTarget::from_consensus(0),
            merge_mined: false,
            aux: None,
        }
    }

    pub fn core_algo(&self) -> Option<PowAlgo> {
        self.algo
    }

    pub fn set_core_algo(&mut self, algo: PowAlgo) {
        self.algo = Some(algo);
    }

    pub fn bits(&self) -> CompactTarget {
        self.bits
    }

    pub fn set_bits(&mut self, bits: CompactTarget) {
        self.bits = bits;
    }

    pub fn is_merge_mined(&self) -> bool {
        self.merge_mined
    }

    pub fn set_merge_mined(&mut self, merge_mined: bool) {
        self.merge_mined = merge_mined;
    }

    pub fn aux_slot(&self) -> AuxSlot {
        self.aux.into()
    }

    /// The committed auxiliary header.
    pub fn aux_header(&self) -> Result<&AuxHeader, PowError> {
        self.aux.as_ref().ok_or(PowError::UncommittedHeader)
    }

    /// Mutable access to the committed header, e.g. to continue a nonce
    /// search.
    pub fn aux_header_mut(&mut self) -> Result<&mut AuxHeader, PowError> {
        self.aux.as_mut().ok_or(PowError::UncommittedHeader)
    }

    /// Start a fresh auxiliary header bound to `block_hash`.
    ///
    /// Any previous header is replaced. The returned handle is what a miner
    /// iterates the nonce on.
    pub fn commit(&mut self, block_hash: BlockHash, time: u32) -> &mut AuxHeader {
        self.aux.insert(AuxHeader::committing_to(block_hash, time))
    }

    /// Install an externally produced header verbatim.
    ///
    /// The header keeps whatever commitment it already carries; a header
    /// committing to the wrong block will simply fail validation.
    pub fn adopt(&mut self, header: AuxHeader) {
        self.aux = Some(header);
    }

    /// Check this record's own header against its bits.
    ///
    /// Unlike [`is_valid`](Self::is_valid), calling this before a header is
    /// committed or an algorithm is chosen is reported as an error rather
    /// than as a failed proof. The block commitment is not checked.
    pub fn check_committed(&self, params: &ConsensusParams) -> Result<bool, PowError> {
        let algo = self
            .algo
            .ok_or_else(|| PowError::InvalidAlgorithm("<unset>".to_owned()))?;
        let header = self.aux_header()?;
        Ok(check_proof_of_work(header, algo, self.bits, params))
    }

    /// Whether this record is a valid proof of work for the block with hash
    /// `block_hash`.
    ///
    /// Requires a committed header that commits to `block_hash` and meets
    /// the record's bits under its algorithm.
    pub fn is_valid(&self, block_hash: BlockHash, params: &ConsensusParams) -> bool {
        let Some(header) = &self.aux else {
            debug!(%block_hash, "PoW data has no auxiliary header");
            return false;
        };
        let Some(algo) = self.algo else {
            debug!(%block_hash, "PoW data has no algorithm");
            return false;
        };

        if !header.commits_to(block_hash) {
            debug!(
                %block_hash,
                commitment = %header.commitment,
                "Auxiliary header commits to a different block"
            );
            return false;
        }

        if !check_proof_of_work(header, algo, self.bits, params) {
            debug!(%block_hash, %algo, "Auxiliary header fails proof of work");
            return false;
        }

        true
    }
}

impl Default for PowData {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `header` hashed with `algo` meets the target encoded in `bits`.
///
/// Malformed bits, or bits looser than the network allows for `algo`, never
/// match. This is also the body of a mining loop: vary the nonce until it
/// returns true.
pub fn check_proof_of_work(
    header: &AuxHeader,
    algo: PowAlgo,
    bits: CompactTarget,
    params: &ConsensusParams,
) -> bool {
    let target = match required_target(algo, bits, params) {
        Ok(target) => target,
        Err(e) => {
            trace!(error = %e, "Rejecting proof with unusable bits");
            return false;
        }
    };

    header.digest(algo) <= u256::from_target(target)
}

/// The target a proof for `algo` at `bits` must meet.
///
/// Fails for bits that no proof can ever meet on this network: malformed
/// encodings, a zero target, or a target easier than the limit for `algo`.
pub fn required_target(
    algo: PowAlgo,
    bits: CompactTarget,
    params: &ConsensusParams,
) -> Result<Target, TargetError> {
    let target = compact::decode(bits)?;
    if target == Target::ZERO {
        return Err(CompactError::Zero(bits.to_consensus()).into());
    }
    if target > params.pow_limit(algo) {
        return Err(TargetError::AboveLimit {
            algo,
            bits: bits.to_consensus(),
        });
    }
    Ok(target)
}
