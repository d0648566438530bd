//! Canonical wire encoding of [`PowData`].
//!
//! ```text
//! offset  size  field
//!      0     1  algorithm index | merge-mined flag (0x80)
//!      1     4  bits (LE)
//!      5    80  auxiliary header
//! ```
//!
//! Every record has exactly one encoding and every accepted encoding decodes
//! to exactly one record, so re-encoding decoded bytes reproduces them.

use bitcoin::consensus::{deserialize, serialize};
use bitcoin::pow::CompactTarget;
use bitflags::bitflags;

use crate::algo::PowAlgo;
use crate::aux_header::{AUX_HEADER_SIZE, AuxHeader};
use crate::error::{DecodeError, PowError};
use crate::pow::PowData;

/// Serialized size of a [`PowData`] record.
pub const POW_DATA_SIZE: usize = 1 + 4 + AUX_HEADER_SIZE;

bitflags! {
    /// Layout of the leading algorithm byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct AlgoByte: u8 {
        const ALGO_MASK = 0x7f;
        const MERGE_MINED = 0x80;
    }
}

/// Serialize a record.
///
/// The record must have an algorithm and a committed auxiliary header.
pub fn encode(data: &PowData) -> Result<Vec<u8>, PowError> {
    let algo = data
        .core_algo()
        .ok_or_else(|| PowError::InvalidAlgorithm("<unset>".to_owned()))?;
    let header = data.aux_header()?;

    let mut byte = AlgoByte::from_bits_retain(algo.index());
    byte.set(AlgoByte::MERGE_MINED, data.is_merge_mined());

    let mut out = Vec::with_capacity(POW_DATA_SIZE);
    out.push(byte.bits());
    out.extend_from_slice(&data.bits().to_consensus().to_le_bytes());
    out.extend_from_slice(&serialize(header));
    Ok(out)
}

/// Parse a record from exactly [`POW_DATA_SIZE`] bytes.
///
/// The bits are carried as-is; whether they decode to a sensible target is
/// a validation question, not a parsing one.
pub fn decode(bytes: &[u8]) -> Result<PowData, PowError> {
    if bytes.len() != POW_DATA_SIZE {
        return Err(DecodeError::Length {
            expected: POW_DATA_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let byte = AlgoByte::from_bits_retain(bytes[0]);
    let index = (byte & AlgoByte::ALGO_MASK).bits();
    let algo = PowAlgo::from_index(index).ok_or(DecodeError::UnknownAlgorithm(index))?;

    let bits = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let header: AuxHeader = deserialize(&bytes[5..])
        .map_err(|e| DecodeError::Header(e.to_string()))?;

    let mut data = PowData::new();
    data.set_core_algo(algo);
    data.set_bits(CompactTarget::from_consensus(bits));
    data.set_merge_mined(byte.contains(AlgoByte::MERGE_MINED));
    data.adopt(header);
    Ok(data)
}
