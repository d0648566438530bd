//! JSON view of a [`PowData`] record, as shown to RPC clients.

use bitcoin::pow::Target;
use serde::{Deserialize, Serialize};

use crate::algo::PowAlgo;
use crate::compact;
use crate::pow::{AuxSlot, PowData};

/// Serializable summary of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowDataJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algo: Option<PowAlgo>,
    pub mergemined: bool,
    /// Compact bits as eight hex digits.
    pub bits: String,
    /// Difficulty relative to the Bitcoin mainnet limit. Absent when the bits
    /// do not decode to a usable target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    /// Hex of the serialized auxiliary header, once committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fakeheader: Option<String>,
}

impl From<&PowData> for PowDataJson {
    fn from(data: &PowData) -> Self {
        let difficulty = compact::decode(data.bits())
            .ok()
            .filter(|target| *target != Target::ZERO)
            .map(|target| target.difficulty_float());

        let fakeheader = match data.aux_slot() {
            AuxSlot::Uninitialized => None,
            AuxSlot::Committed(header) => Some(hex::encode(header.to_bytes())),
        };

        Self {
            algo: data.core_algo(),
            mergemined: data.is_merge_mined(),
            bits: format!("{:08x}", data.bits().to_consensus()),
            difficulty,
            fakeheader,
        }
    }
}
