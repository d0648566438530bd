//! Proof-of-work data for a chain mined with more than one hash algorithm.
//!
//! A block's proof of work is not computed over the block header itself.
//! Instead each block carries a [`PowData`] record: the algorithm and
//! difficulty it claims, a merge-mined flag, and a small 80-byte
//! [`AuxHeader`] that commits to the real block hash. Miners grind the aux
//! header's nonce; validators check that the aux header both meets the
//! claimed difficulty and commits to the block it arrived with.

pub mod algo;
pub mod aux_header;
pub mod codec;
pub mod compact;
pub mod consensus;
pub mod error;
pub mod json;
pub mod mining;
pub mod neoscrypt;
pub mod pow;
pub mod tracing;
pub mod u256;
pub mod work;

pub use algo::PowAlgo;
pub use aux_header::AuxHeader;
pub use consensus::{ConsensusParams, Network};
pub use error::{DecodeError, PowError};
pub use pow::{AuxSlot, PowData, TargetError, check_proof_of_work, required_target};
