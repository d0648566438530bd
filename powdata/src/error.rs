//! Error types for proof-of-work data handling.
//!
//! Only caller mistakes surface as errors: bad algorithm names, asking for a
//! record-level check before committing a header, or bytes that do not
//! decode. A proof that simply fails to validate is reported as `false` by
//! the validation functions, never as an error.

use thiserror::Error;

use crate::compact::CompactError;

/// Errors raised by the proof-of-work API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Unknown or empty algorithm name, or an algorithm that was never set.
    #[error("invalid PowAlgo: {0:?}")]
    InvalidAlgorithm(String),

    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] DecodeError),

    /// The record has no auxiliary header yet.
    #[error("auxiliary header has not been committed")]
    UncommittedHeader,
}

/// Reasons a byte sequence or compact value failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown algorithm index {0:#04x}")]
    UnknownAlgorithm(u8),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid difficulty bits: {0}")]
    Bits(#[from] CompactError),

    #[error("auxiliary header: {0}")]
    Header(String),
}

impl From<CompactError> for PowError {
    fn from(err: CompactError) -> Self {
        Self::MalformedEncoding(DecodeError::Bits(err))
    }
}
