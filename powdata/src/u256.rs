//! 256-bit unsigned integers for target and work arithmetic.
//!
//! `bitcoin::pow::Target` is the type targets travel in, but it exposes no
//! arithmetic. These helpers move values between it and `ruint`.

use bitcoin::pow::Target;

pub use ruint::aliases::U256;

/// Widen a target into an integer.
pub fn from_target(target: Target) -> U256 {
    U256::from_le_bytes(target.to_le_bytes())
}

/// Narrow an integer back into a target.
pub fn to_target(value: U256) -> Target {
    Target::from_le_bytes(value.to_le_bytes())
}

/// Interpret a 32-byte hash digest as a little-endian integer.
///
/// This is the convention targets use, so a digest converted this way can be
/// compared against a target directly.
pub fn from_digest(digest: [u8; 32]) -> U256 {
    U256::from_le_bytes(digest)
}
