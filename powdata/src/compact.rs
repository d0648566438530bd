//! Compact ("nBits") difficulty encoding.
//!
//! A 256-bit target packed into 32 bits:
//!
//! ```text
//!  31      24 23 22                     0
//! +----------+--+------------------------+
//! | exponent | s|        mantissa        |
//! +----------+--+------------------------+
//!
//! target = mantissa * 256^(exponent - 3)
//! ```
//!
//! `bitcoin::pow::Target::from_compact` silently maps bad encodings to some
//! value. Consensus code needs to know when an encoding is bad, so decoding
//! here reports negative and overflowing encodings as errors.

use bitcoin::pow::{CompactTarget, Target};
use thiserror::Error;

use crate::u256::{self, U256};

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Reasons a compact target is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompactError {
    #[error("negative target in compact bits {0:#010x}")]
    Negative(u32),

    #[error("target in compact bits {0:#010x} overflows 256 bits")]
    Overflow(u32),

    /// Decodes fine but no hash can meet it, so it carries no work.
    #[error("zero target in compact bits {0:#010x}")]
    Zero(u32),
}

/// Decode compact bits to a full target.
pub fn decode(bits: CompactTarget) -> Result<Target, CompactError> {
    let raw = bits.to_consensus();
    let exponent = raw >> 24;
    let mantissa = raw & MANTISSA_MASK;

    if mantissa == 0 {
        return Ok(Target::ZERO);
    }
    if raw & SIGN_BIT != 0 {
        return Err(CompactError::Negative(raw));
    }
    if exponent > 34
        || (mantissa > 0xff && exponent > 33)
        || (mantissa > 0xffff && exponent > 32)
    {
        return Err(CompactError::Overflow(raw));
    }

    let value = if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent - 3)) as usize
    };
    Ok(u256::to_target(value))
}

/// Encode a target in its canonical compact form.
///
/// Precision beyond the top three significant bytes is dropped, so this is
/// only an inverse of [`decode`] for targets that came from compact bits.
pub fn encode(target: Target) -> CompactTarget {
    target.to_compact_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn decode_u256(bits: u32) -> Result<U256, CompactError> {
        decode(CompactTarget::from_consensus(bits)).map(u256::from_target)
    }

    #[test]
    fn decodes_regtest_bits() {
        // 0x7fffff * 256^29
        let expected = U256::from(0x7f_ffff_u64) << 232_usize;
        assert_eq!(decode_u256(0x207f_ffff).unwrap(), expected);
    }

    #[test]
    fn decodes_mainnet_bits() {
        // 0x0ffff0 * 256^27
        let expected = U256::from(0x0f_fff0_u64) << 216_usize;
        assert_eq!(decode_u256(0x1e0f_fff0).unwrap(), expected);
    }

    #[test_case(0x0100_3456, 0x00; "exponent_1")]
    #[test_case(0x0212_3456, 0x1234; "exponent_2")]
    #[test_case(0x0312_3456, 0x12_3456; "exponent_3")]
    #[test_case(0x0412_3456, 0x1234_5600; "exponent_4")]
    fn decodes_small_exponents(bits: u32, expected: u64) {
        assert_eq!(decode_u256(bits).unwrap(), U256::from(expected));
    }

    #[test_case(0x0000_0000; "all_zero")]
    #[test_case(0x2000_0000; "zero_mantissa")]
    #[test_case(0xff00_0000; "zero_mantissa_huge_exponent")]
    #[test_case(0x0180_0000; "sign_bit_without_mantissa")]
    fn zero_mantissa_is_zero_target(bits: u32) {
        assert_eq!(decode_u256(bits).unwrap(), U256::ZERO);
    }

    #[test_case(0x0480_0001; "small")]
    #[test_case(0x20ff_ffff; "large")]
    fn rejects_negative(bits: u32) {
        assert_eq!(decode_u256(bits), Err(CompactError::Negative(bits)));
    }

    #[test_case(0x2301_0000; "exponent_35")]
    #[test_case(0x2201_0000; "wide_mantissa_exponent_34")]
    #[test_case(0x2101_ffff; "wide_mantissa_exponent_33")]
    #[test_case(0x7856_3412; "serialized_test_vector")]
    fn rejects_overflow(bits: u32) {
        assert_eq!(decode_u256(bits), Err(CompactError::Overflow(bits)));
    }

    #[test]
    fn largest_non_overflowing() {
        // One byte of mantissa may sit at exponent 34 (top byte of 256 bits)
        let value = decode_u256(0x2200_00ff).unwrap();
        assert_eq!(value, U256::from(0xff_u64) << 248_usize);
    }

    #[test_case(0x207f_ffff)]
    #[test_case(0x1e0f_fff0)]
    #[test_case(0x1d00_ffff)]
    #[test_case(0x1b04_04cb)]
    fn encode_inverts_decode(bits: u32) {
        let target = decode(CompactTarget::from_consensus(bits)).unwrap();
        assert_eq!(encode(target).to_consensus(), bits);
    }
}
