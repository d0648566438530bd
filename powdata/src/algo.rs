//! The closed set of proof-of-work algorithms.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::PowError;

/// A hash algorithm a block may be mined with.
///
/// The canonical names (`"sha256d"`, `"neoscrypt"`) are what RPC callers and
/// configuration use; [`index`](Self::index) is the number written on the
/// wire. Neither mapping may ever change, since every node must agree on
/// them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PowAlgo {
    /// Double SHA-256, normally merge-mined alongside another chain.
    Sha256d,

    /// Neoscrypt, mined standalone.
    Neoscrypt,
}

impl PowAlgo {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Parse a canonical name. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Result<Self, PowError> {
        name.parse()
            .map_err(|_| PowError::InvalidAlgorithm(name.to_owned()))
    }

    /// Protocol number of this algorithm in the serialized algorithm byte.
    pub fn index(self) -> u8 {
        match self {
            PowAlgo::Sha256d => 0x01,
            PowAlgo::Neoscrypt => 0x02,
        }
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0x01 => Some(PowAlgo::Sha256d),
            0x02 => Some(PowAlgo::Neoscrypt),
            _ => None,
        }
    }

    /// Multiplier applied to a block's proof when summing chain work.
    ///
    /// Neoscrypt blocks are mined without merge mining and so are weighted
    /// to match the 1024x harder consensus floor SHA-256d proofs must clear.
    pub fn work_factor(self) -> u64 {
        match self {
            PowAlgo::Sha256d => 1,
            PowAlgo::Neoscrypt => 1024,
        }
    }
}

/// Canonical name of a possibly unset algorithm.
///
/// An unset algorithm (`None`) has no name and is an error.
pub fn canonical_name(algo: Option<PowAlgo>) -> Result<&'static str, PowError> {
    algo.map(PowAlgo::name)
        .ok_or_else(|| PowError::InvalidAlgorithm("<unset>".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    #[test_case(PowAlgo::Sha256d, "sha256d")]
    #[test_case(PowAlgo::Neoscrypt, "neoscrypt")]
    fn to_name(algo: PowAlgo, name: &str) {
        assert_eq!(algo.name(), name);
        assert_eq!(algo.to_string(), name);
        assert_eq!(canonical_name(Some(algo)).unwrap(), name);
    }

    #[test]
    fn unset_has_no_name() {
        assert!(matches!(
            canonical_name(None),
            Err(PowError::InvalidAlgorithm(_))
        ));
    }

    #[test]
    fn name_round_trip() {
        for algo in PowAlgo::iter() {
            assert_eq!(PowAlgo::from_name(algo.name()).unwrap(), algo);
        }
    }

    #[test_case(""; "empty")]
    #[test_case("foo"; "unknown")]
    #[test_case("SHA256D"; "wrong_case")]
    #[test_case("neo"; "prefix")]
    #[test_case(" sha256d"; "whitespace")]
    fn from_bad_name(name: &str) {
        assert_eq!(
            PowAlgo::from_name(name),
            Err(PowError::InvalidAlgorithm(name.to_owned()))
        );
    }

    #[test]
    fn index_round_trip() {
        for algo in PowAlgo::iter() {
            assert_eq!(PowAlgo::from_index(algo.index()), Some(algo));
        }
        assert_eq!(PowAlgo::from_index(0x00), None);
        assert_eq!(PowAlgo::from_index(0x03), None);
        assert_eq!(PowAlgo::from_index(0x7f), None);
    }

    #[test]
    fn neoscrypt_outweighs_sha256d() {
        assert_eq!(PowAlgo::Sha256d.work_factor(), 1);
        assert_eq!(PowAlgo::Neoscrypt.work_factor(), 1024);
    }
}
