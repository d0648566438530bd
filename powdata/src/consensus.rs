//! Per-network consensus parameters and proof-of-work limits.
//!
//! Parameters are plain values handed to every call that needs them. Nothing
//! here is global, so validating against two networks side by side is just a
//! matter of passing two different [`ConsensusParams`].

use bitcoin::pow::Target;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::algo::PowAlgo;
use crate::u256::{self, U256};

/// How much harder the SHA-256d floor is than the Neoscrypt floor on
/// networks that scale it.
pub const SHA256D_LIMIT_DIVISOR: u64 = 1024;

/// Network identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
    /// Local regression testing; trivially easy difficulty.
    Regtest,
}

/// Consensus values this crate consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParams {
    pub network: Network,

    /// Easiest target a Neoscrypt proof may claim.
    pub pow_limit_neoscrypt: Target,

    /// Whether SHA-256d proofs must clear a floor
    /// [`SHA256D_LIMIT_DIVISOR`] times harder than Neoscrypt. When unset
    /// both algorithms share `pow_limit_neoscrypt`.
    pub scale_sha256d_limit: bool,
}

impl ConsensusParams {
    pub fn main() -> Self {
        Self {
            network: Network::Main,
            pow_limit_neoscrypt: u256::to_target(U256::MAX >> 20_usize),
            scale_sha256d_limit: true,
        }
    }

    pub fn test() -> Self {
        Self {
            network: Network::Test,
            ..Self::main()
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            pow_limit_neoscrypt: u256::to_target(U256::MAX >> 1_usize),
            scale_sha256d_limit: false,
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Loosest target permitted for `algo` on this network.
    ///
    /// Validation calls this same function, so a limit reported to callers
    /// is always the limit enforced.
    pub fn pow_limit(&self, algo: PowAlgo) -> Target {
        match algo {
            PowAlgo::Neoscrypt => self.pow_limit_neoscrypt,
            PowAlgo::Sha256d if self.scale_sha256d_limit => {
                let limit = u256::from_target(self.pow_limit_neoscrypt);
                u256::to_target(limit / U256::from(SHA256D_LIMIT_DIVISOR))
            }
            PowAlgo::Sha256d => self.pow_limit_neoscrypt,
        }
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::main()
    }
}
