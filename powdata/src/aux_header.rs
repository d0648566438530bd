//! The auxiliary header: the 80 bytes proof-of-work is actually computed on.

use bitcoin::consensus::{Decodable, Encodable, encode};
use bitcoin::hash_types::{BlockHash, TxMerkleNode};
use bitcoin::hashes::{Hash, sha256d};
use bitcoin::io::{self, Read, Write};
use bitcoin::pow::CompactTarget;

use crate::algo::PowAlgo;
use crate::neoscrypt::neoscrypt;
use crate::u256::{self, U256};

/// Serialized size of an [`AuxHeader`].
pub const AUX_HEADER_SIZE: usize = 80;

/// Minimal header hashed for proof of work.
///
/// The layout is that of a Bitcoin block header, which lets existing mining
/// hardware and merge-mining parents produce it. It has no real predecessor
/// (`prev_blockhash` is zero) and no difficulty of its own (`bits` is zero);
/// its merkle-root slot instead carries a commitment to the hash of the real
/// block being secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuxHeader {
    pub version: u32,
    pub prev_blockhash: BlockHash,
    /// Commitment to the secured block.
    pub commitment: TxMerkleNode,
    pub time: u32,
    /// Reserved, always zero.
    pub bits: CompactTarget,
    pub nonce: u32,
}

impl AuxHeader {
    /// An all-zero header, committing to the all-zero block hash.
    pub fn null() -> Self {
        Self {
            version: 0,
            prev_blockhash: BlockHash::all_zeros(),
            commitment: TxMerkleNode::all_zeros(),
            time: 0,
            bits: CompactTarget::from_consensus(0),
            nonce: 0,
        }
    }

    /// A fresh header committing to `block_hash`, ready for nonce search.
    pub fn committing_to(block_hash: BlockHash, time: u32) -> Self {
        Self {
            commitment: Self::commitment_for(block_hash),
            time,
            ..Self::null()
        }
    }

    /// The commitment value that binds a header to `block_hash`.
    ///
    /// The hash bytes are embedded unchanged.
    pub fn commitment_for(block_hash: BlockHash) -> TxMerkleNode {
        TxMerkleNode::from_byte_array(block_hash.to_byte_array())
    }

    /// Whether this header commits to `block_hash`.
    pub fn commits_to(&self, block_hash: BlockHash) -> bool {
        self.commitment == Self::commitment_for(block_hash)
    }

    /// Canonical 80-byte serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::serialize(self)
    }

    /// Raw 32-byte output of `algo` over the serialized header.
    pub fn pow_hash(&self, algo: PowAlgo) -> [u8; 32] {
        let bytes = self.to_bytes();
        match algo {
            PowAlgo::Sha256d => sha256d::Hash::hash(&bytes).to_byte_array(),
            PowAlgo::Neoscrypt => neoscrypt(&bytes),
        }
    }

    /// Proof-of-work digest as an integer comparable with targets.
    pub fn digest(&self, algo: PowAlgo) -> U256 {
        u256::from_digest(self.pow_hash(algo))
    }
}

impl Default for AuxHeader {
    fn default() -> Self {
        Self::null()
    }
}

impl Encodable for AuxHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;
        len += self.prev_blockhash.consensus_encode(w)?;
        len += self.commitment.consensus_encode(w)?;
        len += self.time.consensus_encode(w)?;
        len += self.bits.to_consensus().consensus_encode(w)?;
        len += self.nonce.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for AuxHeader {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, encode::Error> {
        Ok(Self {
            version: Decodable::consensus_decode(r)?,
            prev_blockhash: Decodable::consensus_decode(r)?,
            commitment: Decodable::consensus_decode(r)?,
            time: Decodable::consensus_decode(r)?,
            bits: CompactTarget::from_consensus(Decodable::consensus_decode(r)?),
            nonce: Decodable::consensus_decode(r)?,
        })
    }
}
