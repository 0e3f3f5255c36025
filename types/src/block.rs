//! Account blocks and their hashes.
//!
//! Every account owns a chain of blocks linked through `previous`. A block is
//! produced unsigned by the generation executor, closed by the wallet with a
//! signature over [`AccountBlock::compute_hash`], and handed to the pending pool.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::error::TypesError;
use crate::keys::{PublicKey, Signature};
use crate::token::TokenId;

type Blake2b256 = Blake2b<U32>;

/// A 32-byte block hash. Identifies a block in an account's chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a 64-char hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| TypesError::InvalidHash(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl FromStr for BlockHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// The kind of state transition a block records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    /// Transfer (or contract call) from the account to a recipient.
    SendCall,
    /// Receipt of a pending transfer.
    Receive,
}

impl BlockType {
    fn tag(self) -> u8 {
        match self {
            BlockType::SendCall => 2,
            BlockType::Receive => 4,
        }
    }
}

/// A block in an account chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBlock {
    pub block_type: BlockType,

    /// The account this block belongs to.
    pub account: Address,

    /// Hash of the previous block in this account's chain (zero for the first block).
    pub previous: BlockHash,

    /// Position in the account chain, starting at 1.
    pub height: u64,

    /// Snapshot the block was generated against.
    pub snapshot: BlockHash,

    pub to_address: Address,
    pub token: TokenId,
    pub amount: BigUint,
    pub fee: BigUint,

    /// Raw call payload.
    #[serde(default)]
    pub data: Vec<u8>,

    /// Proof-of-work difficulty the nonce satisfies, if any.
    #[serde(default)]
    pub difficulty: Option<BigUint>,

    #[serde(default)]
    pub nonce: Option<u64>,

    /// Filled in when the block is signed.
    #[serde(default)]
    pub public_key: Option<PublicKey>,

    #[serde(default)]
    pub signature: Option<Signature>,

    pub hash: BlockHash,
}

impl AccountBlock {
    /// Compute the canonical hash of this block.
    ///
    /// Covers every field except `public_key`, `signature` and `hash` itself.
    /// Variable-length fields are length-prefixed so that no two blocks share
    /// an encoding.
    pub fn compute_hash(&self) -> BlockHash {
        let mut hasher = Blake2b256::new();
        hasher.update([self.block_type.tag()]);
        hasher.update(self.account.as_str().as_bytes());
        hasher.update(self.previous.as_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.snapshot.as_bytes());
        hasher.update(self.to_address.as_str().as_bytes());
        hasher.update(self.token.as_bytes());
        update_prefixed(&mut hasher, &self.amount.to_bytes_be());
        update_prefixed(&mut hasher, &self.fee.to_bytes_be());
        update_prefixed(&mut hasher, &self.data);
        match &self.difficulty {
            Some(d) => {
                hasher.update([1u8]);
                update_prefixed(&mut hasher, &d.to_bytes_be());
            }
            None => hasher.update([0u8]),
        }
        match self.nonce {
            Some(n) => {
                hasher.update([1u8]);
                hasher.update(n.to_be_bytes());
            }
            None => hasher.update([0u8]),
        }
        let mut output = [0u8; 32];
        output.copy_from_slice(&hasher.finalize());
        BlockHash::new(output)
    }

    /// Whether both the signature and the signing public key are attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some() && self.public_key.is_some()
    }
}

fn update_prefixed(hasher: &mut Blake2b256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(c: char) -> Address {
        Address::parse(format!("quil_{}", c.to_string().repeat(60))).unwrap()
    }

    fn block() -> AccountBlock {
        AccountBlock {
            block_type: BlockType::SendCall,
            account: addr('1'),
            previous: BlockHash::ZERO,
            height: 1,
            snapshot: BlockHash::new([9u8; 32]),
            to_address: addr('3'),
            token: TokenId::NATIVE,
            amount: BigUint::from(10u32),
            fee: BigUint::from(0u32),
            data: vec![],
            difficulty: None,
            nonce: None,
            public_key: None,
            signature: None,
            hash: BlockHash::ZERO,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(block().compute_hash(), block().compute_hash());
    }

    #[test]
    fn hash_ignores_signature_fields() {
        let unsigned = block();
        let mut signed = block();
        signed.public_key = Some(PublicKey([1u8; 32]));
        signed.signature = Some(Signature([2u8; 64]));
        assert_eq!(unsigned.compute_hash(), signed.compute_hash());
        assert!(signed.is_signed());
        assert!(!unsigned.is_signed());
    }

    #[test]
    fn hash_covers_amount_and_previous() {
        let base = block().compute_hash();
        let mut b = block();
        b.amount = BigUint::from(11u32);
        assert_ne!(base, b.compute_hash());
        let mut b = block();
        b.previous = BlockHash::new([1u8; 32]);
        assert_ne!(base, b.compute_hash());
    }

    #[test]
    fn data_and_amount_boundaries_do_not_collide() {
        // Moving a byte from `amount` into `data` must change the hash.
        let mut a = block();
        a.amount = BigUint::from(0x0102u32);
        a.data = vec![];
        let mut b = block();
        b.amount = BigUint::from(0x01u32);
        b.data = vec![0x02];
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn from_hex_accepts_prefix() {
        let h = BlockHash::new([0xab; 32]);
        let s = h.to_string();
        assert_eq!(BlockHash::from_hex(&s).unwrap(), h);
        assert_eq!(BlockHash::from_hex(&format!("0x{s}")).unwrap(), h);
        assert!(BlockHash::from_hex("abcd").is_err());
        assert!(BlockHash::from_hex(&"zz".repeat(32)).is_err());
    }
}
