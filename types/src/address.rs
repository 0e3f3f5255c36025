//! Account addresses.
//!
//! An address is `quil_` followed by 60 base32 characters: 52 for the
//! account's Ed25519 public key (left-padded with four zero bits) and 8 for a
//! 5-byte checksum, the head of Blake2b-256 over the key.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::keys::PublicKey;

/// Nano-style alphabet, without 0, 2, l and v.
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const KEY_CHARS: usize = 52;
const CHECKSUM_LEN: usize = 5;

/// A Quill account address.
///
/// [`Address::parse`] and deserialization check the shape only (prefix,
/// length, alphabet). [`Address::parse_checked`] and [`Address::public_key`]
/// also verify the checksum.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const PREFIX: &'static str = "quil_";

    /// Prefix plus 52 key characters plus 8 checksum characters.
    pub const LEN: usize = 65;

    /// The address controlled by `key`.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let mut encoded = String::with_capacity(Self::LEN);
        encoded.push_str(Self::PREFIX);
        push_base32(&mut encoded, key.as_bytes());
        push_base32(&mut encoded, &checksum(key.as_bytes()));
        Self(encoded)
    }

    /// Parse an address, checking its shape.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        let Some(body) = s.strip_prefix(Self::PREFIX) else {
            return Err(TypesError::InvalidAddress(s));
        };
        if s.len() != Self::LEN || !body.bytes().all(|c| ALPHABET.contains(&c)) {
            return Err(TypesError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Parse an address and verify its checksum.
    pub fn parse_checked(raw: impl Into<String>) -> Result<Self, TypesError> {
        let address = Self::parse(raw)?;
        if address.public_key().is_none() {
            return Err(TypesError::InvalidAddress(address.0));
        }
        Ok(address)
    }

    /// The public key this address encodes, or `None` when the checksum
    /// does not match.
    pub fn public_key(&self) -> Option<PublicKey> {
        let body = self.0.strip_prefix(Self::PREFIX)?;
        if !body.is_ascii() || body.len() != Self::LEN - Self::PREFIX.len() {
            return None;
        }
        let (key_part, sum_part) = body.as_bytes().split_at(KEY_CHARS);

        let mut key = [0u8; 32];
        decode_base32(key_part, &mut key)?;
        let mut sum = [0u8; CHECKSUM_LEN];
        decode_base32(sum_part, &mut sum)?;

        (sum == checksum(&key)).then_some(PublicKey(key))
    }

    pub fn has_valid_checksum(&self) -> bool {
        self.public_key().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn checksum(key: &[u8; 32]) -> [u8; CHECKSUM_LEN] {
    let digest = Blake2b::<U32>::digest(key);
    let mut sum = [0u8; CHECKSUM_LEN];
    sum.copy_from_slice(&digest[..CHECKSUM_LEN]);
    sum
}

fn bit(bytes: &[u8], i: usize) -> u8 {
    (bytes[i / 8] >> (7 - i % 8)) & 1
}

/// Append `bytes` in base32, zero bits padding the front to a whole
/// number of characters.
fn push_base32(out: &mut String, bytes: &[u8]) {
    let bits = bytes.len() * 8;
    let chars = bits.div_ceil(5);
    let pad = chars * 5 - bits;
    for c in 0..chars {
        let mut symbol = 0usize;
        for i in c * 5..c * 5 + 5 {
            symbol <<= 1;
            if i >= pad {
                symbol |= bit(bytes, i - pad) as usize;
            }
        }
        out.push(ALPHABET[symbol] as char);
    }
}

/// Inverse of [`push_base32`]. Padding bits must be zero.
fn decode_base32(encoded: &[u8], out: &mut [u8]) -> Option<()> {
    let bits = out.len() * 8;
    let pad = (encoded.len() * 5).checked_sub(bits)?;
    out.fill(0);
    for (c, &ch) in encoded.iter().enumerate() {
        let symbol = ALPHABET.iter().position(|&a| a == ch)?;
        for j in 0..5 {
            let i = c * 5 + j;
            let set = ((symbol >> (4 - j)) & 1) as u8;
            if i < pad {
                if set != 0 {
                    return None;
                }
                continue;
            }
            let pos = i - pad;
            out[pos / 8] |= set << (7 - pos % 8);
        }
    }
    Some(())
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}
