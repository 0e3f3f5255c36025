//! SLIP-0010 hierarchical derivation of Ed25519 keys.
//!
//! Master key: `I = HMAC-SHA512(key = "ed25519 seed", data = seed)`, split into
//! the 32-byte secret `k` and chain code `c`. Each child step computes
//! `HMAC-SHA512(key = c, data = 0x00 || k || index')`. Ed25519 only has
//! hardened children, so every path component must be hardened.
//!
//! Account keys live at `m/44'/6060'/{index}'`.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::account_key::AccountKey;

type HmacSha512 = Hmac<Sha512>;

/// SLIP-0044 coin type used for Quill account keys.
pub const COIN_TYPE: u32 = 6060;

/// BIP44 purpose component.
const PURPOSE: u32 = 44;

const HARDENED: u32 = 0x8000_0000;

const MASTER_KEY: &[u8] = b"ed25519 seed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("invalid derivation path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("derivation index {0} out of range")]
    IndexOutOfRange(u32),

    #[error("hmac failure: {0}")]
    Hmac(String),
}

/// A fully hardened derivation path, e.g. `m/44'/6060'/0'`.
///
/// Components are stored without the hardened bit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(components: Vec<u32>) -> Result<Self, DerivationError> {
        if let Some(&bad) = components.iter().find(|&&c| c >= HARDENED) {
            return Err(DerivationError::IndexOutOfRange(bad));
        }
        Ok(Self(components))
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// The last component when the path has the account-index shape
    /// `m/44'/6060'/{i}'`.
    pub fn account_index(&self) -> Option<u32> {
        match self.0.as_slice() {
            [PURPOSE, COIN_TYPE, index] => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for c in &self.0 {
            write!(f, "/{}'", c)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DerivationError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(invalid("must start with m"));
        }

        let mut components = Vec::new();
        for part in parts {
            let digits = part
                .strip_suffix('\'')
                .or_else(|| part.strip_suffix('h'))
                .or_else(|| part.strip_suffix('H'))
                .ok_or_else(|| invalid("ed25519 supports hardened components only"))?;
            let value: u32 = digits.parse().map_err(|_| invalid("component is not a number"))?;
            if value >= HARDENED {
                return Err(invalid("component out of range"));
            }
            components.push(value);
        }
        Ok(Self(components))
    }
}

/// The account path for a derivation index: `m/44'/6060'/{index}'`.
pub fn index_path(index: u32) -> Result<DerivationPath, DerivationError> {
    DerivationPath::new(vec![PURPOSE, COIN_TYPE, index])
}

/// Walk `path` from `seed` and return the 32-byte Ed25519 secret.
pub fn derive_key(
    seed: &[u8],
    path: &DerivationPath,
) -> Result<Zeroizing<[u8; 32]>, DerivationError> {
    let (mut key, mut chain) = split(hmac_sha512(MASTER_KEY, &[seed])?);

    for &component in path.components() {
        let index = (component | HARDENED).to_be_bytes();
        (key, chain) = split(hmac_sha512(chain.as_ref(), &[&[0x00], key.as_ref(), &index])?);
    }

    Ok(key)
}

/// The account key at `path`.
pub fn key_at_path(seed: &[u8], path: &DerivationPath) -> Result<AccountKey, DerivationError> {
    Ok(AccountKey::from_secret(&*derive_key(seed, path)?))
}

/// The account key at `m/44'/6060'/{index}'`.
pub fn key_at_index(seed: &[u8], index: u32) -> Result<AccountKey, DerivationError> {
    key_at_path(seed, &index_path(index)?)
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; 64]>, DerivationError> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| DerivationError::Hmac(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split(i: Zeroizing<[u8; 64]>) -> (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>) {
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&i[..32]);
    chain.copy_from_slice(&i[32..]);
    (key, chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    // SLIP-0010 test vector 1 (ed25519).
    const VECTOR_SEED: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];

    #[test]
    fn slip10_vector_master() {
        let key = derive_key(&VECTOR_SEED, &"m".parse().unwrap()).unwrap();
        assert_eq!(&key[..4], &[0x2b, 0x4b, 0xe7, 0xf1]);
    }

    #[test]
    fn slip10_vector_first_child() {
        let key = derive_key(&VECTOR_SEED, &"m/0'".parse().unwrap()).unwrap();
        assert_eq!(&key[..4], &[0x68, 0xe0, 0xfe, 0x46]);
    }

    #[test]
    fn path_parse_and_display() {
        let path: DerivationPath = "m/44'/6060'/7'".parse().unwrap();
        assert_eq!(path.components(), &[44, 6060, 7]);
        assert_eq!(path.to_string(), "m/44'/6060'/7'");
        assert_eq!(path.account_index(), Some(7));

        let h: DerivationPath = "m/44h/6060H/7'".parse().unwrap();
        assert_eq!(h, path);
    }

    #[test]
    fn path_rejects_soft_and_garbage() {
        assert!("m/44'/6060'/0".parse::<DerivationPath>().is_err());
        assert!("44'/6060'".parse::<DerivationPath>().is_err());
        assert!("m/x'".parse::<DerivationPath>().is_err());
        assert!("m/2147483648'".parse::<DerivationPath>().is_err());
        assert!("m//1'".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn non_account_path_has_no_index() {
        let path: DerivationPath = "m/44'/6060'/0'/1'".parse().unwrap();
        assert_eq!(path.account_index(), None);
    }

    #[test]
    fn index_path_matches_parsed() {
        assert_eq!(index_path(3).unwrap(), "m/44'/6060'/3'".parse().unwrap());
        assert!(index_path(HARDENED).is_err());
    }

    #[test]
    fn key_at_index_is_deterministic_and_distinct() {
        let seed = [5u8; 64];
        let a = key_at_index(&seed, 0).unwrap();
        let b = key_at_index(&seed, 0).unwrap();
        let c = key_at_index(&seed, 1).unwrap();
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
    }

    #[test]
    fn index_and_path_agree() {
        let seed = [9u8; 64];
        let by_index = key_at_index(&seed, 4).unwrap();
        let by_path = key_at_path(&seed, &"m/44'/6060'/4'".parse().unwrap()).unwrap();
        assert_eq!(by_index.public_key(), by_path.public_key());
    }
}
