//! Opened key hierarchy of one store.

use quill_crypto::{AccountKey, DerivationPath, Seed};
use quill_types::{Address, PublicKey, Signature};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::error::KeyStoreError;

/// A key derived from a store's seed. Lives only as long as the call that
/// asked for it; the secret zeroizes on drop.
#[derive(Debug)]
pub struct DerivedKey {
    pub path: DerivationPath,
    /// Set when `path` is an account index path.
    pub index: Option<u32>,
    pub key: AccountKey,
}

impl DerivedKey {
    pub fn address(&self) -> &Address {
        self.key.address()
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Hex of the secret key, for explicit export calls only.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        self.key.secret_hex()
    }
}

/// The decrypted seed of a store, ready for derivation and signing.
///
/// Clones share the seed. The seed is wiped once the last clone is dropped.
#[derive(Clone)]
pub struct KeyRing {
    seed: Arc<Seed>,
    primary: Address,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

impl KeyRing {
    /// Most addresses a single [`KeyRing::list_addresses`] call derives.
    pub const MAX_LIST_RANGE: u32 = 1000;

    /// Build a ring from a seed. The primary address is the index-0 address.
    pub fn from_seed(seed: Seed) -> Result<Self, KeyStoreError> {
        let primary = address_at(&seed, 0)?;
        Ok(Self {
            seed: Arc::new(seed),
            primary,
        })
    }

    pub fn primary_address(&self) -> &Address {
        &self.primary
    }

    pub fn derive_at_index(&self, index: u32) -> Result<DerivedKey, KeyStoreError> {
        let path = quill_crypto::index_path(index)?;
        self.derive_at_path(&path)
    }

    pub fn derive_at_path(&self, path: &DerivationPath) -> Result<DerivedKey, KeyStoreError> {
        Ok(DerivedKey {
            path: path.clone(),
            index: path.account_index(),
            key: quill_crypto::key_at_path(&self.seed[..], path)?,
        })
    }

    pub fn address_at(&self, index: u32) -> Result<Address, KeyStoreError> {
        address_at(&self.seed, index)
    }

    /// Addresses for indices `from..to`, at most
    /// [`KeyRing::MAX_LIST_RANGE`] of them.
    pub fn list_addresses(&self, from: u32, to: u32) -> Result<Vec<Address>, KeyStoreError> {
        check_range(from, to)?;
        (from..to).map(|i| self.address_at(i)).collect()
    }

    /// Scan indices `0..window` for `address`.
    pub fn find_address(
        &self,
        address: &Address,
        window: u32,
    ) -> Result<Option<u32>, KeyStoreError> {
        for index in 0..window {
            if self.address_at(index)? == *address {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Sign `message` with the key at `index`.
    pub fn sign(
        &self,
        index: u32,
        message: &[u8],
    ) -> Result<(Signature, PublicKey), KeyStoreError> {
        let key = quill_crypto::key_at_index(&self.seed[..], index)?;
        Ok((key.sign(message), key.public_key()))
    }
}

/// `from..to` must be ordered and no wider than [`KeyRing::MAX_LIST_RANGE`].
pub(crate) fn check_range(from: u32, to: u32) -> Result<(), KeyStoreError> {
    if from > to || to - from > KeyRing::MAX_LIST_RANGE {
        return Err(KeyStoreError::InvalidRange { from, to });
    }
    Ok(())
}

fn address_at(seed: &Seed, index: u32) -> Result<Address, KeyStoreError> {
    Ok(quill_crypto::key_at_index(&seed[..], index)?.address().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn ring(fill: u8) -> KeyRing {
        KeyRing::from_seed(Zeroizing::new([fill; 64])).unwrap()
    }

    #[test]
    fn primary_is_index_zero() {
        let r = ring(1);
        assert_eq!(r.primary_address(), &r.address_at(0).unwrap());
        assert_eq!(r.derive_at_index(0).unwrap().address(), r.primary_address());
    }

    #[test]
    fn derived_key_reports_index() {
        let r = ring(1);
        let k = r.derive_at_index(5).unwrap();
        assert_eq!(k.index, Some(5));
        assert_eq!(k.path.to_string(), "m/44'/6060'/5'");

        let deep = r.derive_at_path(&"m/44'/6060'/5'/0'".parse().unwrap()).unwrap();
        assert_eq!(deep.index, None);
        assert_ne!(deep.address(), k.address());
    }

    #[test]
    fn list_is_half_open() {
        let r = ring(2);
        let listed = r.list_addresses(2, 5).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0], r.address_at(2).unwrap());
        assert!(r.list_addresses(3, 3).unwrap().is_empty());
        assert!(matches!(
            r.list_addresses(4, 3),
            Err(KeyStoreError::InvalidRange { from: 4, to: 3 })
        ));
    }

    #[test]
    fn list_width_is_capped() {
        let r = ring(2);
        assert!(matches!(
            r.list_addresses(0, u32::MAX),
            Err(KeyStoreError::InvalidRange { from: 0, to: u32::MAX })
        ));
        let wide = KeyRing::MAX_LIST_RANGE + 1;
        assert!(r.list_addresses(5, 5 + wide).is_err());
        assert!(check_range(5, 5 + KeyRing::MAX_LIST_RANGE).is_ok());
    }

    #[test]
    fn find_within_window_only() {
        let r = ring(3);
        let target = r.address_at(7).unwrap();
        assert_eq!(r.find_address(&target, 10).unwrap(), Some(7));
        assert_eq!(r.find_address(&target, 7).unwrap(), None);
        assert_eq!(ring(4).find_address(&target, 10).unwrap(), None);
    }

    #[test]
    fn signature_verifies_under_returned_key() {
        let r = ring(5);
        let (sig, public) = r.sign(3, b"payload").unwrap();
        assert!(quill_crypto::verify(&public, b"payload", &sig));
        assert_eq!(Address::from_public_key(&public), r.address_at(3).unwrap());
    }

    #[test]
    fn debug_does_not_print_seed() {
        let r = ring(0xab);
        let rendered = format!("{:?}", r);
        assert!(rendered.contains(r.primary_address().as_str()));
        assert!(!rendered.contains("seed"));
    }
}
