//! The key store capability consumed by the wallet core.

use quill_crypto::DerivationPath;
use quill_types::{Address, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::error::KeyStoreError;
use crate::key_ring::{check_range, DerivedKey, KeyRing};

/// Identity of a store: the path of its file, in string form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recovery-phrase-rooted key hierarchy.
///
/// Implementations serialize their own unlock state; callers must act on the
/// result of each call and never on an earlier `is_unlocked` answer.
pub trait KeyStore: Send + Sync {
    fn store_id(&self) -> &StoreId;

    fn primary_address(&self) -> &Address;

    fn is_unlocked(&self) -> bool;

    fn unlock(&self, passphrase: &str) -> Result<(), KeyStoreError>;

    fn lock(&self);

    /// Decrypt the hierarchy for one call without touching the unlock state.
    fn open(&self, passphrase: &str) -> Result<KeyRing, KeyStoreError>;

    /// The hierarchy of an unlocked store, [`KeyStoreError::Locked`] otherwise.
    fn key_ring(&self) -> Result<KeyRing, KeyStoreError>;

    /// Index of `address` within the store's search window. Requires the
    /// store to be unlocked.
    fn find_address(&self, address: &Address) -> Result<u32, KeyStoreError>;

    fn extract_mnemonic(&self, passphrase: &str) -> Result<Zeroizing<String>, KeyStoreError>;

    /// Drop cached derivation results. Unlock state is kept.
    fn invalidate_cache(&self);

    fn derive_at_index(&self, index: u32) -> Result<DerivedKey, KeyStoreError> {
        self.key_ring()?.derive_at_index(index)
    }

    fn derive_at_path(&self, path: &DerivationPath) -> Result<DerivedKey, KeyStoreError> {
        self.key_ring()?.derive_at_path(path)
    }

    /// Addresses for indices `from..to`. The range is checked before the
    /// lock state, and may span at most [`KeyRing::MAX_LIST_RANGE`] indices.
    fn list_addresses(&self, from: u32, to: u32) -> Result<Vec<Address>, KeyStoreError> {
        check_range(from, to)?;
        self.key_ring()?.list_addresses(from, to)
    }

    fn sign(&self, index: u32, message: &[u8]) -> Result<(Signature, PublicKey), KeyStoreError> {
        self.key_ring()?.sign(index, message)
    }

    /// Whether the store is unlocked and controls `address`.
    fn is_addr_unlocked(&self, address: &Address) -> bool {
        self.is_unlocked() && self.find_address(address).is_ok()
    }
}
