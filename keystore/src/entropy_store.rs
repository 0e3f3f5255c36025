//! File-backed key store rooted in a BIP39 mnemonic.

use quill_types::Address;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::Zeroizing;

use crate::error::KeyStoreError;
use crate::file::{self, KdfParams, StoreFile};
use crate::key_ring::KeyRing;
use crate::store::{KeyStore, StoreId};

/// A key store backed by an encrypted `<primary address>.json` file.
///
/// The unlocked seed and the address→index cache are held in memory behind
/// their own mutexes. Locking wipes both.
pub struct EntropyStore {
    id: StoreId,
    file: StoreFile,
    search_window: u32,
    unlocked: Mutex<Option<KeyRing>>,
    index_cache: Mutex<HashMap<Address, u32>>,
}

impl EntropyStore {
    /// Load an existing store file. The store starts locked.
    pub fn load(path: &Path, search_window: u32) -> Result<Self, KeyStoreError> {
        let file = file::load_store_file(path)?;
        if !file.primary_address.has_valid_checksum() {
            return Err(KeyStoreError::Format(format!(
                "bad primary address checksum in {}",
                path.display()
            )));
        }
        Ok(Self::with_file(StoreId::from_path(path), file, search_window))
    }

    /// Generate a fresh phrase and write its store into `dir`.
    ///
    /// Returns the store together with the phrase; the phrase is not kept
    /// anywhere else.
    pub fn create(
        dir: &Path,
        passphrase: &str,
        kdf_params: &KdfParams,
        search_window: u32,
    ) -> Result<(Self, Zeroizing<String>), KeyStoreError> {
        let phrase = quill_crypto::generate_mnemonic()?;
        let store = Self::recover(dir, &phrase, passphrase, kdf_params, search_window)?;
        Ok((store, phrase))
    }

    /// Write the store for an existing phrase into `dir`, encrypted under
    /// `passphrase`. Recovering the same phrase again rewrites the same file.
    pub fn recover(
        dir: &Path,
        phrase: &str,
        passphrase: &str,
        kdf_params: &KdfParams,
        search_window: u32,
    ) -> Result<Self, KeyStoreError> {
        let entropy = quill_crypto::entropy_from_mnemonic(phrase)?;
        let ring = KeyRing::from_seed(quill_crypto::seed_from_mnemonic(phrase)?)?;
        let primary = ring.primary_address().clone();

        let file = file::encrypt_entropy(&entropy, &primary, passphrase, kdf_params)?;
        let path: PathBuf = dir.join(file::store_file_name(&primary));
        file::save_store_file(&file, &path)?;

        tracing::info!(store = %path.display(), primary = %primary, "key store written");
        Ok(Self::with_file(StoreId::from_path(&path), file, search_window))
    }

    fn with_file(id: StoreId, file: StoreFile, search_window: u32) -> Self {
        Self {
            id,
            file,
            search_window,
            unlocked: Mutex::new(None),
            index_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.id.to_path_buf()
    }

    pub fn search_window(&self) -> u32 {
        self.search_window
    }

    fn unlocked(&self) -> MutexGuard<'_, Option<KeyRing>> {
        self.unlocked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn index_cache(&self) -> MutexGuard<'_, HashMap<Address, u32>> {
        self.index_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decrypt_phrase(&self, passphrase: &str) -> Result<Zeroizing<String>, KeyStoreError> {
        let entropy = file::decrypt_entropy(&self.file, passphrase)
            .map_err(|e| self.attribute(e))?;
        Ok(quill_crypto::mnemonic_from_entropy(&entropy)?)
    }

    /// Point passphrase failures at this store's id rather than its address.
    fn attribute(&self, e: KeyStoreError) -> KeyStoreError {
        match e {
            KeyStoreError::InvalidPassphrase(_) => {
                KeyStoreError::InvalidPassphrase(self.id.to_string())
            }
            other => other,
        }
    }
}

impl KeyStore for EntropyStore {
    fn store_id(&self) -> &StoreId {
        &self.id
    }

    fn primary_address(&self) -> &Address {
        &self.file.primary_address
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked().is_some()
    }

    fn unlock(&self, passphrase: &str) -> Result<(), KeyStoreError> {
        let ring = self.open(passphrase)?;
        *self.unlocked() = Some(ring);
        tracing::info!(store = %self.id, "key store unlocked");
        Ok(())
    }

    fn lock(&self) {
        let was_unlocked = self.unlocked().take().is_some();
        self.index_cache().clear();
        if was_unlocked {
            tracing::info!(store = %self.id, "key store locked");
        }
    }

    fn open(&self, passphrase: &str) -> Result<KeyRing, KeyStoreError> {
        let phrase = self.decrypt_phrase(passphrase)?;
        let ring = KeyRing::from_seed(quill_crypto::seed_from_mnemonic(&phrase)?)?;
        if ring.primary_address() != self.primary_address() {
            return Err(KeyStoreError::Format(format!(
                "store {} decrypts to a different primary address",
                self.id
            )));
        }
        Ok(ring)
    }

    fn key_ring(&self) -> Result<KeyRing, KeyStoreError> {
        self.unlocked()
            .clone()
            .ok_or_else(|| KeyStoreError::Locked(self.id.to_string()))
    }

    fn find_address(&self, address: &Address) -> Result<u32, KeyStoreError> {
        let ring = self.key_ring()?;
        if let Some(&index) = self.index_cache().get(address) {
            return Ok(index);
        }

        let found = ring.find_address(address, self.search_window)?;
        match found {
            Some(index) => {
                self.index_cache().insert(address.clone(), index);
                Ok(index)
            }
            None => Err(KeyStoreError::AddressNotFound {
                store: self.id.to_string(),
                address: address.clone(),
                window: self.search_window,
            }),
        }
    }

    fn extract_mnemonic(&self, passphrase: &str) -> Result<Zeroizing<String>, KeyStoreError> {
        self.decrypt_phrase(passphrase)
    }

    fn invalidate_cache(&self) {
        self.index_cache().clear();
        tracing::debug!(store = %self.id, "address cache cleared");
    }
}
