//! The set of key stores known to the wallet.

use quill_keystore::{
    store_file_name, EntropyStore, KdfParams, KeyRing, KeyStore, KeyStoreError, StoreId,
    STORE_FILE_EXTENSION,
};
use quill_types::Address;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use zeroize::Zeroizing;

use crate::config::WalletConfig;
use crate::error::WalletError;

/// Fresh phrases drawn before giving up on finding an unused one.
const NEW_STORE_ATTEMPTS: u32 = 3;

/// Result of creating or recovering a store.
pub struct NewStore {
    pub mnemonic: Zeroizing<String>,
    pub primary_address: Address,
    pub store_id: StoreId,
}

/// Owns every registered [`KeyStore`] and routes per-store and cross-store
/// operations.
///
/// Stores are kept in registration order. Each store serializes its own
/// unlock state; the registry only guards the list itself.
pub struct WalletRegistry {
    data_dir: PathBuf,
    search_window: u32,
    kdf: KdfParams,
    stores: RwLock<Vec<Arc<dyn KeyStore>>>,
}

impl WalletRegistry {
    /// Open the registry over `config.data_dir`, loading every plausible
    /// store file found there. Unreadable files are skipped with a warning.
    pub fn open(config: &WalletConfig) -> Result<Self, WalletError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let registry = Self {
            data_dir: config.data_dir.clone(),
            search_window: config.search_window,
            kdf: config.kdf,
            stores: RwLock::new(Vec::new()),
        };

        for path in scan_store_files(&registry.data_dir)? {
            match EntropyStore::load(&path, registry.search_window) {
                Ok(store) => {
                    registry.insert(Arc::new(store));
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable key store"
                    );
                }
            }
        }

        tracing::info!(
            data_dir = %registry.data_dir.display(),
            stores = registry.read().len(),
            "wallet registry opened"
        );
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn KeyStore>>> {
        self.stores.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn KeyStore>>> {
        self.stores.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn search_window(&self) -> u32 {
        self.search_window
    }

    /// Register a store handle. A handle whose id is already registered is
    /// ignored and the existing id returned.
    pub fn insert(&self, store: Arc<dyn KeyStore>) -> StoreId {
        let id = store.store_id().clone();
        let mut stores = self.write();
        if !stores.iter().any(|s| *s.store_id() == id) {
            stores.push(store);
        }
        id
    }

    /// Register `store`, replacing a handle with the same id in place.
    fn replace(&self, store: Arc<dyn KeyStore>) {
        let mut stores = self.write();
        match stores.iter().position(|s| s.store_id() == store.store_id()) {
            Some(pos) => stores[pos] = store,
            None => stores.push(store),
        }
    }

    /// Snapshot of the registered handles.
    pub fn stores(&self) -> Vec<Arc<dyn KeyStore>> {
        self.read().clone()
    }

    /// Ids of every registered store, in registration order.
    pub fn list_stores(&self) -> Vec<StoreId> {
        self.read().iter().map(|s| s.store_id().clone()).collect()
    }

    /// Ids of the store files currently present in the data directory.
    pub fn list_stores_in_data_dir(&self) -> Result<Vec<StoreId>, WalletError> {
        Ok(scan_store_files(&self.data_dir)?
            .iter()
            .map(|p| StoreId::from_path(p))
            .collect())
    }

    /// Look a store up by its id (file path) or by its primary address.
    pub fn store(&self, selector: &str) -> Result<Arc<dyn KeyStore>, WalletError> {
        self.read()
            .iter()
            .find(|s| s.store_id().as_str() == selector || s.primary_address().as_str() == selector)
            .cloned()
            .ok_or_else(|| WalletError::StoreNotFound(selector.to_string()))
    }

    /// Register the store file at `path`.
    pub fn add_store(&self, path: &Path) -> Result<StoreId, WalletError> {
        if quill_keystore::inspect_store_file(path).is_none() {
            return Err(WalletError::StoreNotFound(path.display().to_string()));
        }
        let store = EntropyStore::load(path, self.search_window)?;
        let id = self.insert(Arc::new(store));
        tracing::info!(store = %id, "key store added");
        Ok(id)
    }

    /// Create a store under a newly generated phrase.
    ///
    /// A phrase whose primary address already has a store is discarded and
    /// another one drawn.
    pub fn new_store(&self, passphrase: &str) -> Result<NewStore, WalletError> {
        for _ in 0..NEW_STORE_ATTEMPTS {
            let phrase = quill_crypto::generate_mnemonic().map_err(KeyStoreError::from)?;
            let seed = quill_crypto::seed_from_mnemonic(&phrase).map_err(KeyStoreError::from)?;
            let primary = KeyRing::from_seed(seed)?.primary_address().clone();

            let taken = self.data_dir.join(store_file_name(&primary)).exists()
                || self.read().iter().any(|s| *s.primary_address() == primary);
            if taken {
                tracing::warn!(
                    primary = %primary,
                    "generated phrase already in use, drawing again"
                );
                continue;
            }

            return self.recover_store(&phrase, passphrase);
        }
        Err(WalletError::PhraseExhausted(NEW_STORE_ATTEMPTS))
    }

    /// Write (or rewrite) the store of an existing phrase under `passphrase`
    /// and register it. Recovering the same phrase again yields the same id.
    pub fn recover_store(&self, phrase: &str, passphrase: &str) -> Result<NewStore, WalletError> {
        let store = EntropyStore::recover(
            &self.data_dir,
            phrase,
            passphrase,
            &self.kdf,
            self.search_window,
        )?;
        let result = NewStore {
            mnemonic: Zeroizing::new(phrase.to_string()),
            primary_address: store.primary_address().clone(),
            store_id: store.store_id().clone(),
        };
        self.replace(Arc::new(store));
        Ok(result)
    }

    /// True iff some registered, unlocked store controls `address`.
    pub fn global_unlock_check(&self, address: &Address) -> bool {
        self.stores().iter().any(|s| s.is_addr_unlocked(address))
    }

    /// Drop every store's cached derivations. Unlock state is kept.
    pub fn refresh_cache(&self) {
        for store in self.stores() {
            store.invalidate_cache();
        }
    }

    pub fn unlock(&self, selector: &str, passphrase: &str) -> Result<(), WalletError> {
        Ok(self.store(selector)?.unlock(passphrase)?)
    }

    pub fn lock(&self, selector: &str) -> Result<(), WalletError> {
        self.store(selector)?.lock();
        Ok(())
    }

    pub fn extract_mnemonic(
        &self,
        selector: &str,
        passphrase: &str,
    ) -> Result<Zeroizing<String>, WalletError> {
        Ok(self.store(selector)?.extract_mnemonic(passphrase)?)
    }

    /// Primary address recorded in the file at `path`, if it looks like a
    /// store file.
    pub fn inspect_store_file(path: &Path) -> Option<Address> {
        quill_keystore::inspect_store_file(path)
    }
}

/// Plausible store files in `dir`, sorted by path.
fn scan_store_files(dir: &Path) -> Result<Vec<PathBuf>, WalletError> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path.extension().and_then(|e| e.to_str()) == Some(STORE_FILE_EXTENSION);
        if path.is_file() && is_json && quill_keystore::inspect_store_file(&path).is_some() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
