//! Address lookup across the registered key stores.
//!
//! Lookups without a passphrase only see stores that are already unlocked.
//! Lookups with a passphrase open a store for the duration of the call and
//! leave its unlock state as it was.

use quill_keystore::{KeyRing, KeyStore, KeyStoreError, StoreId};
use quill_types::Address;
use serde::Serialize;
use std::sync::Arc;

use crate::account::Account;
use crate::error::WalletError;
use crate::registry::WalletRegistry;

/// Where an address lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundAddress {
    pub store_id: StoreId,
    pub index: u32,
}

#[derive(Clone)]
pub struct AddressResolver {
    registry: Arc<WalletRegistry>,
}

impl AddressResolver {
    pub fn new(registry: Arc<WalletRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    /// Index of `address` in the unlocked store named by `selector`.
    pub fn find_in_store(
        &self,
        selector: &str,
        address: &Address,
    ) -> Result<FoundAddress, WalletError> {
        let store = self.registry.store(selector)?;
        let index = store.find_address(address)?;
        Ok(FoundAddress {
            store_id: store.store_id().clone(),
            index,
        })
    }

    /// Index of `address` in the store named by `selector`, opened with
    /// `passphrase` for this call only.
    pub fn find_in_store_with_passphrase(
        &self,
        selector: &str,
        passphrase: &str,
        address: &Address,
    ) -> Result<FoundAddress, WalletError> {
        let store = self.registry.store(selector)?;
        let ring = store.open(passphrase)?;
        let index = self.find_in_ring(store.as_ref(), &ring, address)?;
        Ok(FoundAddress {
            store_id: store.store_id().clone(),
            index,
        })
    }

    /// First unlocked store, in registration order, controlling `address`.
    pub fn find_globally(&self, address: &Address) -> Result<FoundAddress, WalletError> {
        self.registry
            .stores()
            .iter()
            .filter(|s| s.is_unlocked())
            .find_map(|s| {
                s.find_address(address).ok().map(|index| FoundAddress {
                    store_id: s.store_id().clone(),
                    index,
                })
            })
            .ok_or_else(|| WalletError::AddressNotFound(address.clone()))
    }

    /// Like [`AddressResolver::find_globally`], but also tries `passphrase`
    /// on every locked store. Stores the passphrase does not open are
    /// skipped.
    #[deprecated(
        note = "tries one passphrase on every store; use find_in_store_with_passphrase"
    )]
    pub fn find_globally_with_passphrase(
        &self,
        address: &Address,
        passphrase: &str,
    ) -> Result<FoundAddress, WalletError> {
        tracing::warn!(address = %address, "deprecated cross-store passphrase search");
        for store in self.registry.stores() {
            let found = if store.is_unlocked() {
                store.find_address(address).ok()
            } else {
                match store.open(passphrase) {
                    Ok(ring) => self.find_in_ring(store.as_ref(), &ring, address).ok(),
                    Err(KeyStoreError::InvalidPassphrase(_)) => None,
                    Err(e) => return Err(e.into()),
                }
            };
            if let Some(index) = found {
                return Ok(FoundAddress {
                    store_id: store.store_id().clone(),
                    index,
                });
            }
        }
        Err(WalletError::AddressNotFound(address.clone()))
    }

    pub fn is_unlocked(&self, selector: &str, address: &Address) -> Result<bool, WalletError> {
        Ok(self.registry.store(selector)?.is_addr_unlocked(address))
    }

    /// Signing capability for `address`, for one call.
    ///
    /// The passphrase is always checked, even when the store holding
    /// `address` is already unlocked. With a selector only the named store is
    /// tried. Without one every registered store is opened with `passphrase`
    /// and searched over the derivation window; stores the passphrase does
    /// not open are skipped. An unlocked store hands out its own handle, a
    /// locked one stays locked and the account carries a transient key ring.
    pub fn resolve_account(
        &self,
        selector: Option<&str>,
        address: &Address,
        passphrase: &str,
    ) -> Result<Account, WalletError> {
        if let Some(selector) = selector {
            let store = self.registry.store(selector)?;
            let ring = store.open(passphrase)?;
            let index = self.find_in_ring(store.as_ref(), &ring, address)?;
            return Ok(account_for(store, ring, address, index));
        }

        let stores = self.registry.stores();
        let mut rejected = Vec::new();
        for store in stores.iter() {
            let ring = match store.open(passphrase) {
                Ok(ring) => ring,
                Err(KeyStoreError::InvalidPassphrase(_)) => {
                    rejected.push(store.store_id().to_string());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let window = self.registry.search_window();
            if let Some(index) = ring.find_address(address, window)? {
                return Ok(account_for(Arc::clone(store), ring, address, index));
            }
        }
        if !stores.is_empty() && rejected.len() == stores.len() {
            return Err(KeyStoreError::InvalidPassphrase(rejected.join(", ")).into());
        }
        Err(WalletError::AddressNotFound(address.clone()))
    }

    /// Signing capability for `address` from an already unlocked store.
    pub fn unlocked_account(&self, address: &Address) -> Result<Account, WalletError> {
        for store in self.registry.stores() {
            if !store.is_unlocked() {
                continue;
            }
            if let Ok(index) = store.find_address(address) {
                return Ok(bound(store, address, index));
            }
        }
        Err(WalletError::AddressNotFound(address.clone()))
    }

    fn find_in_ring(
        &self,
        store: &dyn KeyStore,
        ring: &KeyRing,
        address: &Address,
    ) -> Result<u32, WalletError> {
        let window = self.registry.search_window();
        ring.find_address(address, window)?.ok_or_else(|| {
            KeyStoreError::AddressNotFound {
                store: store.store_id().to_string(),
                address: address.clone(),
                window,
            }
            .into()
        })
    }
}

fn bound(store: Arc<dyn KeyStore>, address: &Address, index: u32) -> Account {
    Account::Bound {
        store,
        address: address.clone(),
        index,
    }
}

fn account_for(
    store: Arc<dyn KeyStore>,
    ring: KeyRing,
    address: &Address,
    index: u32,
) -> Account {
    if store.is_unlocked() {
        return bound(store, address, index);
    }
    tracing::debug!(store = %store.store_id(), index, "opened key store for one call");
    Account::Transient {
        store_id: store.store_id().clone(),
        ring,
        address: address.clone(),
        index,
    }
}
