//! Per-call signing capability.

use quill_keystore::{KeyRing, KeyStore, KeyStoreError, StoreId};
use quill_types::{AccountBlock, Address, PublicKey, Signature};
use std::fmt;
use std::sync::Arc;

/// An address paired with the means to sign for it.
///
/// Built for one operation and dropped when it returns. A `Bound` account
/// signs through its store, so a store locked in the meantime makes signing
/// fail; a `Transient` account owns a key ring opened with the caller's
/// passphrase and never touches the store's unlock state.
pub enum Account {
    Bound {
        store: Arc<dyn KeyStore>,
        address: Address,
        index: u32,
    },
    Transient {
        store_id: StoreId,
        ring: KeyRing,
        address: Address,
        index: u32,
    },
}

impl Account {
    pub fn address(&self) -> &Address {
        match self {
            Account::Bound { address, .. } | Account::Transient { address, .. } => address,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            Account::Bound { index, .. } | Account::Transient { index, .. } => *index,
        }
    }

    pub fn store_id(&self) -> &StoreId {
        match self {
            Account::Bound { store, .. } => store.store_id(),
            Account::Transient { store_id, .. } => store_id,
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<(Signature, PublicKey), KeyStoreError> {
        match self {
            Account::Bound { store, index, .. } => store.sign(*index, message),
            Account::Transient { ring, index, .. } => ring.sign(*index, message),
        }
    }

    /// Sign the canonical hash of `block` and attach signature and key.
    pub fn sign_block(&self, block: &mut AccountBlock) -> Result<(), KeyStoreError> {
        block.hash = block.compute_hash();
        let (signature, public_key) = self.sign(block.hash.as_bytes())?;
        block.signature = Some(signature);
        block.public_key = Some(public_key);
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Account::Bound { .. } => "bound",
            Account::Transient { .. } => "transient",
        };
        f.debug_struct("Account")
            .field("kind", &kind)
            .field("store", self.store_id())
            .field("address", self.address())
            .field("index", &self.index())
            .finish()
    }
}
