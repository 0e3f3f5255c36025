//! The wallet surface handed to a presentation layer.
//!
//! Store, lookup and derivation calls fail with [`WalletError`]; transfers
//! and message signing fail with [`TransferError`], which names the stage
//! that failed. Every response serializes with camelCase field names.

use quill_chain::{BlockGenerator, ChainQuery, SubmissionSink};
use quill_crypto::DerivationPath;
use quill_keystore::{DerivedKey, KeyStoreError, StoreId};
use quill_types::{Address, BlockHash};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

use crate::builder::{SignedMessage, TransactionBuilder};
use crate::config::WalletConfig;
use crate::error::{TransferError, WalletError};
use crate::metrics::WalletMetrics;
use crate::policy::RecipientPolicy;
use crate::registry::{NewStore, WalletRegistry};
use crate::request::TransferRequest;
use crate::resolver::{AddressResolver, FoundAddress};
use crate::spans;

/// A created or recovered store. The phrase is wiped on drop.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoreResponse {
    pub mnemonic: String,
    pub primary_addr: Address,
    pub filename: StoreId,
}

impl From<NewStore> for NewStoreResponse {
    fn from(created: NewStore) -> Self {
        Self {
            mnemonic: created.mnemonic.to_string(),
            primary_addr: created.primary_address,
            filename: created.store_id,
        }
    }
}

impl Drop for NewStoreResponse {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}

impl fmt::Debug for NewStoreResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewStoreResponse")
            .field("primary_addr", &self.primary_addr)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindAddrResult {
    pub entropy_store_file: StoreId,
    pub index: u32,
}

impl From<FoundAddress> for FindAddrResult {
    fn from(found: FoundAddress) -> Self {
        Self {
            entropy_store_file: found.store_id,
            index: found.index,
        }
    }
}

/// A derived key as exported to the caller. The private key is wiped on drop.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveResult {
    pub bip44_path: String,
    pub address: Address,
    pub private_key: String,
}

impl From<DerivedKey> for DeriveResult {
    fn from(key: DerivedKey) -> Self {
        Self {
            bip44_path: key.path.to_string(),
            private_key: key.private_key_hex().as_str().to_owned(),
            address: key.address().clone(),
        }
    }
}

impl Drop for DeriveResult {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl fmt::Debug for DeriveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveResult")
            .field("bip44_path", &self.bip44_path)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// A signed message, every field in hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexSignedTuple {
    pub message: String,
    pub signed_data: String,
    pub pubkey: String,
}

impl From<SignedMessage> for HexSignedTuple {
    fn from(signed: SignedMessage) -> Self {
        Self {
            message: hex::encode(signed.message),
            signed_data: signed.signature.to_hex(),
            pubkey: signed.public_key.to_hex(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsMayValidKeystoreFileResponse {
    pub maybe: bool,
    pub may_address: Option<Address>,
}

pub struct WalletApi {
    config: WalletConfig,
    registry: Arc<WalletRegistry>,
    resolver: AddressResolver,
    builder: TransactionBuilder,
}

impl WalletApi {
    /// Open the registry under `config` and wire the pipeline to the given
    /// collaborators.
    pub fn new(
        config: WalletConfig,
        chain: Arc<dyn ChainQuery>,
        generator: Arc<dyn BlockGenerator>,
        sink: Arc<dyn SubmissionSink>,
    ) -> Result<Self, WalletError> {
        let registry = Arc::new(WalletRegistry::open(&config)?);
        let resolver = AddressResolver::new(Arc::clone(&registry));
        let metrics = Arc::new(WalletMetrics::new()?);
        let builder = TransactionBuilder::new(chain, generator, sink, resolver.clone(), metrics);
        Ok(Self {
            config,
            registry,
            resolver,
            builder,
        })
    }

    pub fn with_policy(mut self, policy: Arc<dyn RecipientPolicy>) -> Self {
        self.builder = self.builder.with_policy(policy);
        self
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn metrics(&self) -> &Arc<WalletMetrics> {
        self.builder.metrics()
    }

    // ── Stores ──────────────────────────────────────────────────────────

    pub fn list_all_stores(&self) -> Vec<StoreId> {
        self.registry.list_stores()
    }

    pub fn list_stores_in_data_dir(&self) -> Result<Vec<StoreId>, WalletError> {
        self.registry.list_stores_in_data_dir()
    }

    /// Addresses `from..to` of an unlocked store. At most
    /// [`quill_keystore::KeyRing::MAX_LIST_RANGE`] addresses per call.
    pub fn list_store_addresses(
        &self,
        store: &str,
        from: u32,
        to: u32,
    ) -> Result<Vec<Address>, WalletError> {
        Ok(self.registry.store(store)?.list_addresses(from, to)?)
    }

    pub fn new_store(&self, passphrase: &str) -> Result<NewStoreResponse, WalletError> {
        let span = spans::store_span("new_store", &self.config.data_dir.display().to_string());
        let _enter = span.enter();
        let created = self.registry.new_store(passphrase)?;
        tracing::info!(
            store = %created.store_id,
            primary = %created.primary_address,
            "key store created"
        );
        Ok(created.into())
    }

    pub fn recover_store(
        &self,
        phrase: &str,
        passphrase: &str,
    ) -> Result<NewStoreResponse, WalletError> {
        let span = spans::store_span("recover_store", &self.config.data_dir.display().to_string());
        let _enter = span.enter();
        let recovered = self.registry.recover_store(phrase, passphrase)?;
        tracing::info!(
            store = %recovered.store_id,
            primary = %recovered.primary_address,
            "key store recovered"
        );
        Ok(recovered.into())
    }

    pub fn add_store(&self, path: impl AsRef<Path>) -> Result<StoreId, WalletError> {
        self.registry.add_store(path.as_ref())
    }

    // ── Derivation ──────────────────────────────────────────────────────

    pub fn derive_by_index(&self, store: &str, index: u32) -> Result<DeriveResult, WalletError> {
        Ok(self.registry.store(store)?.derive_at_index(index)?.into())
    }

    /// Derive at a full `m/…` path. Every component must be hardened.
    pub fn derive_by_full_path(
        &self,
        store: &str,
        path: &str,
    ) -> Result<DeriveResult, WalletError> {
        let path: DerivationPath = path.parse().map_err(KeyStoreError::from)?;
        Ok(self.registry.store(store)?.derive_at_path(&path)?.into())
    }

    /// Hex private key of the store's primary address. The store is opened
    /// for this call only.
    pub fn get_private_key(
        &self,
        store: &str,
        passphrase: &str,
    ) -> Result<Zeroizing<String>, WalletError> {
        let span = spans::store_span("get_private_key", store);
        let _enter = span.enter();
        let key = self.registry.store(store)?.open(passphrase)?.derive_at_index(0)?;
        tracing::info!("primary private key exported");
        Ok(key.private_key_hex())
    }

    // ── Unlock state ────────────────────────────────────────────────────

    pub fn unlock(&self, store: &str, passphrase: &str) -> Result<(), WalletError> {
        let span = spans::store_span("unlock", store);
        let _enter = span.enter();
        self.registry.unlock(store, passphrase)
    }

    pub fn lock(&self, store: &str) -> Result<(), WalletError> {
        self.registry.lock(store)
    }

    pub fn is_addr_unlocked(&self, store: &str, address: &Address) -> Result<bool, WalletError> {
        self.resolver.is_unlocked(store, address)
    }

    pub fn global_check_addr_unlocked(&self, address: &Address) -> bool {
        self.registry.global_unlock_check(address)
    }

    pub fn refresh_cache(&self) {
        self.registry.refresh_cache();
    }

    pub fn extract_mnemonic(
        &self,
        store: &str,
        passphrase: &str,
    ) -> Result<Zeroizing<String>, WalletError> {
        let span = spans::store_span("extract_mnemonic", store);
        let _enter = span.enter();
        self.registry.extract_mnemonic(store, passphrase)
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn find_addr(&self, store: &str, address: &Address) -> Result<FindAddrResult, WalletError> {
        Ok(self.resolver.find_in_store(store, address)?.into())
    }

    pub fn find_addr_with_passphrase(
        &self,
        store: &str,
        passphrase: &str,
        address: &Address,
    ) -> Result<FindAddrResult, WalletError> {
        Ok(self
            .resolver
            .find_in_store_with_passphrase(store, passphrase, address)?
            .into())
    }

    pub fn global_find_addr(&self, address: &Address) -> Result<FindAddrResult, WalletError> {
        Ok(self.resolver.find_globally(address)?.into())
    }

    #[deprecated(note = "tries one passphrase on every store; use find_addr_with_passphrase")]
    pub fn global_find_addr_with_passphrase(
        &self,
        address: &Address,
        passphrase: &str,
    ) -> Result<FindAddrResult, WalletError> {
        #[allow(deprecated)]
        let found = self.resolver.find_globally_with_passphrase(address, passphrase)?;
        Ok(found.into())
    }

    // ── Signing and transfers ───────────────────────────────────────────

    /// Sign a 32-byte hex hash with a key of an already unlocked store.
    pub fn sign_data(
        &self,
        address: &Address,
        hex_message: &str,
    ) -> Result<HexSignedTuple, TransferError> {
        Ok(self.builder.sign_message(address, hex_message, None)?.into())
    }

    pub fn sign_data_with_passphrase(
        &self,
        address: &Address,
        hex_message: &str,
        passphrase: &str,
    ) -> Result<HexSignedTuple, TransferError> {
        Ok(self
            .builder
            .sign_message(address, hex_message, Some(passphrase))?
            .into())
    }

    pub fn create_tx_with_passphrase(
        &self,
        request: &TransferRequest,
    ) -> Result<BlockHash, TransferError> {
        self.builder.submit_transfer(request)
    }

    // ── Files ───────────────────────────────────────────────────────────

    pub fn is_may_valid_keystore_file(
        &self,
        path: impl AsRef<Path>,
    ) -> IsMayValidKeystoreFileResponse {
        let may_address = WalletRegistry::inspect_store_file(path.as_ref());
        IsMayValidKeystoreFileResponse {
            maybe: may_address.is_some(),
            may_address,
        }
    }

    pub fn get_data_dir(&self) -> &Path {
        self.registry.data_dir()
    }
}
