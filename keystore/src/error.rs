use quill_crypto::{DerivationError, MnemonicError};
use quill_types::Address;
use thiserror::Error;

/// Failures of key store operations.
///
/// Values carry store ids, addresses and reasons only. Passphrases, phrases
/// and key bytes never end up in an error.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("key store {0} is locked")]
    Locked(String),

    #[error("invalid passphrase for key store {0}")]
    InvalidPassphrase(String),

    #[error("key store not found: {0}")]
    StoreNotFound(String),

    #[error("address {address} not found in key store {store} (searched {window} indices)")]
    AddressNotFound {
        store: String,
        address: Address,
        window: u32,
    },

    #[error("invalid address range {from}..{to}")]
    InvalidRange { from: u32, to: u32 },

    #[error("derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("mnemonic error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("malformed key store file: {0}")]
    Format(String),

    #[error("key store encryption error: {0}")]
    Crypto(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
