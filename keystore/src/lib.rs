//! Key stores for Quill.
//!
//! - [`KeyStore`]: the capability the wallet core talks to
//! - [`KeyRing`] / [`DerivedKey`]: an opened hierarchy and the keys derived from it
//! - [`EntropyStore`]: the file-backed implementation, a BIP39 phrase encrypted
//!   with Argon2id + AES-256-GCM

pub mod entropy_store;
pub mod error;
pub mod file;
pub mod key_ring;
pub mod store;

pub use entropy_store::EntropyStore;
pub use error::KeyStoreError;
pub use file::{inspect_store_file, store_file_name, KdfParams, StoreFile, STORE_FILE_EXTENSION};
pub use key_ring::{DerivedKey, KeyRing};
pub use store::{KeyStore, StoreId};
