//! Cryptographic primitives for Quill.
//!
//! - **BIP39** mnemonics as the recovery phrase of a key store
//! - **SLIP-0010** hardened derivation of Ed25519 keys from the mnemonic seed
//! - [`AccountKey`]: the Ed25519 key of one account, signing block hashes and
//!   raw messages
//!
//! Address encoding lives on [`quill_types::Address`].

pub mod account_key;
pub mod derivation;
pub mod mnemonic;

pub use account_key::{verify, verify_for_address, AccountKey};
pub use derivation::{
    derive_key, index_path, key_at_index, key_at_path, DerivationError, DerivationPath,
    COIN_TYPE,
};
pub use mnemonic::{
    entropy_from_mnemonic, generate_mnemonic, mnemonic_from_entropy, seed_from_mnemonic,
    validate_mnemonic, MnemonicError, Seed,
};
