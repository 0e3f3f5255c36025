//! BIP39 recovery phrases.
//!
//! A key store is rooted in a 24-word mnemonic (256-bit entropy). The store
//! encrypts the entropy at rest; the 64-byte BIP39 seed derived from it is the
//! root that SLIP-0010 derivation (see [`crate::derivation`]) walks from.

use bip39::Mnemonic;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Entropy length for a 24-word phrase.
const ENTROPY_LEN: usize = 32;

/// A 64-byte BIP39 seed, zeroized on drop.
pub type Seed = Zeroizing<[u8; 64]>;

/// Errors arising from mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<Zeroizing<String>, MnemonicError> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
    rand::rngs::OsRng.fill_bytes(&mut entropy[..]);
    mnemonic_from_entropy(&entropy[..])
}

/// Render entropy bytes as a mnemonic phrase.
pub fn mnemonic_from_entropy(entropy: &[u8]) -> Result<Zeroizing<String>, MnemonicError> {
    let mnemonic = Mnemonic::from_entropy(entropy)
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Recover the entropy bytes behind a mnemonic phrase.
pub fn entropy_from_mnemonic(phrase: &str) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

/// Derive the 64-byte BIP39 seed (PBKDF2-HMAC-SHA512, 2048 rounds, empty
/// BIP39 passphrase) from a mnemonic phrase.
pub fn seed_from_mnemonic(phrase: &str) -> Result<Seed, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed_normalized("")))
}

/// Validate that a mnemonic phrase is a valid BIP39 mnemonic.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_normalized(mnemonic).is_ok()
}
