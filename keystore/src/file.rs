//! Argon2id encrypted store file holding the mnemonic entropy.
//!
//! Encrypts the BIP39 entropy of a key store with a user-chosen passphrase:
//! 1. Argon2id derives a 32-byte encryption key from the passphrase + random salt
//! 2. AES-256-GCM encrypts the entropy with a random nonce
//! 3. The result is stored as a JSON file named after the primary address,
//!    together with every parameter needed to decrypt it again

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use quill_types::Address;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zeroize::Zeroizing;

use crate::error::KeyStoreError;

/// Argon2id defaults: 64 MB memory, 3 iterations, 1 lane of parallelism.
const ARGON2_MEMORY_KIB: u32 = 65536; // 64 MB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const STORE_VERSION: u32 = 1;
const CIPHER: &str = "aes-256-gcm";
const KDF: &str = "argon2id";

/// Salt length in bytes.
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Extension of store files in the data directory.
pub const STORE_FILE_EXTENSION: &str = "json";

/// The top-level store file structure, serializable to/from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFile {
    pub version: u32,
    pub primary_address: Address,
    pub crypto: StoreCrypto,
}

/// The crypto section of the store file, containing all encryption parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// KDF parameters for Argon2id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// File name of the store whose primary address is `primary`.
pub fn store_file_name(primary: &Address) -> String {
    format!("{}.{}", primary, STORE_FILE_EXTENSION)
}

/// Encrypt mnemonic entropy with a passphrase using Argon2id + AES-256-GCM.
pub fn encrypt_entropy(
    entropy: &[u8],
    primary_address: &Address,
    passphrase: &str,
    kdf_params: &KdfParams,
) -> Result<StoreFile, KeyStoreError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(passphrase, &salt, kdf_params)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| KeyStoreError::Crypto(format!("AES key init failed: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, entropy)
        .map_err(|e| KeyStoreError::Crypto(format!("encryption failed: {}", e)))?;

    Ok(StoreFile {
        version: STORE_VERSION,
        primary_address: primary_address.clone(),
        crypto: StoreCrypto {
            cipher: CIPHER.to_string(),
            kdf: KDF.to_string(),
            kdf_params: *kdf_params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Decrypt the entropy of a store file.
///
/// An authentication failure is reported as [`KeyStoreError::InvalidPassphrase`];
/// structural problems with the file are [`KeyStoreError::Format`].
pub fn decrypt_entropy(
    store: &StoreFile,
    passphrase: &str,
) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
    check_header(store)?;

    let salt = hex::decode(&store.crypto.salt)
        .map_err(|e| KeyStoreError::Format(format!("invalid salt hex: {}", e)))?;
    let nonce_bytes = hex::decode(&store.crypto.nonce)
        .map_err(|e| KeyStoreError::Format(format!("invalid nonce hex: {}", e)))?;
    let ciphertext = hex::decode(&store.crypto.ciphertext)
        .map_err(|e| KeyStoreError::Format(format!("invalid ciphertext hex: {}", e)))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(KeyStoreError::Format(format!(
            "invalid nonce length: expected {}, got {}",
            NONCE_LEN,
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(passphrase, &salt, &store.crypto.kdf_params)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| KeyStoreError::Crypto(format!("AES key init failed: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| KeyStoreError::InvalidPassphrase(store.primary_address.to_string()))?;

    Ok(Zeroizing::new(plaintext))
}

/// Save a store file as pretty JSON.
pub fn save_store_file(store: &StoreFile, path: &Path) -> Result<(), KeyStoreError> {
    let json = serde_json::to_string_pretty(store)
        .map_err(|e| KeyStoreError::Format(format!("JSON serialization failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a store file from disk.
pub fn load_store_file(path: &Path) -> Result<StoreFile, KeyStoreError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KeyStoreError::StoreNotFound(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    let store: StoreFile = serde_json::from_str(&json)
        .map_err(|e| KeyStoreError::Format(format!("invalid store JSON: {}", e)))?;
    check_header(&store)?;
    Ok(store)
}

/// Cheap plausibility check of a file without decrypting it.
///
/// Returns the recorded primary address when the file parses as a store file
/// and the address checksum holds.
pub fn inspect_store_file(path: &Path) -> Option<Address> {
    let store = load_store_file(path).ok()?;
    store
        .primary_address
        .has_valid_checksum()
        .then_some(store.primary_address)
}

fn check_header(store: &StoreFile) -> Result<(), KeyStoreError> {
    if store.version != STORE_VERSION {
        return Err(KeyStoreError::Format(format!(
            "unsupported store version: {}",
            store.version
        )));
    }
    if store.crypto.cipher != CIPHER || store.crypto.kdf != KDF {
        return Err(KeyStoreError::Format(format!(
            "unsupported cipher suite: {}/{}",
            store.crypto.cipher, store.crypto.kdf
        )));
    }
    Ok(())
}

/// Derive a 32-byte key from a passphrase and salt using Argon2id.
fn derive_key(
    passphrase: &str,
    salt: &[u8],
    kdf_params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, KeyStoreError> {
    let params = Params::new(
        kdf_params.memory,
        kdf_params.iterations,
        kdf_params.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| KeyStoreError::Crypto(format!("Argon2 params error: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output[..])
        .map_err(|e| KeyStoreError::Crypto(format!("Argon2 hashing failed: {}", e)))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> KdfParams {
        KdfParams {
            memory: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn primary() -> Address {
        quill_crypto::AccountKey::from_secret(&[1u8; 32]).address().clone()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let entropy = [42u8; 32];
        let store = encrypt_entropy(&entropy, &primary(), "test-password-123", &cheap()).unwrap();
        let decrypted = decrypt_entropy(&store, "test-password-123").unwrap();
        assert_eq!(&decrypted[..], &entropy[..]);
    }

    #[test]
    fn wrong_passphrase_is_reported_as_such() {
        let store = encrypt_entropy(&[42u8; 32], &primary(), "correct", &cheap()).unwrap();
        let err = decrypt_entropy(&store, "wrong").unwrap_err();
        assert!(matches!(err, KeyStoreError::InvalidPassphrase(_)));
        assert!(!err.to_string().contains("wrong"));
    }

    #[test]
    fn store_crypto_fields() {
        let store = encrypt_entropy(&[0u8; 32], &primary(), "pass", &KdfParams::default()).unwrap();
        assert_eq!(store.version, 1);
        assert_eq!(store.crypto.cipher, "aes-256-gcm");
        assert_eq!(store.crypto.kdf, "argon2id");
        assert_eq!(store.crypto.kdf_params.memory, 65536);
        assert_eq!(store.crypto.kdf_params.iterations, 3);
        assert_eq!(store.crypto.kdf_params.parallelism, 1);
    }

    #[test]
    fn store_serializes_to_camel_case_json() {
        let store = encrypt_entropy(&[1u8; 32], &primary(), "pass", &cheap()).unwrap();
        let json = serde_json::to_string_pretty(&store).unwrap();
        assert!(json.contains("\"version\": 1"));
        assert!(json.contains("\"primaryAddress\""));
        assert!(json.contains("\"kdfParams\""));
        assert!(json.contains("\"cipher\": \"aes-256-gcm\""));
    }

    #[test]
    fn decryption_uses_stored_kdf_params() {
        let store = encrypt_entropy(&[5u8; 32], &primary(), "pass", &cheap()).unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let reloaded: StoreFile = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.crypto.kdf_params, cheap());
        assert_eq!(&decrypt_entropy(&reloaded, "pass").unwrap()[..], &[5u8; 32]);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = encrypt_entropy(&[99u8; 32], &primary(), "file-test", &cheap()).unwrap();
        let path = dir.path().join(store_file_name(&store.primary_address));

        save_store_file(&store, &path).unwrap();
        let loaded = load_store_file(&path).unwrap();
        assert_eq!(loaded.primary_address, primary());
        assert_eq!(&decrypt_entropy(&loaded, "file-test").unwrap()[..], &[99u8; 32]);
    }

    #[test]
    fn different_salts_produce_different_ciphertext() {
        let s1 = encrypt_entropy(&[7u8; 32], &primary(), "password", &cheap()).unwrap();
        let s2 = encrypt_entropy(&[7u8; 32], &primary(), "password", &cheap()).unwrap();
        assert_ne!(s1.crypto.ciphertext, s2.crypto.ciphertext);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_store_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, KeyStoreError::StoreNotFound(_)));
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut store = encrypt_entropy(&[0u8; 32], &primary(), "pass", &cheap()).unwrap();
        store.version = 99;
        assert!(matches!(
            decrypt_entropy(&store, "pass"),
            Err(KeyStoreError::Format(_))
        ));
    }

    #[test]
    fn inspect_accepts_store_and_rejects_junk() {
        let dir = tempfile::tempdir().unwrap();
        let store = encrypt_entropy(&[3u8; 32], &primary(), "pass", &cheap()).unwrap();
        let good = dir.path().join("good.json");
        save_store_file(&store, &good).unwrap();
        assert_eq!(inspect_store_file(&good), Some(primary()));

        let junk = dir.path().join("junk.json");
        std::fs::write(&junk, "{\"hello\": 1}").unwrap();
        assert_eq!(inspect_store_file(&junk), None);
        assert_eq!(inspect_store_file(&dir.path().join("missing.json")), None);
    }
}
