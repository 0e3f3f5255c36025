//! The signing key of one account.
//!
//! Account keys are never generated at random: every key is the leaf of a
//! SLIP-0010 path under a store's seed (see [`crate::derivation`]).

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use quill_types::{Address, PublicKey, Signature};
use std::fmt;
use zeroize::Zeroizing;

/// An Ed25519 signing key together with the address it controls.
///
/// The secret scalar is wiped when the key is dropped.
pub struct AccountKey {
    signing: SigningKey,
    address: Address,
}

impl AccountKey {
    /// Key for a 32-byte secret, as produced by derivation.
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(secret);
        let address = Address::from_public_key(&PublicKey(signing.verifying_key().to_bytes()));
        Self { signing, address }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing.verifying_key().to_bytes())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing.sign(message).to_bytes())
    }

    /// Hex of the secret, for explicit export calls only.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.signing.as_bytes()))
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Whether `signature` is a valid signature by `public_key` over `message`.
///
/// Uses strict verification: small-order keys and non-canonical signatures
/// are refused.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify_strict(message, &signature).is_ok()
}

/// Whether `signature` over `message` was made by the key behind `address`.
pub fn verify_for_address(address: &Address, message: &[u8], signature: &Signature) -> bool {
    address
        .public_key()
        .is_some_and(|key| verify(&key, message, signature))
}
