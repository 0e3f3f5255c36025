//! Parse errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid token id: {0}")]
    InvalidTokenId(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}
