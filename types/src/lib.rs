//! Fundamental types for the Quill wallet.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, block hashes, token identifiers, public keys, signatures and the account block
//! produced by generation and accepted by the pending pool.

pub mod address;
pub mod block;
pub mod error;
pub mod keys;
pub mod token;

pub use address::Address;
pub use block::{AccountBlock, BlockHash, BlockType};
pub use error::TypesError;
pub use keys::{PublicKey, Signature};
pub use token::TokenId;
