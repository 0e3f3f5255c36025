//! Nullable infrastructure for deterministic testing.
//!
//! The ledger collaborators the wallet consumes (chain queries, block
//! generation, the pending pool) are abstracted behind the `quill-chain`
//! traits. This crate provides in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (failure modes, balances, heads)
//! - Never touch the filesystem or network
//!
//! Usage: hand these to the wallet in place of a live node.

pub mod chain;
pub mod generator;
pub mod pool;

pub use chain::NullChain;
pub use generator::{GeneratorMode, NullGenerator};
pub use pool::NullPool;
