//! Boundary traits for the ledger collaborators of the wallet.
//!
//! The wallet never computes state transitions, snapshots or pool ordering
//! itself. It consumes them through these traits:
//! - [`ChainQuery`]: token existence and per-address chain state
//! - [`BlockGenerator`]: turns a send intent into an unsigned block
//! - [`SubmissionSink`]: accepts a signed block into the pending pool
//!
//! Implementations must be `Send + Sync`; the wallet shares them across
//! concurrent requests.

pub mod error;
pub mod generator;
pub mod query;
pub mod sink;

pub use error::{ChainError, DomainError, GeneratorError, SinkError};
pub use generator::{BlockGenerator, GenerationOutcome, SendIntent};
pub use query::{AccountRef, AddressState, ChainQuery};
pub use sink::SubmissionSink;
