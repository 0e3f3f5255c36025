//! Wallet core library for Quill.
//!
//! Provides everything a wallet front end needs on top of the key stores
//! and the ledger collaborators:
//! - Store registry (list, create, recover, add, unlock, lock)
//! - Address lookup within one store or across all of them
//! - The transfer pipeline: validate, snapshot, generate, resolve, sign, submit
//! - Raw message signing
//! - Recipient checks for system contracts
//! - Prometheus metrics and tracing spans for the above

pub mod account;
pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod spans;

pub use account::Account;
pub use api::{
    DeriveResult, FindAddrResult, HexSignedTuple, IsMayValidKeystoreFileResponse,
    NewStoreResponse, WalletApi,
};
pub use builder::{SignedMessage, TransactionBuilder};
pub use config::WalletConfig;
pub use error::{ErrorKind, Stage, TransferError, WalletError};
pub use metrics::WalletMetrics;
pub use policy::{
    method_selector, place_order_payload, zero_address, RecipientPolicy, SystemContract,
    SystemRecipientPolicy, PLACE_ORDER_SIGNATURE,
};
pub use registry::{NewStore, WalletRegistry};
pub use request::TransferRequest;
pub use resolver::{AddressResolver, FoundAddress};
