use num_bigint::BigUint;
use quill_types::{Address, BlockHash, TokenId};
use thiserror::Error;

/// Chain query failures. A missing address state is not an error; see
/// [`crate::ChainQuery::address_state`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain unreachable: {0}")]
    Unreachable(String),

    #[error("chain query failed: {0}")]
    Internal(String),
}

/// The executor could not be invoked or did not finish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("generator invocation failed: {0}")]
    Invocation(String),

    #[error("stale state for {address}: generated against {expected}, chain head is {actual}")]
    StaleState {
        address: Address,
        expected: BlockHash,
        actual: BlockHash,
    },
}

/// A rejection computed by the executor itself. Authoritative: the wallet
/// returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("insufficient balance of {token}: available {available}, required {required}")]
    InsufficientBalance {
        token: TokenId,
        available: BigUint,
        required: BigUint,
    },

    #[error("insufficient quota for {0}")]
    InsufficientQuota(Address),

    #[error("contract rejected call: {0}")]
    ContractRejected(String),
}

/// Outcome of a submission the pool did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The block was built on a predecessor that is no longer the head.
    #[error("conflict for {address}: block builds on {previous}, head is {head}")]
    Conflict {
        address: Address,
        previous: BlockHash,
        head: BlockHash,
    },

    #[error("duplicate block {0}")]
    Duplicate(BlockHash),

    #[error("block rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Whether the failure is an ordering conflict rather than a rejection of
    /// the block itself.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SinkError::Conflict { .. } | SinkError::Duplicate(_))
    }
}
