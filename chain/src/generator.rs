//! Block generation boundary.

use num_bigint::BigUint;
use quill_types::{AccountBlock, Address, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, GeneratorError};
use crate::query::AddressState;

/// A validated send-call the executor should turn into a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendIntent {
    pub account: Address,
    pub to_address: Address,
    pub token: TokenId,
    pub amount: BigUint,
    pub difficulty: Option<BigUint>,
    pub data: Vec<u8>,
}

/// Result of a successful executor invocation.
///
/// A well-behaved executor sets exactly one of `block` and `error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub block: Option<AccountBlock>,
    pub error: Option<DomainError>,
}

impl GenerationOutcome {
    pub fn generated(block: AccountBlock) -> Self {
        Self {
            block: Some(block),
            error: None,
        }
    }

    pub fn rejected(error: DomainError) -> Self {
        Self {
            block: None,
            error: Some(error),
        }
    }

    /// Neither block nor error. Only a broken executor returns this.
    pub fn empty() -> Self {
        Self {
            block: None,
            error: None,
        }
    }
}

pub trait BlockGenerator: Send + Sync {
    /// Compute the unsigned block for `intent` on top of `state`.
    fn generate(
        &self,
        intent: &SendIntent,
        state: &AddressState,
    ) -> Result<GenerationOutcome, GeneratorError>;
}
