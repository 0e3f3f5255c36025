//! Read-only chain queries.

use quill_types::{Address, BlockHash, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

/// Pointer to a block in an account chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub hash: BlockHash,
    pub height: u64,
}

/// Chain state a block is generated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressState {
    /// Latest snapshot checkpoint.
    pub snapshot: BlockHash,
    /// Latest block of the account, if it has any.
    pub latest: Option<AccountRef>,
}

impl AddressState {
    /// Hash the next block must reference as `previous`.
    pub fn previous(&self) -> BlockHash {
        self.latest.map(|r| r.hash).unwrap_or(BlockHash::ZERO)
    }

    /// Height of the next block.
    pub fn next_height(&self) -> u64 {
        self.latest.map(|r| r.height + 1).unwrap_or(1)
    }
}

pub trait ChainQuery: Send + Sync {
    fn token_exists(&self, token: &TokenId) -> Result<bool, ChainError>;

    /// State of `address` at the current snapshot.
    ///
    /// `Ok(None)` means the chain has no resolvable state for the address,
    /// which is a valid answer and distinct from a failed lookup.
    fn address_state(&self, address: &Address) -> Result<Option<AddressState>, ChainError>;
}
