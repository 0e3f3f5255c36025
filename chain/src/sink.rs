//! Pending pool submission boundary.

use quill_types::{AccountBlock, Address, BlockHash};

use crate::error::SinkError;

/// The single serialization point for blocks of one sender.
///
/// Implementations accept a block only if its `previous` equals the current
/// head of `sender`, and do so atomically; a block built against a superseded
/// head is rejected with [`SinkError::Conflict`], never reordered.
pub trait SubmissionSink: Send + Sync {
    fn submit(&self, sender: &Address, block: AccountBlock) -> Result<BlockHash, SinkError>;
}
