//! [`tracing::Span`] constructors for wallet operations.
//!
//! Every pipeline event is emitted inside one of these, so a trace backend
//! can group the stages of one request.

use quill_types::Address;
use tracing::{info_span, Span};

/// Span covering one transfer from validation to pool answer.
pub fn transfer_span(sender: &Address) -> Span {
    info_span!("transfer", sender = %sender)
}

/// Span covering one raw message signing.
pub fn sign_message_span(address: &Address) -> Span {
    info_span!("sign_message", address = %address)
}

/// Span covering a store-level api call.
pub fn store_span(operation: &str, store: &str) -> Span {
    info_span!("store", operation = %operation, store = %store)
}
