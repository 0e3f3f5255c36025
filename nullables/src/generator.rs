//! Nullable generator: builds plain send blocks against tracked balances.

use num_bigint::BigUint;
use quill_chain::{
    AddressState, BlockGenerator, DomainError, GenerationOutcome, GeneratorError, SendIntent,
};
use quill_types::{AccountBlock, Address, BlockHash, BlockType, TokenId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How the generator answers the next calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratorMode {
    /// Generate blocks, rejecting amounts above the sender's balance.
    Normal,
    /// Fail the invocation itself.
    Fail(String),
    /// Return neither a block nor an error.
    Empty,
    /// Build the block, but report this error alongside it.
    BlockWithError(DomainError),
}

/// A deterministic block generator for testing.
///
/// Balances default to zero, so only zero-amount sends succeed for accounts
/// that were never funded.
pub struct NullGenerator {
    balances: Mutex<HashMap<(Address, TokenId), BigUint>>,
    mode: Mutex<GeneratorMode>,
    calls: AtomicUsize,
}

impl NullGenerator {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            mode: Mutex::new(GeneratorMode::Normal),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fund(&self, address: &Address, token: TokenId, amount: BigUint) {
        self.balances
            .lock()
            .unwrap()
            .insert((address.clone(), token), amount);
    }

    pub fn set_mode(&self, mode: GeneratorMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn build(intent: &SendIntent, state: &AddressState) -> AccountBlock {
        let mut block = AccountBlock {
            block_type: BlockType::SendCall,
            account: intent.account.clone(),
            previous: state.previous(),
            height: state.next_height(),
            snapshot: state.snapshot,
            to_address: intent.to_address.clone(),
            token: intent.token,
            amount: intent.amount.clone(),
            fee: BigUint::from(0u32),
            data: intent.data.clone(),
            difficulty: intent.difficulty.clone(),
            nonce: intent.difficulty.as_ref().map(|_| state.next_height()),
            public_key: None,
            signature: None,
            hash: BlockHash::ZERO,
        };
        block.hash = block.compute_hash();
        block
    }
}

impl Default for NullGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockGenerator for NullGenerator {
    fn generate(
        &self,
        intent: &SendIntent,
        state: &AddressState,
    ) -> Result<GenerationOutcome, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode.lock().unwrap().clone() {
            GeneratorMode::Normal => {}
            GeneratorMode::Fail(reason) => return Err(GeneratorError::Invocation(reason)),
            GeneratorMode::Empty => return Ok(GenerationOutcome::empty()),
            GeneratorMode::BlockWithError(error) => {
                return Ok(GenerationOutcome {
                    block: Some(Self::build(intent, state)),
                    error: Some(error),
                });
            }
        }

        let available = self
            .balances
            .lock()
            .unwrap()
            .get(&(intent.account.clone(), intent.token))
            .cloned()
            .unwrap_or_default();
        if intent.amount > available {
            return Ok(GenerationOutcome::rejected(
                DomainError::InsufficientBalance {
                    token: intent.token,
                    available,
                    required: intent.amount.clone(),
                },
            ));
        }

        Ok(GenerationOutcome::generated(Self::build(intent, state)))
    }
}
