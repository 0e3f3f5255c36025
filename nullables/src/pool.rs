//! Nullable pool: per-sender compare-and-append of signed blocks.

use quill_chain::{SinkError, SubmissionSink};
use quill_types::{AccountBlock, Address, BlockHash};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct PoolState {
    heads: HashMap<Address, BlockHash>,
    seen: HashSet<BlockHash>,
    accepted: Vec<AccountBlock>,
}

/// An in-memory pending pool.
///
/// Checks signatures the way a node would, then appends the block only if it
/// builds on the sender's current head. Check and append happen under one
/// lock, so of two blocks built on the same head exactly one is accepted.
pub struct NullPool {
    state: Mutex<PoolState>,
    rejecting: Mutex<Option<String>>,
}

impl NullPool {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            rejecting: Mutex::new(None),
        }
    }

    /// Set the head the next block of `address` must build on.
    pub fn set_head(&self, address: &Address, head: BlockHash) {
        self.state.lock().unwrap().heads.insert(address.clone(), head);
    }

    pub fn head(&self, address: &Address) -> BlockHash {
        self.state
            .lock()
            .unwrap()
            .heads
            .get(address)
            .copied()
            .unwrap_or(BlockHash::ZERO)
    }

    /// Reject every submission with `reason` until cleared with `None`.
    pub fn set_rejecting(&self, reason: Option<String>) {
        *self.rejecting.lock().unwrap() = reason;
    }

    pub fn accepted(&self) -> Vec<AccountBlock> {
        self.state.lock().unwrap().accepted.clone()
    }

    fn check_block(sender: &Address, block: &AccountBlock) -> Result<(), SinkError> {
        if block.account != *sender {
            return Err(SinkError::Rejected(format!(
                "block account {} is not sender {}",
                block.account, sender
            )));
        }
        if block.hash != block.compute_hash() {
            return Err(SinkError::Rejected("hash mismatch".to_string()));
        }
        let (Some(public_key), Some(signature)) = (&block.public_key, &block.signature) else {
            return Err(SinkError::Rejected("unsigned block".to_string()));
        };
        if sender.public_key().as_ref() != Some(public_key) {
            return Err(SinkError::Rejected("public key does not match sender".to_string()));
        }
        if !quill_crypto::verify(public_key, block.hash.as_bytes(), signature) {
            return Err(SinkError::Rejected("bad signature".to_string()));
        }
        Ok(())
    }
}

impl Default for NullPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionSink for NullPool {
    fn submit(&self, sender: &Address, block: AccountBlock) -> Result<BlockHash, SinkError> {
        if let Some(reason) = self.rejecting.lock().unwrap().clone() {
            return Err(SinkError::Rejected(reason));
        }
        Self::check_block(sender, &block)?;

        let mut state = self.state.lock().unwrap();
        if state.seen.contains(&block.hash) {
            return Err(SinkError::Duplicate(block.hash));
        }
        let head = state.heads.get(sender).copied().unwrap_or(BlockHash::ZERO);
        if block.previous != head {
            return Err(SinkError::Conflict {
                address: sender.clone(),
                previous: block.previous,
                head,
            });
        }

        let hash = block.hash;
        state.heads.insert(sender.clone(), hash);
        state.seen.insert(hash);
        state.accepted.push(block);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use quill_crypto::AccountKey;
    use quill_types::{BlockType, TokenId};

    fn keys(seed: u8) -> AccountKey {
        AccountKey::from_secret(&[seed; 32])
    }

    fn signed_block(kp: &AccountKey, previous: BlockHash, amount: u32) -> AccountBlock {
        let mut block = AccountBlock {
            block_type: BlockType::SendCall,
            account: kp.address().clone(),
            previous,
            height: 1,
            snapshot: BlockHash::ZERO,
            to_address: keys(99).address().clone(),
            token: TokenId::NATIVE,
            amount: BigUint::from(amount),
            fee: BigUint::from(0u32),
            data: vec![],
            difficulty: None,
            nonce: None,
            public_key: None,
            signature: None,
            hash: BlockHash::ZERO,
        };
        block.hash = block.compute_hash();
        block.signature = Some(kp.sign(block.hash.as_bytes()));
        block.public_key = Some(kp.public_key());
        block
    }

    #[test]
    fn accepts_block_on_head_and_advances() {
        let pool = NullPool::new();
        let kp = keys(1);
        let sender = kp.address().clone();
        let block = signed_block(&kp, BlockHash::ZERO, 1);
        let hash = pool.submit(&sender, block).unwrap();
        assert_eq!(pool.head(&sender), hash);
        assert_eq!(pool.accepted().len(), 1);
    }

    #[test]
    fn second_block_on_same_head_conflicts() {
        let pool = NullPool::new();
        let kp = keys(1);
        let sender = kp.address().clone();
        pool.submit(&sender, signed_block(&kp, BlockHash::ZERO, 1)).unwrap();
        let err = pool
            .submit(&sender, signed_block(&kp, BlockHash::ZERO, 2))
            .unwrap_err();
        assert!(matches!(err, SinkError::Conflict { .. }));
    }

    #[test]
    fn resubmission_is_duplicate() {
        let pool = NullPool::new();
        let kp = keys(1);
        let sender = kp.address().clone();
        let block = signed_block(&kp, BlockHash::ZERO, 1);
        pool.submit(&sender, block.clone()).unwrap();
        assert!(matches!(
            pool.submit(&sender, block),
            Err(SinkError::Duplicate(_))
        ));
    }

    #[test]
    fn rejects_foreign_or_unsigned_blocks() {
        let pool = NullPool::new();
        let kp = keys(1);
        let sender = kp.address().clone();

        let mut unsigned = signed_block(&kp, BlockHash::ZERO, 1);
        unsigned.signature = None;
        assert!(matches!(
            pool.submit(&sender, unsigned),
            Err(SinkError::Rejected(_))
        ));

        let other = keys(2);
        let foreign = signed_block(&other, BlockHash::ZERO, 1);
        assert!(matches!(
            pool.submit(&sender, foreign),
            Err(SinkError::Rejected(_))
        ));

        let mut tampered = signed_block(&kp, BlockHash::ZERO, 1);
        tampered.amount = BigUint::from(1000u32);
        tampered.hash = tampered.compute_hash();
        assert!(matches!(
            pool.submit(&sender, tampered),
            Err(SinkError::Rejected(_))
        ));
    }

    #[test]
    fn rejecting_mode() {
        let pool = NullPool::new();
        let kp = keys(1);
        let sender = kp.address().clone();
        pool.set_rejecting(Some("pool full".into()));
        assert!(matches!(
            pool.submit(&sender, signed_block(&kp, BlockHash::ZERO, 1)),
            Err(SinkError::Rejected(r)) if r == "pool full"
        ));
    }
}
