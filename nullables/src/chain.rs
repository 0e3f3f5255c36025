//! Nullable chain: token registry and address states held in memory.

use quill_chain::{AccountRef, AddressState, ChainError, ChainQuery};
use quill_types::{Address, BlockHash, TokenId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory chain query surface.
///
/// Knows the native token from the start. Address states must be set
/// explicitly; unknown addresses have no state.
pub struct NullChain {
    tokens: Mutex<HashSet<TokenId>>,
    states: Mutex<HashMap<Address, AddressState>>,
    unreachable: AtomicBool,
    state_lookups: AtomicUsize,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashSet::from([TokenId::NATIVE])),
            states: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            state_lookups: AtomicUsize::new(0),
        }
    }

    pub fn add_token(&self, token: TokenId) {
        self.tokens.lock().unwrap().insert(token);
    }

    pub fn set_state(&self, address: &Address, state: AddressState) {
        self.states.lock().unwrap().insert(address.clone(), state);
    }

    /// Give `address` a chain whose latest block is `latest` at `height`.
    pub fn set_latest(&self, address: &Address, latest: BlockHash, height: u64) {
        self.set_state(
            address,
            AddressState {
                snapshot: BlockHash::new([0x5a; 32]),
                latest: Some(AccountRef {
                    hash: latest,
                    height,
                }),
            },
        );
    }

    /// Make every query fail as if the node were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of `address_state` calls served so far.
    pub fn state_lookups(&self) -> usize {
        self.state_lookups.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), ChainError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ChainError::Unreachable("null chain offline".to_string()));
        }
        Ok(())
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainQuery for NullChain {
    fn token_exists(&self, token: &TokenId) -> Result<bool, ChainError> {
        self.check_reachable()?;
        Ok(self.tokens.lock().unwrap().contains(token))
    }

    fn address_state(&self, address: &Address) -> Result<Option<AddressState>, ChainError> {
        self.state_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.states.lock().unwrap().get(address).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> Address {
        quill_crypto::AccountKey::from_secret(&[1u8; 32]).address().clone()
    }

    #[test]
    fn native_token_known() {
        let chain = NullChain::new();
        assert!(chain.token_exists(&TokenId::NATIVE).unwrap());
        assert!(!chain.token_exists(&TokenId::new([9u8; 10])).unwrap());
        chain.add_token(TokenId::new([9u8; 10]));
        assert!(chain.token_exists(&TokenId::new([9u8; 10])).unwrap());
    }

    #[test]
    fn unknown_address_has_no_state() {
        let chain = NullChain::new();
        assert_eq!(chain.address_state(&addr()).unwrap(), None);
        chain.set_latest(&addr(), BlockHash::new([1u8; 32]), 3);
        let state = chain.address_state(&addr()).unwrap().unwrap();
        assert_eq!(state.next_height(), 4);
        assert_eq!(chain.state_lookups(), 2);
    }

    #[test]
    fn unreachable_fails_queries() {
        let chain = NullChain::new();
        chain.set_unreachable(true);
        assert!(chain.token_exists(&TokenId::NATIVE).is_err());
        assert!(chain.address_state(&addr()).is_err());
    }
}
