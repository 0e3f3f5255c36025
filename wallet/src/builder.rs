//! The transfer pipeline.
//!
//! A transfer runs through six stages and stops at the first failure:
//!
//! 1. validation of recipient, order payload, amount, difficulty and token
//! 2. state snapshot of the sender
//! 3. generation of the unsigned block by the executor
//! 4. key resolution for the sender
//! 5. signing of the block hash
//! 6. submission to the pending pool
//!
//! Nothing is held across stages. Two transfers from the same sender race
//! freely; the pool accepts at most one block per predecessor and the loser
//! gets [`TransferError::SubmissionConflict`].

use num_bigint::BigUint;
use quill_chain::{AddressState, BlockGenerator, ChainQuery, SendIntent, SubmissionSink};
use quill_types::{AccountBlock, Address, BlockHash, PublicKey, Signature};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ErrorKind, Stage, TransferError};
use crate::metrics::WalletMetrics;
use crate::policy::{RecipientPolicy, SystemRecipientPolicy};
use crate::request::TransferRequest;
use crate::resolver::AddressResolver;
use crate::spans;

/// Length of a message accepted for raw signing.
const MESSAGE_LEN: usize = 32;

/// A raw message and its signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    pub message: [u8; MESSAGE_LEN],
    pub signature: Signature,
    pub public_key: PublicKey,
}

pub struct TransactionBuilder {
    chain: Arc<dyn ChainQuery>,
    generator: Arc<dyn BlockGenerator>,
    sink: Arc<dyn SubmissionSink>,
    policy: Arc<dyn RecipientPolicy>,
    resolver: AddressResolver,
    metrics: Arc<WalletMetrics>,
}

impl TransactionBuilder {
    pub fn new(
        chain: Arc<dyn ChainQuery>,
        generator: Arc<dyn BlockGenerator>,
        sink: Arc<dyn SubmissionSink>,
        resolver: AddressResolver,
        metrics: Arc<WalletMetrics>,
    ) -> Self {
        Self {
            chain,
            generator,
            sink,
            policy: Arc::new(SystemRecipientPolicy),
            resolver,
            metrics,
        }
    }

    /// Replace the recipient checks.
    pub fn with_policy(mut self, policy: Arc<dyn RecipientPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn metrics(&self) -> &Arc<WalletMetrics> {
        &self.metrics
    }

    /// Build, sign and submit the transfer described by `request`.
    ///
    /// Returns the hash the pool accepted, or the error of the one stage
    /// that failed.
    pub fn submit_transfer(&self, request: &TransferRequest) -> Result<BlockHash, TransferError> {
        let span = spans::transfer_span(&request.sender);
        let _enter = span.enter();

        let started = Instant::now();
        self.metrics.transfers_attempted.inc();
        let result = self.run_transfer(request);
        self.metrics
            .transfer_duration_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(hash) => {
                self.metrics.transfers_submitted.inc();
                tracing::info!(hash = %hash, "transfer submitted");
            }
            Err(e) => self.fail(e),
        }
        result
    }

    fn run_transfer(&self, request: &TransferRequest) -> Result<BlockHash, TransferError> {
        let intent = self.validate(request)?;
        tracing::debug!(
            recipient = %intent.to_address,
            token = %intent.token,
            amount = %intent.amount,
            "request validated"
        );

        let state = self.snapshot(&request.sender)?;
        tracing::debug!(
            snapshot = %state.snapshot,
            previous = %state.previous(),
            height = state.next_height(),
            "address state fetched"
        );

        let mut block = self.generate(&intent, &state)?;
        tracing::debug!(height = block.height, "block generated");

        let account = self.resolver.resolve_account(
            request.store.as_deref(),
            &request.sender,
            &request.passphrase,
        )?;
        tracing::debug!(
            store = %account.store_id(),
            index = account.index(),
            "signing key resolved"
        );

        account
            .sign_block(&mut block)
            .map_err(TransferError::Signing)?;
        tracing::debug!(hash = %block.hash, "block signed");

        Ok(self.sink.submit(&request.sender, block)?)
    }

    fn validate(&self, request: &TransferRequest) -> Result<SendIntent, TransferError> {
        let to_address = Address::parse(request.recipient.as_str())
            .ok()
            .filter(|a| self.policy.is_valid_recipient(a))
            .ok_or_else(|| TransferError::InvalidRecipient(request.recipient.clone()))?;

        if self.policy.requires_price_check(&to_address) {
            self.policy
                .validate_order_price_payload(&request.data)
                .map_err(TransferError::InvalidOrderPrice)?;
        }

        let amount = parse_uint(&request.amount)
            .ok_or_else(|| TransferError::AmountParseError(request.amount.clone()))?;

        let difficulty = match request.difficulty.as_deref() {
            Some(raw) => Some(
                parse_uint(raw)
                    .ok_or_else(|| TransferError::DifficultyParseError(raw.to_string()))?,
            ),
            None => None,
        };

        match self.chain.token_exists(&request.token) {
            Ok(true) => {}
            Ok(false) => return Err(TransferError::UnknownToken(request.token)),
            Err(source) => {
                return Err(TransferError::StateLookupFailed {
                    stage: Stage::Validation,
                    source,
                })
            }
        }

        Ok(SendIntent {
            account: request.sender.clone(),
            to_address,
            token: request.token,
            amount,
            difficulty,
            data: request.data.clone(),
        })
    }

    fn snapshot(&self, sender: &Address) -> Result<AddressState, TransferError> {
        self.chain
            .address_state(sender)
            .map_err(|source| TransferError::StateLookupFailed {
                stage: Stage::StateSnapshot,
                source,
            })?
            .ok_or_else(|| TransferError::AddressStateUnavailable(sender.clone()))
    }

    fn generate(
        &self,
        intent: &SendIntent,
        state: &AddressState,
    ) -> Result<AccountBlock, TransferError> {
        let outcome = self
            .generator
            .generate(intent, state)
            .map_err(TransferError::GenerationFailed)?;
        match (outcome.block, outcome.error) {
            (_, Some(domain)) => Err(TransferError::GenerationRejected(domain)),
            (Some(block), None) => Ok(block),
            (None, None) => Err(TransferError::EmptyGenerationResult),
        }
    }

    /// Sign a 32-byte hash given in hex.
    ///
    /// With a passphrase the key is resolved like a transfer without store
    /// selector; without one the address must belong to an unlocked store.
    pub fn sign_message(
        &self,
        address: &Address,
        hex_message: &str,
        passphrase: Option<&str>,
    ) -> Result<SignedMessage, TransferError> {
        let span = spans::sign_message_span(address);
        let _enter = span.enter();

        let result = self.run_sign_message(address, hex_message, passphrase);
        match &result {
            Ok(_) => {
                self.metrics.messages_signed.inc();
                tracing::info!("message signed");
            }
            Err(e) => self.fail(e),
        }
        result
    }

    fn run_sign_message(
        &self,
        address: &Address,
        hex_message: &str,
        passphrase: Option<&str>,
    ) -> Result<SignedMessage, TransferError> {
        let message = decode_message(hex_message)?;
        let account = match passphrase {
            Some(passphrase) => self.resolver.resolve_account(None, address, passphrase)?,
            None => self.resolver.unlocked_account(address)?,
        };
        let (signature, public_key) = account.sign(&message).map_err(TransferError::Signing)?;
        Ok(SignedMessage {
            message,
            signature,
            public_key,
        })
    }

    fn fail(&self, error: &TransferError) {
        self.metrics.record_failure(error);
        let stage = error.stage();
        let kind = error.kind();
        match error {
            TransferError::EmptyGenerationResult => {
                tracing::error!(%stage, %kind, "executor returned neither a block nor an error");
            }
            _ if kind == ErrorKind::InvalidInput => {
                tracing::info!(%stage, %kind, error = %error, "request rejected");
            }
            _ => {
                tracing::warn!(%stage, %kind, error = %error, "operation failed");
            }
        }
    }
}

/// Non-negative decimal integer, digits only.
fn parse_uint(raw: &str) -> Option<BigUint> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
}

fn decode_message(raw: &str) -> Result<[u8; MESSAGE_LEN], TransferError> {
    let body = raw.strip_prefix("0x").unwrap_or(raw);
    let mut message = [0u8; MESSAGE_LEN];
    hex::decode_to_slice(body, &mut message)
        .map_err(|e| TransferError::InvalidMessage(format!("{raw:?}: {e}")))?;
    Ok(message)
}
