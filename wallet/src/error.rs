use quill_chain::{ChainError, DomainError, GeneratorError, SinkError};
use quill_keystore::KeyStoreError;
use quill_types::{Address, TokenId};
use std::fmt;
use thiserror::Error;

/// Errors of registry, resolver and api operations.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("config error: {0}")]
    Config(String),

    #[error("key store not found: {0}")]
    StoreNotFound(String),

    #[error("address {0} is not controlled by any searchable key store")]
    AddressNotFound(Address),

    #[error("could not pick a fresh recovery phrase after {0} attempts")]
    PhraseExhausted(u32),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stage a transfer (or message signing) failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    StateSnapshot,
    Generation,
    KeyResolution,
    Signing,
    Submission,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::StateSnapshot => "state_snapshot",
            Stage::Generation => "generation",
            Stage::KeyResolution => "key_resolution",
            Stage::Signing => "signing",
            Stage::Submission => "submission",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing category of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    KeyManagement,
    Generation,
    SubmissionConflict,
    SubmissionRejected,
    StateUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::KeyManagement => "key_management",
            ErrorKind::Generation => "generation",
            ErrorKind::SubmissionConflict => "submission_conflict",
            ErrorKind::SubmissionRejected => "submission_rejected",
            ErrorKind::StateUnavailable => "state_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a transfer or raw message signing.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("invalid order price payload: {0}")]
    InvalidOrderPrice(String),

    #[error("amount is not a non-negative integer: {0:?}")]
    AmountParseError(String),

    #[error("difficulty is not a non-negative integer: {0:?}")]
    DifficultyParseError(String),

    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    #[error("message must be a 32-byte hex hash: {0}")]
    InvalidMessage(String),

    #[error("chain lookup failed during {stage}: {source}")]
    StateLookupFailed {
        stage: Stage,
        #[source]
        source: ChainError,
    },

    #[error("no chain state for {0}")]
    AddressStateUnavailable(Address),

    #[error(transparent)]
    GenerationFailed(GeneratorError),

    /// Returned exactly as the executor produced it.
    #[error(transparent)]
    GenerationRejected(DomainError),

    #[error("executor returned neither a block nor an error")]
    EmptyGenerationResult,

    #[error("key store not found: {0}")]
    StoreNotFound(String),

    #[error("no key store controls {0}")]
    KeyNotFound(Address),

    #[error("invalid passphrase for key store {0}")]
    InvalidPassphrase(String),

    #[error("key store error: {0}")]
    KeyStore(#[source] KeyStoreError),

    #[error("signing failed: {0}")]
    Signing(#[source] KeyStoreError),

    #[error("submission conflict: {0}")]
    SubmissionConflict(#[source] SinkError),

    #[error("submission rejected: {0}")]
    SubmissionRejected(#[source] SinkError),
}

impl TransferError {
    pub fn stage(&self) -> Stage {
        match self {
            TransferError::InvalidRecipient(_)
            | TransferError::InvalidOrderPrice(_)
            | TransferError::AmountParseError(_)
            | TransferError::DifficultyParseError(_)
            | TransferError::UnknownToken(_)
            | TransferError::InvalidMessage(_) => Stage::Validation,
            TransferError::StateLookupFailed { stage, .. } => *stage,
            TransferError::AddressStateUnavailable(_) => Stage::StateSnapshot,
            TransferError::GenerationFailed(_)
            | TransferError::GenerationRejected(_)
            | TransferError::EmptyGenerationResult => Stage::Generation,
            TransferError::StoreNotFound(_)
            | TransferError::KeyNotFound(_)
            | TransferError::InvalidPassphrase(_)
            | TransferError::KeyStore(_) => Stage::KeyResolution,
            TransferError::Signing(_) => Stage::Signing,
            TransferError::SubmissionConflict(_) | TransferError::SubmissionRejected(_) => {
                Stage::Submission
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidRecipient(_)
            | TransferError::InvalidOrderPrice(_)
            | TransferError::AmountParseError(_)
            | TransferError::DifficultyParseError(_)
            | TransferError::UnknownToken(_)
            | TransferError::InvalidMessage(_) => ErrorKind::InvalidInput,
            TransferError::StateLookupFailed { .. } | TransferError::AddressStateUnavailable(_) => {
                ErrorKind::StateUnavailable
            }
            TransferError::GenerationFailed(_)
            | TransferError::GenerationRejected(_)
            | TransferError::EmptyGenerationResult => ErrorKind::Generation,
            TransferError::StoreNotFound(_)
            | TransferError::KeyNotFound(_)
            | TransferError::InvalidPassphrase(_)
            | TransferError::KeyStore(_)
            | TransferError::Signing(_) => ErrorKind::KeyManagement,
            TransferError::SubmissionConflict(_) => ErrorKind::SubmissionConflict,
            TransferError::SubmissionRejected(_) => ErrorKind::SubmissionRejected,
        }
    }
}

impl From<WalletError> for TransferError {
    /// Classify a failed key lookup.
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::StoreNotFound(id) => TransferError::StoreNotFound(id),
            WalletError::AddressNotFound(address) => TransferError::KeyNotFound(address),
            WalletError::KeyStore(KeyStoreError::InvalidPassphrase(id)) => {
                TransferError::InvalidPassphrase(id)
            }
            WalletError::KeyStore(KeyStoreError::AddressNotFound { address, .. }) => {
                TransferError::KeyNotFound(address)
            }
            WalletError::KeyStore(KeyStoreError::StoreNotFound(id)) => {
                TransferError::StoreNotFound(id)
            }
            WalletError::KeyStore(other) => TransferError::KeyStore(other),
            WalletError::Io(e) => TransferError::KeyStore(KeyStoreError::Io(e)),
            other => TransferError::KeyStore(KeyStoreError::Format(other.to_string())),
        }
    }
}

impl From<SinkError> for TransferError {
    fn from(e: SinkError) -> Self {
        if e.is_conflict() {
            TransferError::SubmissionConflict(e)
        } else {
            TransferError::SubmissionRejected(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::BlockHash;

    fn addr() -> Address {
        quill_crypto::AccountKey::from_secret(&[1u8; 32]).address().clone()
    }

    #[test]
    fn token_lookup_failure_reports_validation_stage() {
        let e = TransferError::StateLookupFailed {
            stage: Stage::Validation,
            source: ChainError::Unreachable("down".into()),
        };
        assert_eq!(e.stage(), Stage::Validation);
        assert_eq!(e.kind(), ErrorKind::StateUnavailable);
    }

    #[test]
    fn empty_result_is_a_generation_failure() {
        let e = TransferError::EmptyGenerationResult;
        assert_eq!(e.stage(), Stage::Generation);
        assert_eq!(e.kind(), ErrorKind::Generation);
    }

    #[test]
    fn sink_errors_split_by_conflict() {
        let conflict: TransferError = SinkError::Conflict {
            address: addr(),
            previous: BlockHash::ZERO,
            head: BlockHash::new([1u8; 32]),
        }
        .into();
        assert_eq!(conflict.kind(), ErrorKind::SubmissionConflict);

        let rejected: TransferError = SinkError::Rejected("bad".into()).into();
        assert_eq!(rejected.kind(), ErrorKind::SubmissionRejected);
        assert_eq!(rejected.stage(), Stage::Submission);
    }

    #[test]
    fn lookup_failures_map_to_key_management() {
        let e: TransferError =
            WalletError::KeyStore(KeyStoreError::InvalidPassphrase("s".into())).into();
        assert!(matches!(e, TransferError::InvalidPassphrase(_)));
        assert_eq!(e.kind(), ErrorKind::KeyManagement);
        assert_eq!(e.stage(), Stage::KeyResolution);

        let e: TransferError = WalletError::AddressNotFound(addr()).into();
        assert!(matches!(e, TransferError::KeyNotFound(_)));
    }

    #[test]
    fn domain_error_text_is_verbatim() {
        let domain = DomainError::ContractRejected("paused".into());
        let e = TransferError::GenerationRejected(domain.clone());
        assert_eq!(e.to_string(), domain.to_string());
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::StateSnapshot.to_string(), "state_snapshot");
        assert_eq!(ErrorKind::SubmissionConflict.to_string(), "submission_conflict");
    }
}
