use iko_crypto::VerifyingKey;
use iko_state::StateError;
use iko_types::{KittyId, TxHash};

/// Errors produced by chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("no transactions recorded")]
    EmptyChain,

    #[error("tx of hash '{0}' does not exist")]
    TxNotFound(TxHash),

    #[error("tx of sequence {seq} does not exist (chain length {len})")]
    SeqOutOfRange { seq: u64, len: u64 },

    #[error("invalid page size: 0")]
    ZeroPageSize,

    #[error("tx '{0}' is already recorded")]
    DuplicateTx(TxHash),

    #[error("transaction rejected: {0}")]
    Rejected(Rejection),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("chain is closed")]
    Closed,

    #[error("chain lock poisoned: {0}")]
    Poisoned(String),
}

impl ChainError {
    /// Missing head, hash, or sequence.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EmptyChain | Self::TxNotFound(_))
    }

    /// Bad sequence number or page size.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::SeqOutOfRange { .. } | Self::ZeroPageSize)
    }

    /// The terminal rejection, if the admission check refused the tx.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Why an admission check refused a transaction.
///
/// Rejections are terminal for the submitted transaction: resubmitting the
/// same bytes can only succeed after the chain or ownership state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("broken chain: expected prev {}, found {}", link(.expected), link(.found))]
    BrokenChain {
        expected: Option<TxHash>,
        found: Option<TxHash>,
    },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unauthorized signer {}: {reason}", .signer.short_hex())]
    Unauthorized { signer: VerifyingKey, reason: String },

    #[error("signer is not the current owner of {kitty}")]
    InvalidOwner { kitty: KittyId },

    #[error("{kitty} already exists")]
    KittyExists { kitty: KittyId },
}

/// An admission check could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("check '{check}' failed: {message}")]
pub struct CheckError {
    pub check: String,
    pub message: String,
}

impl CheckError {
    pub fn new(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while re-deriving ownership state from the chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

fn link(hash: &Option<TxHash>) -> String {
    match hash {
        Some(hash) => hash.short_hex(),
        None => "<none>".into(),
    }
}
