use thiserror::Error;

use iko_ledger::{ChainError, Rejection, ReplayError};
use iko_state::StateError;

use crate::hooks::HookError;

#[derive(Debug, Error)]
pub enum BlockChainError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The transaction was appended but a post-commit action failed.
    /// The ownership state may lag the chain until `resync_state` runs.
    #[error("post-commit action failed for tx#{seq}: {source}")]
    PostCommit { seq: u64, source: HookError },

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("blockchain is closed")]
    Closed,

    #[error("configuration error: {0}")]
    Config(String),
}

impl BlockChainError {
    /// The terminal rejection, if validation refused the transaction.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Chain(e) => e.rejection(),
            _ => None,
        }
    }
}

impl From<ReplayError> for BlockChainError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::Chain(e) => Self::Chain(e),
            ReplayError::State(e) => Self::State(e),
        }
    }
}

pub type BlockChainResult<T> = Result<T, BlockChainError>;
