use iko_ledger::{ChainError, CheckError};
use iko_state::StateError;

/// Errors that stop the gate from reaching a verdict.
///
/// A transaction that fails a stage is not an error; it yields a
/// [`StageDecision::Fail`](crate::StageDecision::Fail).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The ownership state could not be read.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// The chain head could not be read.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// A stage returned an unexpected error.
    #[error("stage error in '{stage}': {message}")]
    StageError { stage: String, message: String },
}

impl GateError {
    /// Create a stage error with a name and message.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl From<GateError> for CheckError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::StageError { stage, message } => CheckError::new(stage, message),
            GateError::State(e) => CheckError::new("gate", e.to_string()),
            GateError::Chain(e) => CheckError::new("gate", e.to_string()),
        }
    }
}
