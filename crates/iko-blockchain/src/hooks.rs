use std::sync::Arc;

use thiserror::Error;

use iko_ledger::{OwnershipProjection, Transaction};
use iko_state::{OwnershipState, StateError};

#[derive(Debug, Error)]
pub enum HookError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("action '{name}' failed: {message}")]
    Action { name: String, message: String },
}

impl HookError {
    pub fn action(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Side effect run after a transaction is appended, in commit order.
///
/// Hooks run while the commit lock is held; a slow hook delays every
/// subsequent injection.
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &str {
        "action"
    }

    fn on_commit(&self, tx: &Transaction) -> Result<(), HookError>;
}

impl<F> PostCommitHook for F
where
    F: Fn(&Transaction) -> Result<(), HookError> + Send + Sync,
{
    fn on_commit(&self, tx: &Transaction) -> Result<(), HookError> {
        self(tx)
    }
}

/// Projects each committed transaction into the ownership state.
pub struct OwnershipHook {
    state: Arc<dyn OwnershipState>,
}

impl OwnershipHook {
    pub fn new(state: Arc<dyn OwnershipState>) -> Self {
        Self { state }
    }
}

impl PostCommitHook for OwnershipHook {
    fn name(&self) -> &str {
        "ownership"
    }

    fn on_commit(&self, tx: &Transaction) -> Result<(), HookError> {
        OwnershipProjection::apply(self.state.as_ref(), tx)?;
        Ok(())
    }
}

pub struct NoOpHook;

impl PostCommitHook for NoOpHook {
    fn name(&self) -> &str {
        "noop"
    }

    fn on_commit(&self, _tx: &Transaction) -> Result<(), HookError> {
        Ok(())
    }
}
