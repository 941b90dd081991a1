use std::time::Duration;

use iko_crypto::VerifyingKey;
use iko_ledger::{Rejection, Transaction};
use iko_state::OwnershipState;
use iko_types::TxHash;

use crate::error::GateError;

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage failed; the transaction must be rejected.
    Fail(Rejection),
}

impl StageDecision {
    /// Returns `true` if the decision is `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` if the decision is `Fail`.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage passed.
    pub passed: bool,
    /// Populated on failure.
    pub reason: Option<String>,
    /// Wall-clock time the stage took to evaluate.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// Snapshot of the ledger that every stage evaluates against.
pub struct GateContext<'a> {
    /// Hash of the current chain head, `None` for an empty chain.
    pub head: Option<TxHash>,
    /// The only key allowed to sign genesis transactions.
    pub creator: &'a VerifyingKey,
    /// Current kitty ownership.
    pub state: &'a dyn OwnershipState,
}

// ---------------------------------------------------------------------------
// TxStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// The trait is object-safe and `Send + Sync` so stages can be stored in
/// a `Vec<Box<dyn TxStage>>`.
pub trait TxStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "linkage", "ownership").
    fn name(&self) -> &str;

    /// Evaluate the transaction and return a decision.
    fn evaluate(&self, tx: &Transaction, context: &GateContext<'_>)
        -> Result<StageDecision, GateError>;
}
