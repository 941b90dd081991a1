use std::sync::Arc;
use std::time::{Duration, Instant};

use iko_crypto::VerifyingKey;
use iko_ledger::{ChainLog, CheckError, Transaction, TxCheck, Verdict};
use iko_state::OwnershipState;
use tracing::debug;

use crate::error::GateError;
use crate::stage::{GateContext, StageDecision, StageResult, TxStage};
use crate::stages::{AuthorityStage, LinkageStage, OwnershipStage, SignatureStage};

// ---------------------------------------------------------------------------
// GateResult
// ---------------------------------------------------------------------------

/// The outcome of running a transaction through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateResult {
    /// Accept, or the rejection of the first failing stage.
    pub verdict: Verdict,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    /// Returns `true` if the transaction was accepted.
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accept()
    }
}

// ---------------------------------------------------------------------------
// TxGate
// ---------------------------------------------------------------------------

/// The admission gate: a pipeline of stages every transaction must pass
/// before the chain log appends it.
///
/// Stages see the chain head and the ownership state as they are when the
/// evaluation starts. Callers that need the verdict to still hold at append
/// time must serialize evaluation and append.
pub struct TxGate {
    stages: Vec<Box<dyn TxStage>>,
    chain: Arc<dyn ChainLog>,
    state: Arc<dyn OwnershipState>,
    creator: VerifyingKey,
}

impl TxGate {
    /// Create a gate with an empty pipeline.
    ///
    /// Use [`Self::add_stage`] to add stages, or [`Self::with_default_stages`]
    /// for the standard pipeline.
    pub fn new(
        chain: Arc<dyn ChainLog>,
        state: Arc<dyn OwnershipState>,
        creator: VerifyingKey,
    ) -> Self {
        Self {
            stages: Vec::new(),
            chain,
            state,
            creator,
        }
    }

    /// Create a gate with the default stage pipeline:
    /// Linkage -> Signature -> Authority -> Ownership
    pub fn with_default_stages(
        chain: Arc<dyn ChainLog>,
        state: Arc<dyn OwnershipState>,
        creator: VerifyingKey,
    ) -> Self {
        let mut gate = Self::new(chain, state, creator);
        gate.add_stage(Box::new(LinkageStage));
        gate.add_stage(Box::new(SignatureStage));
        gate.add_stage(Box::new(AuthorityStage));
        gate.add_stage(Box::new(OwnershipStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn TxStage>) {
        self.stages.push(stage);
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn creator(&self) -> &VerifyingKey {
        &self.creator
    }

    /// Evaluate a transaction against the current head and state.
    pub fn evaluate(&self, tx: &Transaction) -> Result<GateResult, GateError> {
        let context = GateContext {
            head: self.chain.head_hash()?,
            creator: &self.creator,
            state: self.state.as_ref(),
        };
        self.evaluate_with_context(tx, &context)
    }

    /// Evaluate with an explicit context.
    ///
    /// The pipeline is **fail-fast**: the first stage that fails stops
    /// evaluation and its rejection becomes the verdict.
    pub fn evaluate_with_context(
        &self,
        tx: &Transaction,
        context: &GateContext<'_>,
    ) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(tx, context)?;
            let elapsed = stage_start.elapsed();

            let reason = match &decision {
                StageDecision::Pass => None,
                StageDecision::Fail(rejection) => Some(rejection.to_string()),
            };
            debug!(
                stage = stage.name(),
                kitty = %tx.kitty(),
                passed = decision.is_pass(),
                reason = reason.as_deref().unwrap_or(""),
                ?elapsed,
                "gate stage evaluated"
            );
            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: decision.is_pass(),
                reason,
                elapsed,
            });

            if let StageDecision::Fail(rejection) = decision {
                return Ok(GateResult {
                    verdict: Verdict::Reject(rejection),
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(GateResult {
            verdict: Verdict::Accept,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }
}

impl TxCheck for TxGate {
    fn check(&self, tx: &Transaction) -> Result<Verdict, CheckError> {
        Ok(self.evaluate(tx)?.verdict)
    }
}

impl std::fmt::Debug for TxGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("TxGate")
            .field("stages", &stages)
            .field("creator", &self.creator)
            .finish()
    }
}
