use iko_ledger::{Rejection, Transaction};

use crate::error::GateError;
use crate::stage::{GateContext, StageDecision, TxStage};

/// Chain linkage stage.
///
/// The transaction must name the current head as its predecessor, or no
/// predecessor when the chain is empty.
pub struct LinkageStage;

impl TxStage for LinkageStage {
    fn name(&self) -> &str {
        "linkage"
    }

    fn evaluate(
        &self,
        tx: &Transaction,
        context: &GateContext<'_>,
    ) -> Result<StageDecision, GateError> {
        if tx.prev() == context.head {
            return Ok(StageDecision::Pass);
        }
        Ok(StageDecision::Fail(Rejection::BrokenChain {
            expected: context.head,
            found: tx.prev(),
        }))
    }
}
