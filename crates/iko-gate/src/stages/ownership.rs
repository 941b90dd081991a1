use iko_ledger::{Rejection, Transaction, TxOperation};

use crate::error::GateError;
use crate::stage::{GateContext, StageDecision, TxStage};

/// Ownership stage.
///
/// A genesis may not reissue an existing kitty. A transfer's source key must
/// be the kitty's recorded owner; an unknown kitty has no owner to transfer
/// from.
pub struct OwnershipStage;

impl TxStage for OwnershipStage {
    fn name(&self) -> &str {
        "ownership"
    }

    fn evaluate(
        &self,
        tx: &Transaction,
        context: &GateContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let kitty = tx.kitty();
        match tx.op() {
            TxOperation::Genesis { .. } => {
                if context.state.exists(kitty)? {
                    return Ok(StageDecision::Fail(Rejection::KittyExists { kitty }));
                }
            }
            TxOperation::Transfer { from, .. } => {
                if context.state.owner_of(kitty)?.as_ref() != Some(from) {
                    return Ok(StageDecision::Fail(Rejection::InvalidOwner { kitty }));
                }
            }
        }
        Ok(StageDecision::Pass)
    }
}
