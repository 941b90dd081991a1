use iko_ledger::{Rejection, Transaction, TxOperation};

use crate::error::GateError;
use crate::stage::{GateContext, StageDecision, TxStage};

/// Authorization stage.
///
/// Only the creator key may issue kitties. A transfer must be signed by the
/// key it claims to transfer from; whether that key actually owns the kitty
/// is the ownership stage's concern.
pub struct AuthorityStage;

impl TxStage for AuthorityStage {
    fn name(&self) -> &str {
        "authority"
    }

    fn evaluate(
        &self,
        tx: &Transaction,
        context: &GateContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let reason = match tx.op() {
            TxOperation::Genesis { .. } if tx.signer() != context.creator => {
                "genesis must be signed by the creator key"
            }
            TxOperation::Transfer { from, .. } if tx.signer() != from => {
                "transfer must be signed by its source key"
            }
            _ => return Ok(StageDecision::Pass),
        };
        Ok(StageDecision::Fail(Rejection::Unauthorized {
            signer: tx.signer().clone(),
            reason: reason.into(),
        }))
    }
}
