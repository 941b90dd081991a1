use iko_ledger::{Rejection, Transaction};
use tracing::trace;

use crate::error::GateError;
use crate::stage::{GateContext, StageDecision, TxStage};

/// Signature stage: the signature must verify under the transaction's
/// signer key over its content hash.
pub struct SignatureStage;

impl TxStage for SignatureStage {
    fn name(&self) -> &str {
        "signature"
    }

    fn evaluate(
        &self,
        tx: &Transaction,
        _context: &GateContext<'_>,
    ) -> Result<StageDecision, GateError> {
        match tx.verify_signature() {
            Ok(()) => Ok(StageDecision::Pass),
            Err(e) => {
                trace!(error = %e, signer = %tx.signer().short_hex(), "signature check failed");
                Ok(StageDecision::Fail(Rejection::InvalidSignature))
            }
        }
    }
}
