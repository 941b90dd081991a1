use crate::error::{CheckError, Rejection};
use crate::transaction::Transaction;

/// The outcome of an admission check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The transaction may be appended.
    Accept,
    /// The transaction must not be appended.
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Admission strategy consulted by [`ChainLog::add_tx`](crate::ChainLog::add_tx).
///
/// `Ok(Verdict::Reject(..))` is a terminal refusal of this transaction;
/// `Err(..)` means the check itself could not run (e.g. a poisoned state
/// lock) and is surfaced separately so callers can retry.
pub trait TxCheck: Send + Sync {
    fn check(&self, tx: &Transaction) -> Result<Verdict, CheckError>;
}

impl<F> TxCheck for F
where
    F: Fn(&Transaction) -> Result<Verdict, CheckError> + Send + Sync,
{
    fn check(&self, tx: &Transaction) -> Result<Verdict, CheckError> {
        self(tx)
    }
}

/// Accepts every transaction. For tests and trusted bulk import.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl TxCheck for AcceptAll {
    fn check(&self, _tx: &Transaction) -> Result<Verdict, CheckError> {
        Ok(Verdict::Accept)
    }
}
