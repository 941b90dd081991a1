use iko_types::TxHash;

use crate::check::TxCheck;
use crate::error::ChainError;
use crate::feed::Subscription;
use crate::transaction::Transaction;

/// Append-only transaction log, indexed by sequence and by hash.
///
/// All implementations must satisfy these invariants:
/// - Sequence numbers are contiguous from 0; `head_seq() == len() - 1`
///   whenever the log is non-empty.
/// - The hash index maps every stored hash to exactly one stored entry.
/// - Entries are never mutated or removed after admission.
/// - Readers never observe a length that disagrees with what
///   `get_tx_of_seq`/`get_tx_of_hash` can return.
///
/// The log does not judge transactions: linkage, signatures and ownership
/// are the `check`'s business. `add_tx` is atomic for the append step only;
/// callers that need check-then-append atomicity across concurrent writers
/// must serialize around it.
pub trait ChainLog: Send + Sync {
    /// The last admitted transaction; `EmptyChain` if there is none.
    fn head(&self) -> Result<Transaction, ChainError>;

    /// Sequence of the head; `EmptyChain` if there is none.
    fn head_seq(&self) -> Result<u64, ChainError>;

    /// Number of admitted transactions.
    fn len(&self) -> Result<u64, ChainError>;

    /// Run `check`, then append `tx` only on acceptance.
    ///
    /// Returns the stored copy stamped with its sequence number. A rejected
    /// or failed check leaves the log untouched.
    fn add_tx(&self, tx: Transaction, check: &dyn TxCheck) -> Result<Transaction, ChainError>;

    fn get_tx_of_hash(&self, hash: &TxHash) -> Result<Transaction, ChainError>;

    /// `SeqOutOfRange` when `seq >= len()`.
    fn get_tx_of_seq(&self, seq: u64) -> Result<Transaction, ChainError>;

    /// Up to `page_size` contiguous transactions starting at `start`.
    ///
    /// Errors with `ZeroPageSize` if `page_size == 0` and `SeqOutOfRange` if
    /// `start >= len()`. A page running past the end is returned short.
    fn get_txs_of_seq_range(
        &self,
        start: u64,
        page_size: u64,
    ) -> Result<Vec<Transaction>, ChainError>;

    /// Push feed of transactions admitted after this call, in admission order.
    fn subscribe(&self) -> Subscription;

    /// Stop accepting transactions and end every subscription.
    fn close(&self);

    fn is_empty(&self) -> Result<bool, ChainError> {
        Ok(self.len()? == 0)
    }

    /// Hash of the head, `None` for an empty log.
    fn head_hash(&self) -> Result<Option<TxHash>, ChainError> {
        match self.head() {
            Ok(tx) => Ok(Some(tx.hash())),
            Err(ChainError::EmptyChain) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
