use std::collections::HashMap;
use std::sync::RwLock;

use iko_types::TxHash;
use tracing::{debug, info};

use crate::check::{TxCheck, Verdict};
use crate::error::ChainError;
use crate::feed::{Subscription, TxFeed, DEFAULT_FEED_CAPACITY};
use crate::traits::ChainLog;
use crate::transaction::Transaction;

/// In-memory chain log for tests, the memory-mode node, and embedding.
///
/// The hash index stores sequence numbers, never references into the
/// backing vector, so growth of the vector cannot invalidate it.
pub struct InMemoryChain {
    inner: RwLock<ChainState>,
}

struct ChainState {
    txs: Vec<Transaction>,
    by_hash: HashMap<TxHash, u64>,
    feed: TxFeed,
    closed: bool,
}

impl InMemoryChain {
    /// Create an empty chain whose subscribers buffer up to `feed_capacity`
    /// transactions each.
    pub fn new(feed_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(ChainState {
                txs: Vec::new(),
                by_hash: HashMap::new(),
                feed: TxFeed::new(feed_capacity),
                closed: false,
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, ChainState>, ChainError> {
        self.inner
            .read()
            .map_err(|_| ChainError::Poisoned("chain read lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, ChainState>, ChainError> {
        self.inner
            .write()
            .map_err(|_| ChainError::Poisoned("chain write lock poisoned".into()))
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl std::fmt::Debug for InMemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.inner.read().map(|s| s.txs.len()).unwrap_or(0);
        f.debug_struct("InMemoryChain").field("len", &len).finish()
    }
}

impl ChainLog for InMemoryChain {
    fn head(&self) -> Result<Transaction, ChainError> {
        let state = self.read()?;
        state.txs.last().cloned().ok_or(ChainError::EmptyChain)
    }

    fn head_seq(&self) -> Result<u64, ChainError> {
        let state = self.read()?;
        match state.txs.len() {
            0 => Err(ChainError::EmptyChain),
            n => Ok(n as u64 - 1),
        }
    }

    fn len(&self) -> Result<u64, ChainError> {
        Ok(self.read()?.txs.len() as u64)
    }

    fn add_tx(&self, tx: Transaction, check: &dyn TxCheck) -> Result<Transaction, ChainError> {
        if self.read()?.closed {
            return Err(ChainError::Closed);
        }

        // The check runs without the lock so readers are never blocked by it.
        if let Verdict::Reject(rejection) = check.check(&tx)? {
            debug!(kitty = %tx.kitty(), %rejection, "tx rejected");
            return Err(ChainError::Rejected(rejection));
        }

        let hash = tx.hash();
        let mut state = self.write()?;
        if state.closed {
            return Err(ChainError::Closed);
        }
        if state.by_hash.contains_key(&hash) {
            return Err(ChainError::DuplicateTx(hash));
        }

        let seq = state.txs.len() as u64;
        let tx = tx.stamped(seq);
        state.txs.push(tx.clone());
        state.by_hash.insert(hash, seq);
        state.feed.publish(&tx);

        debug!(seq, hash = %hash.short_hex(), kitty = %tx.kitty(), "tx appended");
        Ok(tx)
    }

    fn get_tx_of_hash(&self, hash: &TxHash) -> Result<Transaction, ChainError> {
        let state = self.read()?;
        state
            .by_hash
            .get(hash)
            .and_then(|seq| state.txs.get(*seq as usize))
            .cloned()
            .ok_or(ChainError::TxNotFound(*hash))
    }

    fn get_tx_of_seq(&self, seq: u64) -> Result<Transaction, ChainError> {
        let state = self.read()?;
        let len = state.txs.len() as u64;
        if seq >= len {
            return Err(ChainError::SeqOutOfRange { seq, len });
        }
        Ok(state.txs[seq as usize].clone())
    }

    fn get_txs_of_seq_range(
        &self,
        start: u64,
        page_size: u64,
    ) -> Result<Vec<Transaction>, ChainError> {
        if page_size == 0 {
            return Err(ChainError::ZeroPageSize);
        }

        let state = self.read()?;
        let len = state.txs.len() as u64;
        if start >= len {
            return Err(ChainError::SeqOutOfRange { seq: start, len });
        }

        let end = start.saturating_add(page_size).min(len);
        Ok(state.txs[start as usize..end as usize].to_vec())
    }

    fn subscribe(&self) -> Subscription {
        match self.inner.read() {
            Ok(state) => state.feed.subscribe(),
            Err(poisoned) => poisoned.into_inner().feed.subscribe(),
        }
    }

    fn close(&self) {
        let mut state = match self.inner.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.closed {
            return;
        }
        state.closed = true;
        state.feed.close();
        info!(len = state.txs.len(), "chain closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::AcceptAll;
    use crate::error::{CheckError, Rejection};
    use iko_crypto::SigningKey;
    use iko_types::KittyId;
    use proptest::prelude::*;

    fn creator() -> SigningKey {
        SigningKey::from_bytes([1; 32])
    }

    /// Append `count` linked genesis transactions for kitties 0..count.
    fn seeded(count: u64) -> InMemoryChain {
        let chain = InMemoryChain::default();
        let sk = creator();
        for i in 0..count {
            let prev = chain.head().ok();
            let tx = Transaction::genesis(prev.as_ref(), KittyId(i), &sk);
            chain.add_tx(tx, &AcceptAll).unwrap();
        }
        chain
    }

    #[test]
    fn empty_chain_boundaries() {
        let chain = InMemoryChain::default();
        assert_eq!(chain.head(), Err(ChainError::EmptyChain));
        assert_eq!(chain.head_seq(), Err(ChainError::EmptyChain));
        assert_eq!(chain.len().unwrap(), 0);
        assert!(chain.is_empty().unwrap());
        assert_eq!(chain.head_hash().unwrap(), None);
        assert!(chain.head().unwrap_err().is_not_found());
    }

    #[test]
    fn first_admission_becomes_head() {
        let chain = InMemoryChain::default();
        let tx1 = Transaction::genesis(None, KittyId(0), &creator());
        let stored = chain.add_tx(tx1.clone(), &AcceptAll).unwrap();

        assert_eq!(stored.seq(), Some(0));
        assert_eq!(stored.hash(), tx1.hash());
        assert_eq!(chain.head().unwrap(), stored);
        assert_eq!(chain.head_seq().unwrap(), 0);
        assert_eq!(chain.len().unwrap(), 1);
    }

    #[test]
    fn five_genesis_transactions_in_order() {
        let chain = seeded(5);
        assert_eq!(chain.len().unwrap(), 5);
        assert_eq!(chain.head_seq().unwrap(), 4);
        assert_eq!(chain.get_tx_of_seq(3).unwrap().kitty(), KittyId(3));

        let page = chain.get_txs_of_seq_range(2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].seq(), Some(2));
        assert_eq!(page[1].seq(), Some(3));
        assert_eq!(page[0], chain.get_tx_of_seq(2).unwrap());
    }

    #[test]
    fn hash_lookup_agrees_with_seq_lookup() {
        let chain = seeded(6);
        for seq in 0..chain.len().unwrap() {
            let by_seq = chain.get_tx_of_seq(seq).unwrap();
            let by_hash = chain.get_tx_of_hash(&by_seq.hash()).unwrap();
            assert_eq!(by_hash, by_seq);
        }
    }

    #[test]
    fn missing_hash_is_not_found() {
        let chain = seeded(1);
        let missing = TxHash::from_hash([9; 32]);
        assert_eq!(
            chain.get_tx_of_hash(&missing),
            Err(ChainError::TxNotFound(missing))
        );
    }

    #[test]
    fn seq_past_end_is_out_of_range() {
        let chain = seeded(2);
        let err = chain.get_tx_of_seq(2).unwrap_err();
        assert_eq!(err, ChainError::SeqOutOfRange { seq: 2, len: 2 });
        assert!(err.is_out_of_range());
    }

    #[test]
    fn range_rejects_zero_page_and_bad_start() {
        let chain = seeded(3);
        assert_eq!(
            chain.get_txs_of_seq_range(0, 0),
            Err(ChainError::ZeroPageSize)
        );
        assert_eq!(
            chain.get_txs_of_seq_range(3, 1),
            Err(ChainError::SeqOutOfRange { seq: 3, len: 3 })
        );
        assert!(InMemoryChain::default()
            .get_txs_of_seq_range(0, 10)
            .unwrap_err()
            .is_out_of_range());
    }

    #[test]
    fn range_running_past_end_is_short() {
        let chain = seeded(4);
        let page = chain.get_txs_of_seq_range(2, 100).unwrap();
        assert_eq!(page.len(), 2);
        let page = chain.get_txs_of_seq_range(3, u64::MAX).unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn rejected_tx_leaves_no_trace() {
        let chain = seeded(2);
        let head_before = chain.head().unwrap();
        let tx = Transaction::genesis(Some(&head_before), KittyId(10), &creator());
        let hash = tx.hash();

        let reject = |_: &Transaction| -> Result<Verdict, CheckError> {
            Ok(Verdict::Reject(Rejection::InvalidSignature))
        };
        let err = chain.add_tx(tx, &reject).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::InvalidSignature));

        assert_eq!(chain.len().unwrap(), 2);
        assert_eq!(chain.head().unwrap(), head_before);
        assert_eq!(chain.get_tx_of_hash(&hash), Err(ChainError::TxNotFound(hash)));
        assert!(chain
            .get_txs_of_seq_range(0, 10)
            .unwrap()
            .iter()
            .all(|t| t.hash() != hash));
    }

    #[test]
    fn failing_check_is_surfaced_separately() {
        let chain = InMemoryChain::default();
        let tx = Transaction::genesis(None, KittyId(0), &creator());
        let broken = |_: &Transaction| -> Result<Verdict, CheckError> {
            Err(CheckError::new("ownership", "state unavailable"))
        };
        let err = chain.add_tx(tx, &broken).unwrap_err();
        assert!(matches!(err, ChainError::Check(_)));
        assert!(chain.is_empty().unwrap());
    }

    #[test]
    fn duplicate_hash_is_refused() {
        let chain = InMemoryChain::default();
        let tx = Transaction::genesis(None, KittyId(0), &creator());
        chain.add_tx(tx.clone(), &AcceptAll).unwrap();
        assert_eq!(
            chain.add_tx(tx.clone(), &AcceptAll),
            Err(ChainError::DuplicateTx(tx.hash()))
        );
        assert_eq!(chain.len().unwrap(), 1);
    }

    #[test]
    fn subscription_receives_admissions_in_order() {
        let chain = InMemoryChain::default();
        let mut sub = chain.subscribe();
        let sk = creator();
        let mut admitted = Vec::new();
        for i in 0..3 {
            let prev = chain.head().ok();
            let tx = Transaction::genesis(prev.as_ref(), KittyId(i), &sk);
            admitted.push(chain.add_tx(tx, &AcceptAll).unwrap());
        }

        for expected in &admitted {
            assert_eq!(sub.blocking_next().as_ref(), Some(expected));
        }
        chain.close();
        assert_eq!(sub.blocking_next(), None);
    }

    #[test]
    fn closed_chain_refuses_writes_but_serves_reads() {
        let chain = seeded(2);
        chain.close();
        chain.close();
        let tx = Transaction::genesis(None, KittyId(99), &creator());
        assert_eq!(chain.add_tx(tx, &AcceptAll), Err(ChainError::Closed));
        assert_eq!(chain.len().unwrap(), 2);
        assert_eq!(chain.head_seq().unwrap(), 1);
    }

    #[test]
    fn concurrent_distinct_admissions_all_land_once() {
        use std::collections::HashSet;
        use std::sync::Arc;
        use std::thread;

        let chain = Arc::new(seeded(1));
        let threads = 8u64;
        let per_thread = 25u64;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let chain = Arc::clone(&chain);
                thread::spawn(move || {
                    let sk = SigningKey::from_bytes([t as u8 + 10; 32]);
                    for i in 0..per_thread {
                        let tx = Transaction::genesis(None, KittyId(1000 + t * 100 + i), &sk);
                        chain.add_tx(tx, &AcceptAll).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let len = chain.len().unwrap();
        assert_eq!(len, 1 + threads * per_thread);
        assert_eq!(chain.head_seq().unwrap(), len - 1);

        let all = chain.get_txs_of_seq_range(0, len).unwrap();
        let seqs: Vec<u64> = all.iter().map(|t| t.seq().unwrap()).collect();
        assert_eq!(seqs, (0..len).collect::<Vec<_>>());
        let hashes: HashSet<TxHash> = all.iter().map(Transaction::hash).collect();
        assert_eq!(hashes.len() as u64, len);
    }

    #[test]
    fn readers_never_see_len_ahead_of_entries() {
        use std::sync::Arc;
        use std::thread;

        let chain = Arc::new(InMemoryChain::default());
        let writer = {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                let sk = SigningKey::from_bytes([2; 32]);
                for i in 0..200 {
                    let tx = Transaction::genesis(None, KittyId(i), &sk);
                    chain.add_tx(tx, &AcceptAll).unwrap();
                }
            })
        };

        for _ in 0..200 {
            if let Ok(seq) = chain.head_seq() {
                let tx = chain.get_tx_of_seq(seq).unwrap();
                assert_eq!(chain.get_tx_of_hash(&tx.hash()).unwrap().seq(), Some(seq));
            }
        }
        writer.join().expect("writer should not panic");
    }

    proptest! {
        #[test]
        fn range_length_is_min_of_page_and_remaining(
            len in 1u64..24,
            start_frac in 0.0f64..1.0,
            page in 1u64..32,
        ) {
            let chain = seeded(len);
            let start = ((len as f64) * start_frac) as u64;
            let page_txs = chain.get_txs_of_seq_range(start, page).unwrap();

            prop_assert_eq!(page_txs.len() as u64, page.min(len - start));
            for (offset, tx) in page_txs.iter().enumerate() {
                prop_assert_eq!(tx.seq(), Some(start + offset as u64));
            }
        }

        #[test]
        fn range_from_end_always_errors(len in 0u64..10, extra in 0u64..5, page in 0u64..5) {
            let chain = seeded(len);
            let result = chain.get_txs_of_seq_range(len + extra, page);
            prop_assert!(result.unwrap_err().is_out_of_range());
        }
    }
}
