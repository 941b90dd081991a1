use iko_state::OwnershipState;
use tracing::info;

use crate::error::{ChainError, ReplayError};
use crate::projection::OwnershipProjection;
use crate::traits::ChainLog;
use crate::transaction::Transaction;

/// Page size used when callers do not supply one.
pub const DEFAULT_REPLAY_PAGE_SIZE: u64 = 256;

/// Result of re-deriving ownership state from a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    /// Transactions applied.
    pub applied: u64,
    /// Kitties with an owner afterwards.
    pub kitties: u64,
}

/// Deterministic replay of a chain into ownership state.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Clear `state` and re-apply every transaction of `log` in sequence order.
    ///
    /// The log is read in pages of `page_size`; a zero page size falls back
    /// to [`DEFAULT_REPLAY_PAGE_SIZE`]. Transactions admitted while the replay
    /// runs may or may not be included.
    pub fn replay_into(
        log: &dyn ChainLog,
        state: &dyn OwnershipState,
        page_size: u64,
    ) -> Result<ReplayResult, ReplayError> {
        let page_size = if page_size == 0 {
            DEFAULT_REPLAY_PAGE_SIZE
        } else {
            page_size
        };

        state.clear()?;
        let applied = walk_chain(log, None, page_size, |tx| {
            OwnershipProjection::apply(state, tx).map_err(ReplayError::from)
        })?;
        let kitties = state.kitty_count()?;

        info!(applied, kitties, "ownership state replayed from chain");
        Ok(ReplayResult { applied, kitties })
    }
}

/// Visit transactions from seq 0 up to `upto` (inclusive, clamped to the
/// head) in order, one page at a time. Returns how many were visited.
pub(crate) fn walk_chain<E, F>(
    log: &dyn ChainLog,
    upto: Option<u64>,
    page_size: u64,
    mut visit: F,
) -> Result<u64, E>
where
    E: From<ChainError>,
    F: FnMut(&Transaction) -> Result<(), E>,
{
    let len = log.len()?;
    let end = match upto {
        Some(upto) => upto.saturating_add(1).min(len),
        None => len,
    };

    let mut next = 0u64;
    while next < end {
        let page = log.get_txs_of_seq_range(next, page_size.min(end - next))?;
        if page.is_empty() {
            break;
        }
        for tx in &page {
            visit(tx)?;
        }
        next += page.len() as u64;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::AcceptAll;
    use crate::memory::InMemoryChain;
    use iko_crypto::{SigningKey, VerifyingKey};
    use iko_state::{InMemoryState, StateError};
    use iko_types::KittyId;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes([seed; 32])
    }

    fn chain_with_transfers() -> InMemoryChain {
        let creator = key(1);
        let alice = key(2);
        let chain = InMemoryChain::default();
        for i in 0..5 {
            let head = chain.head().ok();
            chain
                .add_tx(Transaction::genesis(head.as_ref(), KittyId(i), &creator), &AcceptAll)
                .unwrap();
        }
        let head = chain.head().unwrap();
        let tx = Transaction::transfer(Some(&head), KittyId(2), alice.verifying_key(), &creator);
        chain.add_tx(tx, &AcceptAll).unwrap();
        chain
    }

    #[test]
    fn replay_rebuilds_owners() {
        let chain = chain_with_transfers();
        let state = InMemoryState::new();
        let result = ReplayEngine::replay_into(&chain, &state, 2).unwrap();

        assert_eq!(result, ReplayResult { applied: 6, kitties: 5 });
        assert_eq!(state.owner_of(KittyId(2)).unwrap(), Some(key(2).verifying_key()));
        assert_eq!(state.owner_of(KittyId(4)).unwrap(), Some(key(1).verifying_key()));
    }

    #[test]
    fn replay_discards_stale_entries() {
        let chain = chain_with_transfers();
        let state = InMemoryState::new();
        state.set_owner(KittyId(77), key(9).verifying_key()).unwrap();
        state.set_owner(KittyId(2), key(9).verifying_key()).unwrap();

        ReplayEngine::replay_into(&chain, &state, 0).unwrap();
        assert_eq!(state.owner_of(KittyId(77)).unwrap(), None);
        assert_eq!(state.owner_of(KittyId(2)).unwrap(), Some(key(2).verifying_key()));
    }

    #[test]
    fn replay_of_empty_chain_clears_state() {
        let chain = InMemoryChain::default();
        let state = InMemoryState::new();
        state.set_owner(KittyId(1), key(1).verifying_key()).unwrap();

        let result = ReplayEngine::replay_into(&chain, &state, 10).unwrap();
        assert_eq!(result, ReplayResult { applied: 0, kitties: 0 });
    }

    struct FailingState;

    impl OwnershipState for FailingState {
        fn owner_of(&self, _: KittyId) -> iko_state::Result<Option<VerifyingKey>> {
            Ok(None)
        }
        fn set_owner(&self, _: KittyId, _: VerifyingKey) -> iko_state::Result<()> {
            Err(StateError::Backend("disk full".into()))
        }
        fn kitty_count(&self) -> iko_state::Result<u64> {
            Ok(0)
        }
        fn kitties_of(&self, _: &VerifyingKey) -> iko_state::Result<Vec<KittyId>> {
            Ok(Vec::new())
        }
        fn clear(&self) -> iko_state::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn state_failure_is_reported() {
        let chain = chain_with_transfers();
        let err = ReplayEngine::replay_into(&chain, &FailingState, 4).unwrap_err();
        assert_eq!(err, ReplayError::State(StateError::Backend("disk full".into())));
    }

    #[test]
    fn walk_stops_at_upto() {
        let chain = chain_with_transfers();
        let mut seen = Vec::new();
        let visited = walk_chain(&chain, Some(2), 1, |tx| {
            seen.push(tx.seq());
            Ok::<(), ChainError>(())
        })
        .unwrap();
        assert_eq!(visited, 3);
        assert_eq!(seen, vec![Some(0), Some(1), Some(2)]);
    }
}
