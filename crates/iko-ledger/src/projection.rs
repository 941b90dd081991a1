use std::collections::BTreeMap;

use iko_crypto::VerifyingKey;
use iko_state::{OwnershipState, StateError};
use iko_types::KittyId;
use tracing::trace;

use crate::error::ChainError;
use crate::replay::{walk_chain, DEFAULT_REPLAY_PAGE_SIZE};
use crate::traits::ChainLog;
use crate::transaction::Transaction;

/// Applies admitted transactions to an ownership state.
///
/// Must be fed in commit order; applying is not idempotent across reorders.
pub struct OwnershipProjection;

impl OwnershipProjection {
    /// Record the transaction's new owner for its kitty.
    pub fn apply(state: &dyn OwnershipState, tx: &Transaction) -> Result<(), StateError> {
        state.set_owner(tx.kitty(), tx.new_owner().clone())?;
        trace!(kitty = %tx.kitty(), owner = %tx.new_owner().short_hex(), "ownership projected");
        Ok(())
    }
}

/// Read-only views computed directly from a chain log.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Owner of every kitty as of sequence `upto_seq` (inclusive).
    ///
    /// `upto_seq` past the head is clamped to the head.
    pub fn owners_at(
        log: &dyn ChainLog,
        upto_seq: u64,
    ) -> Result<BTreeMap<KittyId, VerifyingKey>, ChainError> {
        let mut owners = BTreeMap::new();
        walk_chain(log, Some(upto_seq), DEFAULT_REPLAY_PAGE_SIZE, |tx| {
            owners.insert(tx.kitty(), tx.new_owner().clone());
            Ok::<(), ChainError>(())
        })?;
        Ok(owners)
    }

    /// Every transaction touching `kitty`, oldest first.
    pub fn kitty_history(
        log: &dyn ChainLog,
        kitty: KittyId,
    ) -> Result<Vec<Transaction>, ChainError> {
        let mut history = Vec::new();
        walk_chain(log, None, DEFAULT_REPLAY_PAGE_SIZE, |tx| {
            if tx.kitty() == kitty {
                history.push(tx.clone());
            }
            Ok::<(), ChainError>(())
        })?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::AcceptAll;
    use crate::memory::InMemoryChain;
    use iko_crypto::SigningKey;
    use iko_state::InMemoryState;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes([seed; 32])
    }

    fn append(chain: &InMemoryChain, build: impl FnOnce(Option<&Transaction>) -> Transaction) {
        let head = chain.head().ok();
        chain.add_tx(build(head.as_ref()), &AcceptAll).unwrap();
    }

    /// kitty 0 and 1 issued by creator, kitty 0 sent to alice, then to bob.
    fn history_chain() -> InMemoryChain {
        let creator = key(1);
        let alice = key(2);
        let bob = key(3).verifying_key();
        let chain = InMemoryChain::default();
        append(&chain, |p| Transaction::genesis(p, KittyId(0), &creator));
        append(&chain, |p| Transaction::genesis(p, KittyId(1), &creator));
        append(&chain, |p| {
            Transaction::transfer(p, KittyId(0), alice.verifying_key(), &creator)
        });
        append(&chain, |p| Transaction::transfer(p, KittyId(0), bob, &alice));
        chain
    }

    #[test]
    fn apply_sets_new_owner() {
        let state = InMemoryState::new();
        let creator = key(1);
        let alice = key(2).verifying_key();

        let genesis = Transaction::genesis(None, KittyId(4), &creator);
        OwnershipProjection::apply(&state, &genesis).unwrap();
        assert_eq!(state.owner_of(KittyId(4)).unwrap(), Some(creator.verifying_key()));

        let transfer = Transaction::transfer(Some(&genesis), KittyId(4), alice.clone(), &creator);
        OwnershipProjection::apply(&state, &transfer).unwrap();
        assert_eq!(state.owner_of(KittyId(4)).unwrap(), Some(alice));
        assert_eq!(state.kitty_count().unwrap(), 1);
    }

    #[test]
    fn owners_at_each_point_in_history() {
        let chain = history_chain();
        let creator = key(1).verifying_key();

        let at_1 = ProjectionBuilder::owners_at(&chain, 1).unwrap();
        assert_eq!(at_1.get(&KittyId(0)), Some(&creator));
        assert_eq!(at_1.len(), 2);

        let at_2 = ProjectionBuilder::owners_at(&chain, 2).unwrap();
        assert_eq!(at_2.get(&KittyId(0)), Some(&key(2).verifying_key()));

        let latest = ProjectionBuilder::owners_at(&chain, u64::MAX).unwrap();
        assert_eq!(latest.get(&KittyId(0)), Some(&key(3).verifying_key()));
        assert_eq!(latest.get(&KittyId(1)), Some(&creator));
    }

    #[test]
    fn owners_of_empty_chain_is_empty() {
        let chain = InMemoryChain::default();
        assert!(ProjectionBuilder::owners_at(&chain, 0).unwrap().is_empty());
    }

    #[test]
    fn kitty_history_is_ordered() {
        let chain = history_chain();
        let history = ProjectionBuilder::kitty_history(&chain, KittyId(0)).unwrap();
        let seqs: Vec<_> = history.iter().filter_map(Transaction::seq).collect();
        assert_eq!(seqs, vec![0, 2, 3]);
        assert!(history[0].is_genesis());

        let untouched = ProjectionBuilder::kitty_history(&chain, KittyId(9)).unwrap();
        assert!(untouched.is_empty());
    }
}
