//! In-memory ownership state for tests and the memory-mode node.
//!
//! [`InMemoryState`] keeps all entries in a `BTreeMap` protected by a
//! `RwLock`. Data is lost when the state is dropped; it is re-derived from
//! the chain by replay.

use std::collections::BTreeMap;
use std::sync::RwLock;

use iko_crypto::VerifyingKey;
use iko_types::KittyId;
use tracing::trace;

use crate::error::{Result, StateError};
use crate::traits::OwnershipState;

/// An in-memory implementation of [`OwnershipState`].
#[derive(Debug, Default)]
pub struct InMemoryState {
    owners: RwLock<BTreeMap<KittyId, VerifyingKey>>,
}

impl InMemoryState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry, in ascending kitty order.
    pub fn snapshot(&self) -> Result<BTreeMap<KittyId, VerifyingKey>> {
        let owners = self
            .owners
            .read()
            .map_err(|e| StateError::Poisoned(e.to_string()))?;
        Ok(owners.clone())
    }
}

impl OwnershipState for InMemoryState {
    fn owner_of(&self, kitty: KittyId) -> Result<Option<VerifyingKey>> {
        let owners = self
            .owners
            .read()
            .map_err(|e| StateError::Poisoned(e.to_string()))?;
        Ok(owners.get(&kitty).cloned())
    }

    fn set_owner(&self, kitty: KittyId, owner: VerifyingKey) -> Result<()> {
        let mut owners = self
            .owners
            .write()
            .map_err(|e| StateError::Poisoned(e.to_string()))?;
        trace!(%kitty, owner = %owner.short_hex(), "owner recorded");
        owners.insert(kitty, owner);
        Ok(())
    }

    fn kitty_count(&self) -> Result<u64> {
        let owners = self
            .owners
            .read()
            .map_err(|e| StateError::Poisoned(e.to_string()))?;
        Ok(owners.len() as u64)
    }

    fn kitties_of(&self, owner: &VerifyingKey) -> Result<Vec<KittyId>> {
        let owners = self
            .owners
            .read()
            .map_err(|e| StateError::Poisoned(e.to_string()))?;
        Ok(owners
            .iter()
            .filter(|(_, key)| *key == owner)
            .map(|(kitty, _)| *kitty)
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.owners
            .write()
            .map_err(|e| StateError::Poisoned(e.to_string()))?
            .clear();
        Ok(())
    }
}
