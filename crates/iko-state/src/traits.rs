//! The [`OwnershipState`] trait defining the ownership storage interface.

use iko_crypto::VerifyingKey;
use iko_types::KittyId;

use crate::error::Result;

/// Storage backend mapping each kitty to its current owner.
///
/// Implementations must be thread-safe (`Send + Sync`). Entries are created
/// when a kitty's genesis transaction is admitted and updated on each
/// admitted transfer; they are never removed while the kitty exists.
pub trait OwnershipState: Send + Sync {
    /// The current owner of `kitty`, or `Ok(None)` if it was never issued.
    fn owner_of(&self, kitty: KittyId) -> Result<Option<VerifyingKey>>;

    /// Record `owner` as the current owner of `kitty`.
    fn set_owner(&self, kitty: KittyId, owner: VerifyingKey) -> Result<()>;

    /// Number of kitties with a recorded owner.
    fn kitty_count(&self) -> Result<u64>;

    /// All kitties currently owned by `owner`, in ascending id order.
    fn kitties_of(&self, owner: &VerifyingKey) -> Result<Vec<KittyId>>;

    /// Forget every entry. Only used when re-deriving the state by replay.
    fn clear(&self) -> Result<()>;

    /// Whether `kitty` has been issued.
    fn exists(&self, kitty: KittyId) -> Result<bool> {
        Ok(self.owner_of(kitty)?.is_some())
    }
}
