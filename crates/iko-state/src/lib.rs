//! Ownership state for the IKO kitty ledger.
//!
//! The ownership state is a projection of the transaction chain: it maps
//! each kitty to the key that currently owns it. It is read by transaction
//! validation and written only by the post-commit projection, in commit
//! order.
//!
//! # Modules
//!
//! - [`error`]: Error types for state operations
//! - [`traits`]: The [`OwnershipState`] contract
//! - [`memory`]: In-memory [`InMemoryState`]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StateError};
pub use memory::InMemoryState;
pub use traits::OwnershipState;
