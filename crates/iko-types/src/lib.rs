//! Foundation types for the IKO kitty ledger.
//!
//! Every other IKO crate depends on `iko-types`.
//!
//! # Key Types
//!
//! - [`KittyId`]: Integer identifier of one non-fungible kitty
//! - [`TxHash`]: Content-derived identity of a ledger transaction

pub mod error;
pub mod hash;
pub mod kitty;

pub use error::TypeError;
pub use hash::TxHash;
pub use kitty::KittyId;
