//! Append-only transaction chain for the IKO kitty ledger.
//!
//! This crate is the heart of IKO. It provides:
//! - Signed, hash-linked [`Transaction`]s with genesis and transfer factories
//! - The [`ChainLog`] storage contract and the [`TxCheck`] admission strategy
//! - [`InMemoryChain`], the reference implementation
//! - A bounded subscription feed of newly admitted transactions
//! - Ownership projection, deterministic replay, and chain audit

pub mod check;
pub mod error;
pub mod feed;
pub mod memory;
pub mod projection;
pub mod replay;
pub mod traits;
pub mod transaction;
pub mod validation;

pub use check::{AcceptAll, TxCheck, Verdict};
pub use error::{ChainError, CheckError, Rejection, ReplayError};
pub use feed::{Subscription, TxFeed};
pub use memory::InMemoryChain;
pub use projection::{OwnershipProjection, ProjectionBuilder};
pub use replay::{ReplayEngine, ReplayResult};
pub use traits::ChainLog;
pub use transaction::{Transaction, TxOperation};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
