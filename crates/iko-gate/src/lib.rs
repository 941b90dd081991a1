//! Admission gate for the IKO kitty ledger.
//!
//! Every transaction injected into a blockchain passes through the gate
//! before the chain log appends it. The gate runs a pipeline of stages
//! (linkage, signature, authority, ownership) and produces a verdict with a
//! per-stage trail.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use iko_crypto::SigningKey;
//! use iko_gate::TxGate;
//! use iko_ledger::{InMemoryChain, Transaction};
//! use iko_state::InMemoryState;
//! use iko_types::KittyId;
//!
//! let creator = SigningKey::generate();
//! let chain = Arc::new(InMemoryChain::default());
//! let state = Arc::new(InMemoryState::new());
//! let gate = TxGate::with_default_stages(chain.clone(), state, creator.verifying_key());
//!
//! let tx = Transaction::genesis(None, KittyId(0), &creator);
//! let result = gate.evaluate(&tx).unwrap();
//! assert!(result.is_accepted());
//! ```

pub mod error;
pub mod gate;
pub mod stage;
pub mod stages;

pub use error::GateError;
pub use gate::{GateResult, TxGate};
pub use stage::{GateContext, StageDecision, StageResult, TxStage};
pub use stages::{AuthorityStage, LinkageStage, OwnershipStage, SignatureStage};
