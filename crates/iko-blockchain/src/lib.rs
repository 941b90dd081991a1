//! Ledger orchestrator for the IKO kitty ledger.
//!
//! [`BlockChain`] is the single write path into a chain: every injected
//! transaction is checked for linkage, signature, authority and ownership,
//! appended, and then projected into the ownership state before the next
//! injection may start.
//!
//! # Modules
//!
//! - [`blockchain`]: [`BlockChain`] and its builder
//! - [`config`]: Orchestrator and node configuration (TOML)
//! - [`hooks`]: Post-commit actions
//! - [`shutdown`]: Cooperative shutdown signal
//! - [`error`]: Error types

pub mod blockchain;
pub mod config;
pub mod error;
pub mod hooks;
pub mod shutdown;

pub use blockchain::{BlockChain, BlockChainBuilder};
pub use config::{BlockChainConfig, NodeConfig, StorageBackend, TestConfig};
pub use error::{BlockChainError, BlockChainResult};
pub use hooks::{HookError, NoOpHook, OwnershipHook, PostCommitHook};
pub use shutdown::{Shutdown, ShutdownListener};
