//! Cryptographic primitives for the IKO kitty ledger.
//!
//! Provides domain-separated BLAKE3 hashing, Ed25519 signing/verification,
//! and hash-link verification for transaction chains.
//!
//! All crypto operations wrap established libraries.

pub mod chain;
pub mod hasher;
pub mod signer;

pub use chain::{ChainLinkError, ChainLinked, HashChainVerifier};
pub use hasher::ContentHasher;
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
