use thiserror::Error;

/// Failures parsing kitty ids and transaction hashes from text or bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("not valid hex: {0}")]
    InvalidHex(String),

    #[error("wrong length: want {expected} bytes, have {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("cannot parse kitty id: {0}")]
    InvalidKittyId(String),
}
