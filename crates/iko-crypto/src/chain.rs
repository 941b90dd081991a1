use iko_types::TxHash;

/// Trait for entries that participate in a hash-linked chain.
pub trait ChainLinked {
    /// The entry's own content hash.
    fn tx_hash(&self) -> TxHash;
    /// The hash of the entry immediately before it (None for the first entry).
    fn prev_hash(&self) -> Option<TxHash>;
}

/// Hash-link integrity verifier.
///
/// Verifies that a slice of entries forms one unbroken linear chain: each
/// entry's `prev_hash` equals the previous entry's `tx_hash`.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain that starts at the very beginning of the ledger.
    pub fn verify_chain<T: ChainLinked>(entries: &[T]) -> Result<(), ChainLinkError> {
        Self::verify_segment(None, entries)
    }

    /// Verify a segment whose first entry must link to `anchor`.
    ///
    /// `anchor` is the hash of the entry preceding the segment, or `None`
    /// when the segment begins at the genesis of the ledger.
    pub fn verify_segment<T: ChainLinked>(
        anchor: Option<TxHash>,
        entries: &[T],
    ) -> Result<(), ChainLinkError> {
        let mut expected = anchor;
        for (index, entry) in entries.iter().enumerate() {
            match (expected, entry.prev_hash()) {
                (None, None) => {}
                (None, Some(_)) if index == 0 => return Err(ChainLinkError::GenesisHasPrevHash),
                (Some(want), Some(got)) if want == got => {}
                (Some(_), Some(_)) | (None, Some(_)) => {
                    return Err(ChainLinkError::BrokenLink { index })
                }
                (Some(_), None) => return Err(ChainLinkError::MissingPrevHash { index }),
            }
            expected = Some(entry.tx_hash());
        }
        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainLinkError {
    #[error("first entry has a previous hash (should be None)")]
    GenesisHasPrevHash,

    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing prev_hash at index {index} (should reference previous entry)")]
    MissingPrevHash { index: usize },
}
