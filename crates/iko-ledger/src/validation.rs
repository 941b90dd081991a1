use iko_crypto::HashChainVerifier;
use iko_types::TxHash;

use crate::error::ChainError;
use crate::replay::{walk_chain, DEFAULT_REPLAY_PAGE_SIZE};
use crate::traits::ChainLog;

/// Result of a chain audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub tx_count: u64,
    pub head: Option<TxHash>,
    pub sequence_contiguous: bool,
    pub hash_chain_valid: bool,
    pub signatures_valid: bool,
    pub index_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    InvalidSignature,
    IndexMismatch,
}

/// Chain integrity validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Audit every transaction of `log`.
    ///
    /// Checks contiguous sequence numbers, prev-hash links, signatures, and
    /// that the hash index resolves each transaction to its own position.
    /// Violations are collected, not short-circuited.
    pub fn validate(log: &dyn ChainLog) -> Result<ValidationReport, ChainError> {
        let mut violations = Vec::new();
        let mut sequence_contiguous = true;
        let mut hash_chain_valid = true;
        let mut signatures_valid = true;
        let mut index_consistent = true;
        let mut anchor: Option<TxHash> = None;
        let mut expected_seq = 0u64;

        let tx_count = walk_chain(log, None, DEFAULT_REPLAY_PAGE_SIZE, |tx| {
            let seq = tx.seq().unwrap_or(expected_seq);
            if tx.seq() != Some(expected_seq) {
                sequence_contiguous = false;
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {:?}", tx.seq()),
                });
            }

            if let Err(e) = HashChainVerifier::verify_segment(anchor, std::slice::from_ref(tx)) {
                hash_chain_valid = false;
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::HashChainBreak,
                    description: e.to_string(),
                });
            }

            if let Err(e) = tx.verify_signature() {
                signatures_valid = false;
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::InvalidSignature,
                    description: e.to_string(),
                });
            }

            let hash = tx.hash();
            match log.get_tx_of_hash(&hash) {
                Ok(indexed) if indexed.seq() == tx.seq() => {}
                Ok(indexed) => {
                    index_consistent = false;
                    violations.push(Violation {
                        seq,
                        kind: ViolationKind::IndexMismatch,
                        description: format!(
                            "hash {} resolves to seq {:?}",
                            hash.short_hex(),
                            indexed.seq()
                        ),
                    });
                }
                Err(ChainError::TxNotFound(_)) => {
                    index_consistent = false;
                    violations.push(Violation {
                        seq,
                        kind: ViolationKind::IndexMismatch,
                        description: format!("hash {} is not indexed", hash.short_hex()),
                    });
                }
                Err(e) => return Err(e),
            }

            anchor = Some(hash);
            expected_seq += 1;
            Ok(())
        })?;

        Ok(ValidationReport {
            tx_count,
            head: anchor,
            sequence_contiguous,
            hash_chain_valid,
            signatures_valid,
            index_consistent,
            violations,
        })
    }
}
