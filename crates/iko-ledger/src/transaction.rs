use std::fmt;

use serde::{Deserialize, Serialize};

use iko_crypto::{ChainLinked, ContentHasher, Signature, SignatureError, SigningKey, VerifyingKey};
use iko_types::{KittyId, TxHash};

const OP_GENESIS: u8 = 0;
const OP_TRANSFER: u8 = 1;

/// The ownership effect of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxOperation {
    /// Issue a kitty to its first owner.
    Genesis { owner: VerifyingKey },
    /// Move a kitty from its current owner to a new one.
    Transfer {
        from: VerifyingKey,
        to: VerifyingKey,
    },
}

/// One signed, hash-linked ownership event for exactly one kitty.
///
/// `prev` links to the immediately preceding transaction of the *global*
/// chain, so all kitties share one total order. The sequence number is
/// stamped by the chain log on admission and is not part of the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
    prev: Option<TxHash>,
    kitty: KittyId,
    signer: VerifyingKey,
    op: TxOperation,
    sig: Signature,
}

impl Transaction {
    /// Build and sign a transaction linked after `prev`.
    pub fn new_signed(
        prev: Option<TxHash>,
        kitty: KittyId,
        op: TxOperation,
        signer: &SigningKey,
    ) -> Self {
        let signer_key = signer.verifying_key();
        let hash = content_hash(prev, kitty, &signer_key, &op);
        Self {
            seq: None,
            prev,
            kitty,
            signer: signer_key,
            op,
            sig: signer.sign(hash.as_bytes()),
        }
    }

    /// Genesis transaction issuing `kitty` to the signer's own key.
    ///
    /// `prev` is `None` only for the very first transaction of the chain.
    /// Construction never fails and performs no chain or ownership checks.
    pub fn genesis(prev: Option<&Transaction>, kitty: KittyId, signer: &SigningKey) -> Self {
        let op = TxOperation::Genesis {
            owner: signer.verifying_key(),
        };
        Self::new_signed(prev.map(Transaction::hash), kitty, op, signer)
    }

    /// Transfer of `kitty` from the signer's key to `to`.
    pub fn transfer(
        prev: Option<&Transaction>,
        kitty: KittyId,
        to: VerifyingKey,
        signer: &SigningKey,
    ) -> Self {
        let op = TxOperation::Transfer {
            from: signer.verifying_key(),
            to,
        };
        Self::new_signed(prev.map(Transaction::hash), kitty, op, signer)
    }

    /// Content hash over the canonical encoding.
    pub fn hash(&self) -> TxHash {
        content_hash(self.prev, self.kitty, &self.signer, &self.op)
    }

    /// Check the signature against the signer key and content hash.
    pub fn verify_signature(&self) -> Result<(), SignatureError> {
        self.signer.verify(self.hash().as_bytes(), &self.sig)
    }

    /// Copy of this transaction carrying its admitted position.
    ///
    /// Called by [`ChainLog`](crate::ChainLog) implementations on admission.
    pub fn stamped(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Position in the chain; `None` until admitted.
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    pub fn prev(&self) -> Option<TxHash> {
        self.prev
    }

    pub fn kitty(&self) -> KittyId {
        self.kitty
    }

    pub fn signer(&self) -> &VerifyingKey {
        &self.signer
    }

    pub fn op(&self) -> &TxOperation {
        &self.op
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.op, TxOperation::Genesis { .. })
    }

    /// The key that owns the kitty once this transaction is applied.
    pub fn new_owner(&self) -> &VerifyingKey {
        match &self.op {
            TxOperation::Genesis { owner } => owner,
            TxOperation::Transfer { to, .. } => to,
        }
    }
}

impl ChainLinked for Transaction {
    fn tx_hash(&self) -> TxHash {
        self.hash()
    }

    fn prev_hash(&self) -> Option<TxHash> {
        self.prev
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seq {
            Some(seq) => write!(f, "tx#{seq} ")?,
            None => write!(f, "tx ")?,
        }
        write!(f, "{} {}", self.hash().short_hex(), self.kitty)?;
        match &self.op {
            TxOperation::Genesis { owner } => write!(f, " genesis -> {}", owner.short_hex()),
            TxOperation::Transfer { from, to } => {
                write!(f, " {} -> {}", from.short_hex(), to.short_hex())
            }
        }
    }
}

/// Canonical encoding:
///
/// ```text
/// "iko-tx-v1:" || prev_flag(u8) || prev(32, if flag = 1) || kitty(u64 LE)
///             || signer(32) || op_tag(u8) || genesis: owner(32)
///                                            transfer: from(32) || to(32)
/// ```
fn content_hash(
    prev: Option<TxHash>,
    kitty: KittyId,
    signer: &VerifyingKey,
    op: &TxOperation,
) -> TxHash {
    let mut buf = Vec::with_capacity(1 + 32 + 8 + 32 + 1 + 64);
    match prev {
        Some(hash) => {
            buf.push(1);
            buf.extend_from_slice(hash.as_bytes());
        }
        None => buf.push(0),
    }
    buf.extend_from_slice(&kitty.to_le_bytes());
    buf.extend_from_slice(&signer.as_bytes());
    match op {
        TxOperation::Genesis { owner } => {
            buf.push(OP_GENESIS);
            buf.extend_from_slice(&owner.as_bytes());
        }
        TxOperation::Transfer { from, to } => {
            buf.push(OP_TRANSFER);
            buf.extend_from_slice(&from.as_bytes());
            buf.extend_from_slice(&to.as_bytes());
        }
    }
    ContentHasher::TX.hash(&buf)
}
