//! Ed25519 keys and signatures for kitty ownership.
//!
//! Keys and signatures serialize as lowercase hex strings so transactions
//! read naturally in JSON and keys can be pasted into TOML configuration.

use std::fmt;

use ed25519_dalek::Signer as _;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Secret key of a kitty owner or of the creator.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Public key identifying a kitty owner.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// Signature over a transaction's content hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

/// Errors from key parsing and signature checks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),
}

impl SigningKey {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::thread_rng()))
    }

    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&secret))
    }

    /// Parse a 64-character hex secret, as printed by `iko keygen`.
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        decode_hex::<32>(s).map(Self::from_bytes)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Hex secret. Only for handing keys to operators.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl VerifyingKey {
    /// Check `signature` over `message`. Uses strict verification, so
    /// malleable signature encodings are refused.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        self.0
            .verify_strict(message, &signature.0)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Fails with `InvalidKey` if the bytes are not a valid curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, SignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidKey)
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        Self::from_bytes(decode_hex::<32>(s)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// First 8 hex characters, for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(&bytes))
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        decode_hex::<64>(s).map(Self::from_bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"<redacted>").finish()
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerifyingKey").field(&self.short_hex()).finish()
    }
}

impl fmt::Display for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}..)", &hex[..16])
    }
}

fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], SignatureError> {
    let mut out = [0u8; N];
    let s = s.trim();
    if s.len() != N * 2 {
        return Err(SignatureError::InvalidEncoding(format!(
            "expected {} hex characters, got {}",
            N * 2,
            s.len()
        )));
    }
    hex::decode_to_slice(s, &mut out)
        .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_hash_verifies_under_owner_key() {
        let owner = SigningKey::generate();
        let hash = [9u8; 32];
        let sig = owner.sign(&hash);
        assert!(owner.verifying_key().verify(&hash, &sig).is_ok());
    }

    #[test]
    fn other_message_fails() {
        let owner = SigningKey::from_bytes([1; 32]);
        let sig = owner.sign(b"kitty#1 -> alice");
        assert_eq!(
            owner.verifying_key().verify(b"kitty#1 -> mallory", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn other_key_fails() {
        let alice = SigningKey::from_bytes([1; 32]);
        let mallory = SigningKey::from_bytes([2; 32]);
        let sig = alice.sign(b"transfer");
        assert!(mallory.verifying_key().verify(b"transfer", &sig).is_err());
    }

    #[test]
    fn keys_parse_from_their_hex() {
        let sk = SigningKey::generate();
        let restored = SigningKey::from_hex(&sk.to_hex()).unwrap();
        assert_eq!(sk.verifying_key(), restored.verifying_key());

        let vk = sk.verifying_key();
        assert_eq!(VerifyingKey::from_hex(&format!(" {} ", vk.to_hex())).unwrap(), vk);
    }

    #[test]
    fn wrong_length_hex_is_an_encoding_error() {
        assert!(matches!(
            VerifyingKey::from_hex("abcd"),
            Err(SignatureError::InvalidEncoding(_))
        ));
        assert!(matches!(
            SigningKey::from_hex(&"zz".repeat(32)),
            Err(SignatureError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn json_uses_hex_strings() {
        let sk = SigningKey::from_bytes([7; 32]);
        let vk = sk.verifying_key();
        assert_eq!(serde_json::to_string(&vk).unwrap(), format!("\"{}\"", vk.to_hex()));

        let sig = sk.sign(b"kitty");
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn keys_work_as_map_keys() {
        use std::collections::HashMap;
        let vk = SigningKey::from_bytes([3; 32]).verifying_key();
        let mut owned = HashMap::new();
        owned.insert(vk.clone(), 2u32);
        assert_eq!(owned.get(&vk), Some(&2));
    }

    #[test]
    fn debug_output_hides_secret() {
        let sk = SigningKey::from_bytes([5; 32]);
        let shown = format!("{sk:?}");
        assert!(shown.contains("redacted"));
        assert!(!shown.contains(&sk.to_hex()));
    }
}
