use std::path::Path;

use serde::{Deserialize, Serialize};

use iko_crypto::{SigningKey, VerifyingKey};
use iko_ledger::feed::DEFAULT_FEED_CAPACITY;

use crate::error::{BlockChainError, BlockChainResult};

/// Tuning for a [`BlockChain`](crate::BlockChain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockChainConfig {
    /// Transactions buffered per feed subscriber before the oldest are dropped.
    pub feed_capacity: usize,
    /// Page size used by `txs_page` when the caller gives none.
    pub default_page_size: u64,
    /// Upper bound on any page served by `txs_page`.
    pub max_page_size: u64,
}

impl Default for BlockChainConfig {
    fn default() -> Self {
        Self {
            feed_capacity: DEFAULT_FEED_CAPACITY,
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

impl BlockChainConfig {
    pub fn validate(&self) -> BlockChainResult<()> {
        if self.feed_capacity == 0 {
            return Err(BlockChainError::InvalidConfig(
                "feed_capacity must be at least 1".into(),
            ));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(BlockChainError::InvalidConfig(
                "page sizes must be at least 1".into(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(BlockChainError::InvalidConfig(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

/// Where the chain is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
}

/// Seeding of a fresh node with generated genesis transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub enabled: bool,
    /// Hex secret key that signs the injected transactions.
    pub secret_key: Option<String>,
    /// Number of genesis transactions to inject, for kitties `0..count`.
    pub injection_count: u64,
}

/// Full node configuration, as loaded from `iko.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Hex public key trusted to issue kitties.
    pub master_public_key: Option<String>,
    pub storage: StorageBackend,
    pub chain: BlockChainConfig,
    pub test: TestConfig,
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> BlockChainResult<Self> {
        toml::from_str(s).map_err(|e| BlockChainError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> BlockChainResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BlockChainError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> BlockChainResult<String> {
        toml::to_string_pretty(self).map_err(|e| BlockChainError::Config(e.to_string()))
    }

    /// The creator key; `InvalidConfig` if absent or malformed.
    pub fn master_key(&self) -> BlockChainResult<VerifyingKey> {
        let hex = self.master_public_key.as_deref().ok_or_else(|| {
            BlockChainError::InvalidConfig("master_public_key is required".into())
        })?;
        VerifyingKey::from_hex(hex)
            .map_err(|e| BlockChainError::InvalidConfig(format!("master_public_key: {e}")))
    }

    /// The test injection key, when test mode is on.
    pub fn test_secret_key(&self) -> BlockChainResult<Option<SigningKey>> {
        if !self.test.enabled {
            return Ok(None);
        }
        let hex = self.test.secret_key.as_deref().ok_or_else(|| {
            BlockChainError::InvalidConfig("test mode requires test.secret_key".into())
        })?;
        SigningKey::from_hex(hex)
            .map(Some)
            .map_err(|e| BlockChainError::InvalidConfig(format!("test.secret_key: {e}")))
    }

    pub fn validate(&self) -> BlockChainResult<()> {
        self.chain.validate()?;
        self.master_key()?;
        self.test_secret_key()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn master_hex() -> String {
        SigningKey::from_bytes([1; 32]).verifying_key().to_hex()
    }

    #[test]
    fn default_config() {
        let c = BlockChainConfig::default();
        assert_eq!(c.feed_capacity, DEFAULT_FEED_CAPACITY);
        assert_eq!(c.default_page_size, 100);
        assert_eq!(c.max_page_size, 1000);
        assert!(c.validate().is_ok());

        let node = NodeConfig::default();
        assert_eq!(node.storage, StorageBackend::Memory);
        assert!(!node.test.enabled);
    }

    #[test]
    fn rejects_bad_page_sizes() {
        let zero = BlockChainConfig {
            default_page_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(BlockChainError::InvalidConfig(_))));

        let inverted = BlockChainConfig {
            default_page_size: 50,
            max_page_size: 10,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(BlockChainError::InvalidConfig(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = format!(
            r#"
master_public_key = "{}"

[chain]
max_page_size = 50
"#,
            master_hex()
        );
        let c = NodeConfig::from_toml_str(&toml).unwrap();
        assert_eq!(c.chain.max_page_size, 50);
        assert_eq!(c.chain.default_page_size, 100);
        assert_eq!(c.master_key().unwrap(), SigningKey::from_bytes([1; 32]).verifying_key());
        assert!(matches!(c.validate(), Err(BlockChainError::InvalidConfig(_))));
    }

    #[test]
    fn missing_master_key_is_invalid() {
        let c = NodeConfig::default();
        assert!(matches!(c.master_key(), Err(BlockChainError::InvalidConfig(_))));

        let bad = NodeConfig {
            master_public_key: Some("zz".into()),
            ..Default::default()
        };
        assert!(matches!(bad.master_key(), Err(BlockChainError::InvalidConfig(_))));
    }

    #[test]
    fn test_mode_requires_secret_key() {
        let mut c = NodeConfig {
            master_public_key: Some(master_hex()),
            ..Default::default()
        };
        assert!(c.test_secret_key().unwrap().is_none());

        c.test.enabled = true;
        assert!(c.test_secret_key().is_err());

        let sk = SigningKey::from_bytes([5; 32]);
        c.test.secret_key = Some(sk.to_hex());
        c.test.injection_count = 3;
        let loaded = c.test_secret_key().unwrap().unwrap();
        assert_eq!(loaded.verifying_key(), sk.verifying_key());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn unknown_storage_backend_fails_to_parse() {
        let err = NodeConfig::from_toml_str("storage = \"rocksdb\"").unwrap_err();
        assert!(matches!(err, BlockChainError::Config(_)));
    }

    #[test]
    fn load_from_file_round_trips() {
        let original = NodeConfig {
            master_public_key: Some(master_hex()),
            test: TestConfig {
                enabled: true,
                secret_key: Some(SigningKey::from_bytes([5; 32]).to_hex()),
                injection_count: 10,
            },
            ..Default::default()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(original.to_toml_string().unwrap().as_bytes())
            .unwrap();
        let loaded = NodeConfig::load(file.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, BlockChainError::Config(_)));
    }
}
