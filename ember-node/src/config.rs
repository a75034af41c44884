use std::path::Path;

use ember_types::fixed::Fixed;
use ember_types::primitives::{AccountId, Algorithm, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Name of the configuration file written by [`NodeConfig::init`].
pub const CONFIG_FILE_NAME: &str = "ember.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend: "memory" or "sqlite".
    pub db_type: String,
    /// Database file for the sqlite backend.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Initial state seeded by the `genesis` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Nanosecond timestamp the genesis pledges are made at.
    #[serde(default)]
    pub time: Timestamp,
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

/// One pre-funded account.
///
/// `balance` is the account's whole allocation; `pledge` is taken out of it
/// and locked in the gas contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub id: AccountId,
    pub algorithm: Algorithm,
    /// Hex-encoded public key.
    pub pubkey: String,
    pub balance: Fixed,
    #[serde(default = "zero_amount")]
    pub pledge: Fixed,
}

fn zero_amount() -> Fixed {
    Fixed::zero(ember_types::constants::AMOUNT_DECIMALS)
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                db_type: "sqlite".to_string(),
                path: dirs::home_dir()
                    .map(|h| h.join(".ember").join("state.db").to_string_lossy().into_owned())
                    .unwrap_or_else(|| "./ember-data/state.db".to_string()),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            genesis: GenesisConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path, e),
        })?;
        let config: NodeConfig = toml::from_str(&contents).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to parse config file '{}': {}", path, e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Initialize a default configuration file in the given directory.
    pub fn init(dir: &str) -> Result<(), NodeError> {
        let dir_path = Path::new(dir);
        if !dir_path.exists() {
            std::fs::create_dir_all(dir_path)?;
        }

        let config = NodeConfig::default();
        let toml_str = toml::to_string_pretty(&config).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to serialize default config: {}", e),
        })?;

        let config_path = dir_path.join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, toml_str)?;

        Ok(())
    }

    fn validate(&self) -> Result<(), NodeError> {
        match self.storage.db_type.as_str() {
            "memory" | "sqlite" => Ok(()),
            other => Err(NodeError::ConfigError {
                reason: format!("unknown storage backend '{other}', expected 'memory' or 'sqlite'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.storage.db_type, "sqlite");
        assert!(config.storage.path.ends_with("state.db"));
        assert_eq!(config.logging.level, "info");
        assert!(config.genesis.accounts.is_empty());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = NodeConfig::default();
        config.genesis.time = 1_700_000_000_000_000_000;
        config.genesis.accounts.push(GenesisAccount {
            id: "alice".to_string(),
            algorithm: Algorithm::Secp256k1,
            pubkey: "02ab".to_string(),
            balance: "1000.5".parse().unwrap(),
            pledge: "100".parse().unwrap(),
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: NodeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.storage.path, config.storage.path);
        assert_eq!(back.genesis.time, config.genesis.time);
        let alice = &back.genesis.accounts[0];
        assert_eq!(alice.algorithm, Algorithm::Secp256k1);
        assert_eq!(alice.balance, "1000.5".parse().unwrap());
        assert_eq!(alice.pledge, "100".parse().unwrap());
    }

    #[test]
    fn test_pledge_defaults_to_zero() {
        let config: NodeConfig = toml::from_str(
            r#"
            [storage]
            db_type = "memory"
            path = ""

            [logging]
            level = "debug"

            [[genesis.accounts]]
            id = "bobby"
            algorithm = "ed25519"
            pubkey = "00"
            balance = "5"
            "#,
        )
        .unwrap();
        assert!(config.genesis.accounts[0].pledge.is_zero());
        assert_eq!(config.genesis.time, 0);
    }

    #[test]
    fn test_init_creates_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();
        NodeConfig::init(dir).unwrap();

        let config_path = tmp.path().join(CONFIG_FILE_NAME);
        let config = NodeConfig::load(config_path.to_str().unwrap()).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = NodeConfig::load("/nonexistent/path/ember.toml");
        assert!(matches!(result, Err(NodeError::ConfigError { .. })));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[storage]\ndb_type = \"rocksdb\"\npath = \"x\"\n[logging]\nlevel = \"info\"\n",
        )
        .unwrap();
        let err = NodeConfig::load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("rocksdb"));
    }
}
