//! Chain configuration

use serde::Deserialize;
use thiserror::Error;

use std::env;

use crate::blockchain::pow::MAX_DIFFICULTY;
use crate::blockchain::Address;

pub const DEFAULT_DIFFICULTY: u8 = 4;
pub const DEFAULT_SEED_AMOUNT: u64 = 2000;
pub const DEFAULT_SEED_ACCOUNT: &str = "genesis";

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid difficulty {0}: must be between 1 and {max}", max = MAX_DIFFICULTY)]
    InvalidDifficulty(u8),

    #[error("Seed account must not be empty")]
    EmptySeedAccount,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Parameters fixed when a chain is created
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading hex zeros required of every proof digest
    pub difficulty: u8,

    /// Amount credited to the seed account by the genesis block
    pub seed_amount: u64,

    /// Account receiving the genesis credit
    pub seed_account: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            difficulty: DEFAULT_DIFFICULTY,
            seed_amount: DEFAULT_SEED_AMOUNT,
            seed_account: Address::from(DEFAULT_SEED_ACCOUNT),
        }
    }
}

impl ChainConfig {
    pub fn new(seed_amount: u64, difficulty: u8) -> Self {
        ChainConfig {
            difficulty,
            seed_amount,
            ..Default::default()
        }
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_seed_amount(mut self, seed_amount: u64) -> Self {
        self.seed_amount = seed_amount;
        self
    }

    pub fn with_seed_account(mut self, seed_account: impl Into<Address>) -> Self {
        self.seed_account = seed_account.into();
        self
    }

    /// Loads overrides from `CHAIN_DIFFICULTY`, `CHAIN_SEED_AMOUNT` and
    /// `CHAIN_SEED_ACCOUNT`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ChainConfig::default();

        if let Some(value) = lookup("CHAIN_DIFFICULTY") {
            config.difficulty = parse_value("CHAIN_DIFFICULTY", &value)?;
        }
        if let Some(value) = lookup("CHAIN_SEED_AMOUNT") {
            config.seed_amount = parse_value("CHAIN_SEED_AMOUNT", &value)?;
        }
        if let Some(value) = lookup("CHAIN_SEED_ACCOUNT") {
            config.seed_account = Address::new(value);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }
        if self.seed_account.as_str().is_empty() {
            return Err(ConfigError::EmptySeedAccount);
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.seed_amount, 2000);
        assert_eq!(config.seed_account, Address::from("genesis"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ChainConfig::new(10, 2).with_seed_account("bank");
        assert_eq!(config.seed_amount, 10);
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.seed_account.as_str(), "bank");
    }

    #[test]
    fn test_invalid_difficulty() {
        assert_eq!(
            ChainConfig::default().with_difficulty(0).validate(),
            Err(ConfigError::InvalidDifficulty(0))
        );
        assert_eq!(
            ChainConfig::default().with_difficulty(65).validate(),
            Err(ConfigError::InvalidDifficulty(65))
        );
    }

    #[test]
    fn test_empty_seed_account() {
        assert_eq!(
            ChainConfig::default().with_seed_account("").validate(),
            Err(ConfigError::EmptySeedAccount)
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = ChainConfig::from_lookup(lookup(&[
            ("CHAIN_DIFFICULTY", "2"),
            ("CHAIN_SEED_AMOUNT", " 500 "),
        ]))
        .unwrap();

        assert_eq!(config.difficulty, 2);
        assert_eq!(config.seed_amount, 500);
        assert_eq!(config.seed_account.as_str(), "genesis");
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ChainConfig::from_lookup(lookup(&[("CHAIN_SEED_AMOUNT", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "CHAIN_SEED_AMOUNT".to_string(),
                value: "lots".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ChainConfig = serde_json::from_str(r#"{"difficulty": 3}"#).unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.seed_amount, DEFAULT_SEED_AMOUNT);
    }
}
