//! Configuration management for ProofLedger

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::LedgerError;
use crate::pow::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pow: PowConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PowConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
        }
    }
}

impl Config {
    pub fn proof_of_work(&self) -> ProofOfWork {
        ProofOfWork::new(self.pow.difficulty)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.database.path.is_empty() {
            return Err(LedgerError::ConfigError("database.path must be set in config.toml".to_string()));
        }
        if self.pow.difficulty == 0 || self.pow.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::ConfigError(format!(
                "pow.difficulty must be between 1 and {}",
                MAX_DIFFICULTY
            )));
        }
        Ok(())
    }
}

pub fn parse_config(text: &str) -> Result<Config, LedgerError> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read `config.toml` from the working directory, falling back to defaults
/// when it is absent.
pub fn load_config() -> Result<Config, LedgerError> {
    let path = Path::new("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config_from(path)
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, LedgerError> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_config(&text)
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./ledger.db".to_string()
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}
