//! Configuration management for the private swap saga
//!
//! This crate provides centralized configuration with support for:
//! - Multiple config formats (TOML, YAML, JSON)
//! - Environment variable overrides
//! - Config validation
//! - Checked-in defaults for devnet and local environments

mod config;
mod loader;
mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config library error: {0}")]
    ConfigLibError(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
