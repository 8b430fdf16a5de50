//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default prefix for environment overrides, e.g. `TEE_SWAP__LEDGER__RPC_URL`
pub const ENV_PREFIX: &str = "TEE_SWAP";

/// Environment variable consulted for the compliance bearer credential
pub const COMPLIANCE_API_KEY_ENV: &str = "RANGE_API_KEY";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = extension, "loading configuration file");

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables with the default prefix
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Sections and keys are separated by a double underscore so that keys
    /// containing underscores survive: `TEE_SWAP__SUBMISSION__MAX_ATTEMPTS=5`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        Self::builder().add_env(prefix).build()
    }

    /// Merge two configurations, with overlay sections taking precedence
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        let api_key = if overlay.compliance.api_key.is_empty() {
            base.compliance.api_key
        } else {
            overlay.compliance.api_key.clone()
        };

        let mut merged = overlay;
        merged.compliance.api_key = api_key;
        merged
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Both sources are layered before deserialization, so an override only
    /// replaces the keys it names.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        Self::builder()
            .add_file(path, true)
            .add_env(env_prefix)
            .build()
            .map(Self::with_secret_env)
    }

    /// Fill the compliance credential from the environment when absent
    pub fn with_secret_env(mut config: AppConfig) -> AppConfig {
        if config.compliance.api_key.is_empty() {
            if let Ok(key) = std::env::var(COMPLIANCE_API_KEY_ENV) {
                config.compliance.api_key = key;
            }
        }
        config
    }

    /// Build configuration using the config crate's builder pattern
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
            defaults_error: None,
        }
    }
}

/// Builder for layered configuration loading
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
    defaults_error: Option<ConfigError>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml, // Default to TOML
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Set a default value for a key; the first failure is reported by `build`
    pub fn set_default(mut self, key: &str, value: &str) -> Self {
        match self.builder.clone().set_default(key, value) {
            Ok(builder) => self.builder = builder,
            Err(e) => {
                if self.defaults_error.is_none() {
                    self.defaults_error = Some(ConfigError::from(e));
                }
            }
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        if let Some(err) = self.defaults_error {
            return Err(err);
        }
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}
