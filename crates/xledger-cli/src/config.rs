//! CLI configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use xledger_core::{Credentials, SenderConfig};

/// Full configuration for the xledger CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct XledgerConfig {
    /// Payment execution tunables.
    #[serde(default)]
    pub sender: SenderConfig,

    /// The account payments are sent from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Notary for atomic payments.
    #[serde(default)]
    pub notary: NotaryConfig,

    /// Path finding.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    /// Base URL of the source ledger.
    #[serde(default)]
    pub ledger: String,
    /// Account URL debited by outgoing payments.
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SourceConfig {
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| {
            Credentials::new(username.clone(), self.password.clone().unwrap_or_default())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotaryConfig {
    /// Notary base URL. Payments are atomic when this and the key are set.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Connector quote service.
    #[serde(default = "default_connector")]
    pub connector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_connector() -> String {
    "http://localhost:4000".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            connector: default_connector(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl XledgerConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: XledgerConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
