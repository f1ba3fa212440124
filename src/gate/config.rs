//! Gateway configuration

use crate::ListStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host address to listen on
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Largest accepted request body; base64 attachments make these big
    pub max_body_bytes: usize,

    /// How bullet lists in replies are rendered
    pub list_style: ListStyle,

    /// Service name reported by the health endpoint
    pub service_name: String,

    /// Replace the built-in persona with the contents of this file
    pub persona_file: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 20 * 1024 * 1024,
            list_style: ListStyle::default(),
            service_name: "Riko Chat API".to_string(),
            persona_file: None,
        }
    }
}

impl GatewayConfig {
    /// Load gateway configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the `PORT` environment variable, if set
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PORT: {}", port))?;
        }
        Ok(())
    }

    /// Check the settings before binding
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("Invalid port: 0");
        }
        if self.max_body_bytes < 1024 {
            anyhow::bail!(
                "Invalid max_body_bytes: {} (must be at least 1024)",
                self.max_body_bytes
            );
        }
        if self.service_name.trim().is_empty() {
            anyhow::bail!("service_name must not be empty");
        }
        Ok(())
    }
}
