use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use twstock_alerts::EngineConfig;
use twstock_indicators::IndicatorConfig;

/// Settings read from the optional TOML config file.
///
/// ```toml
/// [indicators]
/// ma_periods = [5, 20, 60]
///
/// [alerts]
/// concurrency = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub indicators: IndicatorConfig,
    pub alerts: EngineConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse config TOML")
    }

    /// Read `path` when given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
