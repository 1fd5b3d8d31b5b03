//! Read-only view of the effective configuration for MCP clients.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::schema::TrendLensConfig;
use crate::error::Result;

/// Which slice of the config `get_current_config` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSection {
    All,
    Crawler,
    Push,
    Keywords,
    Weights,
}

pub struct ConfigService {
    config: Arc<TrendLensConfig>,
}

impl ConfigService {
    pub fn new(config: Arc<TrendLensConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendLensConfig {
        &self.config
    }

    /// Render the requested section. Platforms ride along with `all` since
    /// clients need the catalog to build platform filters.
    pub fn get_current_config(&self, section: ConfigSection) -> Result<serde_json::Value> {
        let c = &self.config;
        let body = match section {
            ConfigSection::All => serde_json::json!({
                "version": c.version,
                "platforms": c.platforms.iter().map(|p| serde_json::json!({
                    "id": p.id, "name": p.name,
                })).collect::<Vec<_>>(),
                "crawler": serde_json::to_value(&c.crawler)?,
                "push": serde_json::to_value(&c.push)?,
                "keywords": serde_json::to_value(&c.keywords)?,
                "weights": serde_json::to_value(&c.weights)?,
            }),
            ConfigSection::Crawler => serde_json::to_value(&c.crawler)?,
            ConfigSection::Push => serde_json::to_value(&c.push)?,
            ConfigSection::Keywords => serde_json::to_value(&c.keywords)?,
            ConfigSection::Weights => serde_json::to_value(&c.weights)?,
        };
        let name = match section {
            ConfigSection::All => "all",
            ConfigSection::Crawler => "crawler",
            ConfigSection::Push => "push",
            ConfigSection::Keywords => "keywords",
            ConfigSection::Weights => "weights",
        };
        Ok(serde_json::json!({ "section": name, "config": body }))
    }
}
