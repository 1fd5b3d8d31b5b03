//! Config loading from the project root.

use std::path::Path;

use crate::config::schema::TrendLensConfig;
use crate::error::{Result, TrendLensError};

/// Relative location of the deployment config under the project root.
pub const CONFIG_RELATIVE_PATH: &str = "config/config.yaml";

/// Load `config/config.yaml` from the given project root.
///
/// A missing file yields the built-in defaults (the server is usable out of
/// the box). A present but unparseable file is an error — silently falling
/// back would mask deployment mistakes, and registry construction treats it
/// as fatal.
pub fn load_config(project_root: &Path) -> Result<TrendLensConfig> {
    let path = project_root.join(CONFIG_RELATIVE_PATH);
    if !path.exists() {
        tracing::debug!("no config file at {}, using defaults", path.display());
        return Ok(TrendLensConfig::default());
    }

    let raw = std::fs::read_to_string(&path)?;
    let config: TrendLensConfig = serde_yaml::from_str(&raw)
        .map_err(|e| TrendLensError::Config(format!("{}: {e}", path.display())))?;
    tracing::info!(
        "loaded config from {} ({} platforms)",
        path.display(),
        config.platforms.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.platforms.len(), 5);
    }

    #[test]
    fn valid_file_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("config");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "platforms:\n  - id: weibo\n    name: 微博\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.platform_ids(), vec!["weibo"]);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("config");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "platforms: [unclosed").unwrap();

        let err = load_config(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }
}
