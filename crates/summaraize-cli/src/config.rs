//! Config file location and loading for the CLI

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use summaraize_core::Config;
use summaraize_core::config::DEFAULT_CONFIG_TOML;
use tracing::{debug, info};

/// `~/.summaraize`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".summaraize")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load the config at `path` (or the default path).
///
/// An explicit path must exist. When the default path is missing, the
/// config is built from environment variables instead.
pub fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("Failed to load {}", p.display())),
        None => {
            let default = default_config_path();
            if default.exists() {
                Config::load(&default)
                    .with_context(|| format!("Failed to load {}", default.display()))
            } else {
                debug!(
                    "No config at {}, using environment variables",
                    default.display()
                );
                Ok(Config::from_env())
            }
        }
    }
}

/// Write the default config file, refusing to overwrite unless `force`
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        init(&path, false).unwrap();

        let config = Config::load_with(&path, |_| None).unwrap();
        assert_eq!(config.providers.order.len(), 3);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine").unwrap();

        let err = init(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        init(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TOML);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        assert!(load(Some(Path::new("/nonexistent/summaraize/config.toml"))).is_err());
    }

    #[test]
    fn test_default_path_under_config_dir() {
        assert!(default_config_path().starts_with(config_dir()));
    }
}
