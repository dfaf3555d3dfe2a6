//! Scenario configuration resolution for the `sidepass` CLI.
//!
//! The scenario config is a TOML file; the resolution chain is:
//! `--config` flag > `SIDEPASS_CONFIG` env var >
//! `~/.config/sidepass/config.toml` > the configuration embedded in the
//! library.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use sidepass_core::config::ScenarioConfig;

/// Env var naming a scenario config file.
pub const CONFIG_ENV_VAR: &str = "SIDEPASS_CONFIG";

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the sidepass config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/sidepass` or
/// `~/.config/sidepass`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("sidepass");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sidepass")
}

/// Return the path to the user's scenario config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    File(PathBuf),
    Embedded,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(path) => write!(f, "{} (--config)", path.display()),
            Self::Env(path) => write!(f, "{} (${})", path.display(), CONFIG_ENV_VAR),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => f.write_str("embedded default"),
        }
    }
}

/// Fully resolved scenario configuration, ready for use.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub scenario: ScenarioConfig,
    pub source: ConfigSource,
}

impl ResolvedConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > embedded default.
    ///
    /// An explicitly named file (flag or env var) must load; the user's
    /// config file is only used when it exists.
    pub fn resolve(cli_config: Option<&Path>) -> Result<Self> {
        let source = if let Some(path) = cli_config {
            ConfigSource::Flag(path.to_path_buf())
        } else if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            ConfigSource::Env(PathBuf::from(path))
        } else {
            let path = config_path();
            if path.exists() {
                ConfigSource::File(path)
            } else {
                ConfigSource::Embedded
            }
        };

        let scenario = match &source {
            ConfigSource::Flag(path) | ConfigSource::Env(path) | ConfigSource::File(path) => {
                ScenarioConfig::load(path)
                    .with_context(|| format!("failed to load scenario config from {source}"))?
            }
            ConfigSource::Embedded => ScenarioConfig::embedded(),
        };

        tracing::debug!(%source, "resolved scenario config");
        Ok(Self { scenario, source })
    }
}

// -----------------------------------------------------------------------
// Write
// -----------------------------------------------------------------------

/// Write the embedded default configuration to `path`, creating parent
/// dirs as needed. Refuses to overwrite unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    std::fs::write(path, ScenarioConfig::embedded_toml())
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
