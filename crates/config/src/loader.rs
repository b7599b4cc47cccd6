use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::env_subst::substitute_env;
use crate::schema::{GatewayConfig, WorkerConfig};

const CONFIG_FILENAME: &str = "relaymesh.toml";

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "relaymesh") {
        let candidate = dirs.config_dir().join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/relaymesh/`).
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "relaymesh").map(|d| d.config_dir().to_path_buf())
}

fn read_and_substitute(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(substitute_env(&raw))
}

/// Discover `relaymesh.toml` in `./` then `~/.config/relaymesh/` and load
/// gateway settings from it. Falls back to [`GatewayConfig::default`] when
/// no file is found or it fails to parse — callers layer CLI flags and env
/// vars on top regardless.
#[must_use]
pub fn discover_gateway_config() -> GatewayConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return GatewayConfig::default();
    };

    debug!(path = %path.display(), "loading gateway config");
    match read_and_substitute(&path).and_then(|raw| Ok(toml::from_str(&raw)?)) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            GatewayConfig::default()
        },
    }
}

/// Same discovery as [`discover_gateway_config`] for worker settings.
#[must_use]
pub fn discover_worker_config() -> WorkerConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return WorkerConfig::default();
    };

    debug!(path = %path.display(), "loading worker config");
    match read_and_substitute(&path).and_then(|raw| Ok(toml::from_str(&raw)?)) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            WorkerConfig::default()
        },
    }
}
