//! Configuration loading and resolution.

use std::path::PathBuf;

use anyhow::Context;
use catalog_harvest::{CategoryKind, HarvestConfig, Target};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CATALOG_HARVEST_CONFIG";

/// Resolve the config file path, if any.
///
/// Explicit path, then `CATALOG_HARVEST_CONFIG`, then `./harvest.json`.
/// `None` means the built-in defaults apply.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from("harvest.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}

/// Load the resolved config, or the defaults when no file is found.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<HarvestConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::info!("Config: {}", path.display());
            HarvestConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => {
            tracing::info!("Config: built-in defaults");
            Ok(HarvestConfig::default())
        }
    }
}

/// Configured targets narrowed by kind and label. Order is preserved.
pub fn select_targets(
    config: &HarvestConfig,
    kind: Option<CategoryKind>,
    only: &[String],
) -> Vec<Target> {
    config
        .targets()
        .into_iter()
        .filter(|t| kind.map_or(true, |k| t.kind == k))
        .filter(|t| only.is_empty() || only.iter().any(|l| l == &t.label))
        .collect()
}
