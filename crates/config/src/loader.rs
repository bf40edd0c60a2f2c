use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::ImgateConfig};

/// Config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["imgate.toml", "imgate.yaml", "imgate.yml", "imgate.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

fn override_slot() -> MutexGuard<'static, Option<PathBuf>> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Restrict discovery to `path`. Project-local and user-global locations are
/// skipped while an override is set.
pub fn set_config_dir(path: PathBuf) {
    *override_slot() = Some(path);
}

pub fn clear_config_dir() {
    *override_slot() = None;
}

/// Load config from `path`, picking the format from its extension.
pub fn load_config(path: &Path) -> anyhow::Result<ImgateConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the directory passed to [`set_config_dir`], exclusively, if any
/// 2. `./imgate.{toml,yaml,yml,json}`
/// 3. `~/.config/imgate/imgate.{toml,yaml,yml,json}`
///
/// Falls back to `ImgateConfig::default()` when nothing is found or the file
/// does not parse.
pub fn discover_and_load() -> ImgateConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return ImgateConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        ImgateConfig::default()
    })
}

fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = override_slot().clone() {
        return first_existing(&dir);
    }
    first_existing(Path::new(".")).or_else(|| user_config_dir().and_then(|d| first_existing(&d)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn user_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("imgate"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ImgateConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
