//! `mechnet.toml` configuration and data directory resolution.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use mechnet_core::{FilterEvent, FilterState, ModuleVisibility, ViewOptions};

use crate::error::{Result, StoreError, io_error};

pub const CONFIG_FILE: &str = "mechnet.toml";
pub const DATASET_FILE: &str = "network.json";
pub const CONFIG_ENV: &str = "MECHNET_CONFIG";
pub const DATA_DIR_ENV: &str = "MECHNET_DATA_DIR";

/// Default data directory: `$MECHNET_DATA_DIR`, else `~/.mechnet`.
pub fn default_base_dir() -> PathBuf {
    env::var(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".mechnet"))
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub view: ViewConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Dataset file. Relative paths resolve against the config file's
    /// directory.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub partial_opacity: f64,
    /// Modules that start `Off`.
    pub hidden_modules: Vec<String>,
    /// Modules that start `Partial`.
    pub partial_modules: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            partial_opacity: ViewOptions::default().partial_opacity,
            hidden_modules: Vec::new(),
            partial_modules: Vec::new(),
        }
    }
}

impl ViewConfig {
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            partial_opacity: self.partial_opacity,
        }
    }

    /// Filter state the session starts from. A module listed as both hidden
    /// and partial ends up hidden.
    pub fn initial_state(&self) -> FilterState {
        let partial = self
            .partial_modules
            .iter()
            .map(|m| FilterEvent::SetModule(m.clone(), ModuleVisibility::Partial));
        let hidden = self
            .hidden_modules
            .iter()
            .map(|m| FilterEvent::SetModule(m.clone(), ModuleVisibility::Off));
        partial
            .chain(hidden)
            .fold(FilterState::new(), |state, event| state.apply(&event))
    }
}

impl Config {
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        let mut config: Config = toml::from_str(text).map_err(|source| StoreError::Config {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        if let Some(path) = &config.dataset.path
            && path.is_relative()
            && let Some(dir) = origin.parent()
        {
            config.dataset.path = Some(dir.join(path));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(io_error(path))?;
        let config = Self::from_toml(&text, path)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load the first config found in resolution order, or defaults.
    /// Returns the config together with the file it came from.
    pub fn resolve(explicit: Option<&Path>, base_dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        let from_env = env::var(CONFIG_ENV).ok().filter(|v| !v.is_empty());
        match config_path(explicit, from_env.as_deref(), base_dir) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            None => {
                tracing::debug!("no config file, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let opacity = self.view.partial_opacity;
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(StoreError::InvalidConfig(format!(
                "view.partial_opacity must be within 0..=1, got {opacity}"
            )));
        }
        Ok(())
    }
}

/// Config file to load: explicit flag, then environment, then the data
/// directory's `mechnet.toml` if it exists.
fn config_path(
    explicit: Option<&Path>,
    from_env: Option<&str>,
    base_dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env {
        return Some(PathBuf::from(path));
    }
    let default = base_dir.join(CONFIG_FILE);
    default.is_file().then_some(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PathBuf {
        PathBuf::from("/etc/mechnet/mechnet.toml")
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("", &origin()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.view.partial_opacity, 0.4);
        assert!(config.dataset.path.is_none());
    }

    #[test]
    fn test_full_config() {
        let text = r#"
[dataset]
path = "/data/network.json"

[view]
partial_opacity = 0.25
hidden_modules = ["M16"]
partial_modules = ["M19", "M16"]
"#;
        let config = Config::from_toml(text, &origin()).unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("/data/network.json")));
        assert_eq!(config.view.view_options().partial_opacity, 0.25);

        let state = config.view.initial_state();
        assert_eq!(state.module_visibility("M16"), ModuleVisibility::Off);
        assert_eq!(state.module_visibility("M19"), ModuleVisibility::Partial);
        assert_eq!(state.module_visibility("M01"), ModuleVisibility::On);
    }

    #[test]
    fn test_relative_dataset_path_resolves_against_config_dir() {
        let config = Config::from_toml("[dataset]\npath = \"net.json\"", &origin()).unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("/etc/mechnet/net.json")));
    }

    #[test]
    fn test_out_of_range_opacity_rejected() {
        let err = Config::from_toml("[view]\npartial_opacity = 1.5", &origin()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml("[view]\nopacity = 0.5", &origin()).unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn test_config_path_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = PathBuf::from("/tmp/explicit.toml");

        assert_eq!(
            config_path(Some(explicit.as_path()), Some("/tmp/env.toml"), dir.path()),
            Some(explicit.clone())
        );
        assert_eq!(
            config_path(None, Some("/tmp/env.toml"), dir.path()),
            Some(PathBuf::from("/tmp/env.toml"))
        );
        assert_eq!(config_path(None, None, dir.path()), None);

        let default = dir.path().join(CONFIG_FILE);
        fs::write(&default, "").unwrap();
        assert_eq!(config_path(None, None, dir.path()), Some(default));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
