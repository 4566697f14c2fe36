use std::fs;
use std::path::{Path, PathBuf};

use mechnet_core::{Dataset, Network};

use crate::config::{Config, DATASET_FILE, default_base_dir};
use crate::error::{Result, StoreError, io_error};

/// Where the active dataset comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetSource {
    /// `[dataset] path` in the config.
    Configured(PathBuf),
    /// A previous `import`, stored in the data directory.
    Imported(PathBuf),
    Bundled,
}

impl DatasetSource {
    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Configured(path) => format!("config: {}", path.display()),
            DatasetSource::Imported(path) => format!("imported: {}", path.display()),
            DatasetSource::Bundled => "bundled".to_string(),
        }
    }
}

/// Data directory plus resolved configuration.
#[derive(Debug)]
pub struct DatasetStore {
    base_dir: PathBuf,
    config: Config,
    config_path: Option<PathBuf>,
}

impl DatasetStore {
    /// Open the data directory, creating it as needed, and resolve the
    /// config. `base_dir` overrides the default data directory (for
    /// testing).
    pub fn open(base_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let base_dir = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        if base_dir.exists() && !base_dir.is_dir() {
            return Err(StoreError::InvalidPath(base_dir));
        }
        fs::create_dir_all(&base_dir).map_err(io_error(&base_dir))?;

        let (config, config_path) = Config::resolve(config_path, &base_dir)?;
        Ok(Self {
            base_dir,
            config,
            config_path,
        })
    }

    /// Store with the given config and no config file (for testing).
    pub fn with_config(base_dir: &Path, config: Config) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            config,
            config_path: None,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn imported_path(&self) -> PathBuf {
        self.base_dir.join(DATASET_FILE)
    }

    pub fn dataset_source(&self) -> DatasetSource {
        if let Some(path) = &self.config.dataset.path {
            return DatasetSource::Configured(path.clone());
        }
        let imported = self.imported_path();
        if imported.is_file() {
            DatasetSource::Imported(imported)
        } else {
            DatasetSource::Bundled
        }
    }

    /// Parse the active dataset without validating it.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let source = self.dataset_source();
        let dataset = match &source {
            DatasetSource::Configured(path) | DatasetSource::Imported(path) => read_dataset(path)?,
            DatasetSource::Bundled => Dataset::bundled()?,
        };
        tracing::info!(source = %source.describe(), nodes = dataset.nodes.len(), "dataset loaded");
        Ok(dataset)
    }

    /// Load and validate the active dataset.
    pub fn load_network(&self) -> Result<Network> {
        Ok(Network::from_dataset(self.load_dataset()?)?)
    }

    /// Validate `path` and copy it into the data directory, where it
    /// replaces the bundled dataset. Invalid files are rejected and leave
    /// any previous import in place.
    pub fn import_json_file(&self, path: &Path) -> Result<Network> {
        let network = Network::from_dataset(read_dataset(path)?)?;
        let target = self.imported_path();
        write_dataset(&target, &network.to_dataset())?;
        tracing::info!(from = %path.display(), to = %target.display(), "dataset imported");
        Ok(network)
    }

    /// Write the active dataset to `path` as pretty JSON.
    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let network = self.load_network()?;
        write_dataset(path, &network.to_dataset())?;
        tracing::info!(to = %path.display(), "dataset exported");
        Ok(())
    }

    /// Drop a previous import so the bundled dataset is used again.
    pub fn clear_import(&self) -> Result<bool> {
        let path = self.imported_path();
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(io_error(&path))?;
        Ok(true)
    }
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let json = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(Dataset::from_json(&json)?)
}

fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    if path.is_dir() {
        return Err(StoreError::InvalidPath(path.to_path_buf()));
    }
    let json = dataset.to_json()?;
    fs::write(path, json).map_err(io_error(path))
}
