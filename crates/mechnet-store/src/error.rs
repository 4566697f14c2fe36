use std::fmt;
use std::io;
use std::path::PathBuf;

use mechnet_core::DataError;

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Config { path: PathBuf, source: toml::de::Error },
    Data(DataError),
    InvalidConfig(String),
    InvalidPath(PathBuf),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StoreError::Config { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
            StoreError::Data(e) => write!(f, "invalid dataset: {e}"),
            StoreError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            StoreError::InvalidPath(path) => write!(f, "invalid path: {}", path.display()),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Config { source, .. } => Some(source),
            StoreError::Data(e) => Some(e),
            StoreError::InvalidConfig(_) | StoreError::InvalidPath(_) => None,
        }
    }
}

impl From<DataError> for StoreError {
    fn from(e: DataError) -> Self {
        StoreError::Data(e)
    }
}

pub(crate) fn io_error(path: &std::path::Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
