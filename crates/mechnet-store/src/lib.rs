pub mod config;
pub mod error;
pub mod store;

pub use config::{Config, DatasetConfig, ViewConfig, default_base_dir};
pub use error::{Result, StoreError};
pub use store::{DatasetSource, DatasetStore, read_dataset};
