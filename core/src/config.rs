//! Configuration for the core crate
//!
//! Loaded once at startup and handed to the contracts explicitly, usually as an
//! `Arc<CoreConfig>`. Nothing in the crate reads configuration from globals.

use serde::{Serialize, Deserialize};
use crate::error::{to_config_error, CoreError, Result};

/// Secondary index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Object type of the composite keys
    pub name: String,

    /// Value written to the `index` field of every indexed datum
    pub tag: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            name: "key~subkey".to_string(),
            tag: "Subkey".to_string(),
        }
    }
}

/// Pagination limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Largest page a caller may request; larger requests are clamped
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            max_page_size: 1000,
        }
    }
}

/// Contract namespaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace of the record/index contract
    pub meddata: String,

    /// Namespace of the task contract
    pub asset_task: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        NamespaceConfig {
            meddata: "org.ttdata.meddata".to_string(),
            asset_task: "org.ttdata.assettask".to_string(),
        }
    }
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Secondary index configuration
    pub index: IndexConfig,

    /// Pagination configuration
    pub pagination: PaginationConfig,

    /// Contract namespaces
    pub namespaces: NamespaceConfig,

    /// `subKey` stored on freshly registered records
    pub register_sub_key: String,

    /// Default log filter of the hosting service when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            index: IndexConfig::default(),
            pagination: PaginationConfig::default(),
            namespaces: NamespaceConfig::default(),
            register_sub_key: "0000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl CoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: CoreConfig = serde_json::from_reader(file).map_err(to_config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Check the values the contracts rely on
    pub fn validate(&self) -> Result<()> {
        if self.index.name.is_empty() {
            return Err(CoreError::Config("index name must not be empty".to_string()));
        }
        if self.index.name.contains(['\u{0}', '\u{10FFFF}']) {
            return Err(CoreError::Config(format!(
                "index name {:?} contains a reserved character",
                self.index.name
            )));
        }
        if self.pagination.max_page_size == 0 {
            return Err(CoreError::Config("max_page_size must be positive".to_string()));
        }
        if self.namespaces.meddata.is_empty() || self.namespaces.asset_task.is_empty() {
            return Err(CoreError::Config("contract namespaces must not be empty".to_string()));
        }
        if self.namespaces.meddata == self.namespaces.asset_task {
            return Err(CoreError::Config(format!(
                "contract namespaces must be distinct, both are {}",
                self.namespaces.meddata
            )));
        }
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config.pagination.max_page_size = 50;
        config
    }
}
