//! Rule persistence
//!
//! The rule store caches `expression text -> serialized AST` through the
//! minimal [`KeyValueStore`] contract. Backends are interchangeable and chosen
//! by [`StoreConfig`].

mod document;
mod memory;
mod relational;
mod rule_store;

pub use document::DocumentStore;
pub use memory::MemoryStore;
pub use relational::SqliteStore;
pub use rule_store::RuleStore;

use crate::error::{Result, RuleEngineError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Key-value persistence contract consumed by the rule store
pub trait KeyValueStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Backend selection
///
/// ```json
/// {"backend": "relational", "path": "rules.db"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    /// Append-only JSON-lines document file
    Document { path: PathBuf },
    /// SQLite database file
    Relational { path: PathBuf },
}

impl StoreConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| RuleEngineError::Backend(format!("Invalid store config: {}", e)))
    }

    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        let backend: Arc<dyn KeyValueStore> = match self {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Document { path } => Arc::new(DocumentStore::open(path)?),
            StoreConfig::Relational { path } => Arc::new(SqliteStore::open(path)?),
        };
        Ok(backend)
    }
}
