//! Rule store adapter: expression text -> serialized AST

use crate::condition::{codec, evaluate, parser, Node, Record};
use crate::error::Result;
use crate::store::{KeyValueStore, MemoryStore, StoreConfig};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Caches parsed rules in a key-value backend, keyed by the exact expression text
#[derive(Clone)]
pub struct RuleStore {
    backend: Arc<dyn KeyValueStore>,
}

impl RuleStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Open the backend described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(config.open()?))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Parse (unless already cached), serialize and persist a rule.
    ///
    /// A stored entry that cannot be decoded is reported, not overwritten.
    #[instrument(skip(self))]
    pub fn store(&self, expression: &str) -> Result<Node> {
        if let Some(text) = self.backend.get(expression)? {
            debug!("rule cache hit");
            return codec::deserialize(&text);
        }

        debug!("rule cache miss");
        let node = parser::parse(expression)?;
        let serialized = codec::serialize(&node)?;
        self.backend.put(expression, &serialized)?;
        Ok(node)
    }

    /// Fetch and decode a previously stored rule
    #[instrument(skip(self))]
    pub fn load(&self, expression: &str) -> Result<Option<Node>> {
        self.backend
            .get(expression)?
            .map(|text| codec::deserialize(&text))
            .transpose()
    }

    /// Evaluate a rule against a record, storing it first if needed
    pub fn evaluate(&self, expression: &str, record: &Record) -> Result<bool> {
        let node = self.store(expression)?;
        evaluate(&node, record)
    }
}
