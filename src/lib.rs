//! Rule Engine Core - boolean condition rules as persisted ASTs
//!
//! Rule text such as `"age > 30 AND department = 'Sales'"` is parsed into a
//! [`Node`] tree, serialized to JSON, cached in a pluggable key-value backend
//! keyed by the exact rule text, and evaluated against a [`Record`].
//!
//! ```
//! use rule_engine_core::{evaluate, parse, Record};
//!
//! let rule = parse("age > 30 AND department = 'Sales'").unwrap();
//! let record = Record::new().with("age", 35).with("department", "Sales");
//! assert!(evaluate(&rule, &record).unwrap());
//! ```
//!
//! Python bindings are available behind the `python` feature.

pub mod condition;
pub mod error;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use crate::condition::{
    deserialize, evaluate, parse, serialize, Comparator, Comparison, Connective, Literal, Node,
    Record, Value, MAX_DEPTH,
};
pub use crate::error::{Result, RuleEngineError};
pub use crate::store::{
    DocumentStore, KeyValueStore, MemoryStore, RuleStore, SqliteStore, StoreConfig,
};
