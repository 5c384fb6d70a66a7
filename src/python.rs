//! Python bindings

use crate::condition::{codec, evaluate, parser, Record, Value};
use crate::store::{RuleStore, StoreConfig};
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python dict of `str -> int | str` into a Record
fn extract_record(dict: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::new();
    for (key, value) in dict.iter() {
        let field: String = key.extract()?;
        let value = if let Ok(i) = value.extract::<i64>() {
            Value::Integer(i)
        } else if let Ok(s) = value.extract::<String>() {
            Value::String(s)
        } else {
            return Err(PyTypeError::new_err(format!(
                "Field '{}' must be an int or str",
                field
            )));
        };
        record.insert(field, value);
    }
    Ok(record)
}

/// Build a StoreConfig from `{"backend": ..., "path": ...}`
fn extract_store_config(dict: &Bound<'_, PyDict>) -> PyResult<StoreConfig> {
    let backend: String = match dict.get_item("backend")? {
        Some(v) => v.extract()?,
        None => "memory".to_string(),
    };
    let path: Option<PathBuf> = match dict.get_item("path")? {
        Some(v) if !v.is_none() => Some(PathBuf::from(v.extract::<String>()?)),
        _ => None,
    };

    let require_path = |path: Option<PathBuf>| {
        path.ok_or_else(|| {
            PyValueError::new_err(format!("Backend '{}' requires a 'path'", backend))
        })
    };

    match backend.as_str() {
        "memory" => Ok(StoreConfig::Memory),
        "document" => Ok(StoreConfig::Document {
            path: require_path(path)?,
        }),
        "relational" => Ok(StoreConfig::Relational {
            path: require_path(path)?,
        }),
        other => Err(PyValueError::new_err(format!(
            "Unknown backend: {}",
            other
        ))),
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Parse a rule string and return its serialized AST
#[pyfunction]
fn create_rule(expression: &str) -> PyResult<String> {
    let node = parser::parse(expression)?;
    Ok(codec::serialize(&node)?)
}

/// Evaluate a serialized AST against a record dict
#[pyfunction]
fn evaluate_rule(ast: &str, record: &Bound<'_, PyDict>) -> PyResult<bool> {
    let node = codec::deserialize(ast)?;
    let record = extract_record(record)?;
    Ok(evaluate(&node, &record)?)
}

// ============================================================================
// RuleStore class
// ============================================================================

/// Rule cache backed by a configurable key-value store
///
/// # Example (Python)
/// ```python
/// store = RuleStore({"backend": "relational", "path": "rules.db"})
/// store.store("age > 30 AND department = 'Sales'")
/// store.evaluate("age > 30 AND department = 'Sales'", {"age": 35, "department": "Sales"})
/// ```
#[pyclass(name = "RuleStore")]
pub struct PyRuleStore {
    inner: RuleStore,
}

#[pymethods]
impl PyRuleStore {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => extract_store_config(dict)?,
            None => StoreConfig::Memory,
        };
        Ok(Self {
            inner: RuleStore::open(&config)?,
        })
    }

    /// Store a rule and return its serialized AST
    fn store(&self, expression: &str) -> PyResult<String> {
        let node = self.inner.store(expression)?;
        Ok(codec::serialize(&node)?)
    }

    /// Serialized AST for a stored rule, or None
    fn load(&self, expression: &str) -> PyResult<Option<String>> {
        match self.inner.load(expression)? {
            Some(node) => Ok(Some(codec::serialize(&node)?)),
            None => Ok(None),
        }
    }

    fn evaluate(&self, expression: &str, record: &Bound<'_, PyDict>) -> PyResult<bool> {
        let record = extract_record(record)?;
        Ok(self.inner.evaluate(expression, &record)?)
    }

    /// Evaluate on a blocking worker thread; returns an awaitable
    fn evaluate_async<'py>(
        &self,
        py: Python<'py>,
        expression: String,
        record: &Bound<'py, PyDict>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let record = extract_record(record)?;
        let store = self.inner.clone();

        pyo3_async_runtimes::tokio::future_into_py(py, async move {
            let result = tokio::task::spawn_blocking(move || store.evaluate(&expression, &record))
                .await
                .map_err(|e| {
                    PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e))
                })??;

            Ok(result)
        })
    }
}

// ============================================================================
// Python Module Definition
// ============================================================================

#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_class::<PyRuleStore>()?;
    Ok(())
}
