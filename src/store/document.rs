//! Document-store backend
//!
//! Rules are kept as an append-only JSON-lines collection, one document per
//! write: `{"rule_string": "...", "ast": "..."}`. Lookups return the most
//! recently written document for a rule string.

use crate::error::{Result, RuleEngineError};
use crate::store::KeyValueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct RuleDocument {
    rule_string: String,
    ast: String,
}

/// JSON-lines document collection on disk
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Open or create the collection file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for DocumentStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        let document = RuleDocument {
            rule_string: key.to_string(),
            ast: value.to_string(),
        };
        let mut line = serde_json::to_string(&document)
            .map_err(|e| RuleEngineError::Backend(format!("Failed to encode document: {}", e)))?;
        line.push('\n');

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(path = %self.path.display(), rule = key, "document appended");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = None;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document: RuleDocument = serde_json::from_str(&line).map_err(|e| {
                RuleEngineError::Backend(format!(
                    "{}:{}: bad document: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;
            if document.rule_string == key {
                found = Some(document.ast);
            }
        }

        Ok(found)
    }
}
