//! Append-only JSON sequence files

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, warn};

use crate::StorageError;

/// A file holding a single JSON array that grows by appending values
#[derive(Debug, Clone)]
pub struct JsonSequenceFile {
    path: PathBuf,
}

impl JsonSequenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents of the file
    ///
    /// A missing file, unparsable content, or anything other than an array
    /// reads as an empty sequence.
    pub fn read(&self) -> Vec<Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Cannot read {}: {}; treating as empty", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!("{} does not hold a JSON array; treating as empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("{} is not valid JSON ({}); treating as empty", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Append values to the sequence and rewrite the file
    ///
    /// Returns the sequence length after appending.
    pub fn append<T: Serialize>(&self, values: &[T]) -> Result<usize, StorageError> {
        let mut items = self.read();
        for value in values {
            items.push(serde_json::to_value(value)?);
        }

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        items.serialize(&mut ser)?;

        std::fs::write(&self.path, buf).map_err(|source| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        debug!("Appended {} values to {}", values.len(), self.path.display());
        Ok(items.len())
    }
}
