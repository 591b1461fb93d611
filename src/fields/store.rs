//! Field store: the console's input/output fields.
//!
//! Every component that reads or writes a field receives an
//! `Arc<dyn FieldStore>`; nothing reaches for shared global state.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Read/write access to named fields.
pub trait FieldStore: Send + Sync {
    /// Current value, or `None` if the field does not exist.
    fn get(&self, id: &str) -> Option<String>;

    /// Set a field value, creating the field if needed.
    fn set(&self, id: &str, value: &str);

    /// Replace the rendered markup of an output surface.
    fn set_markup(&self, id: &str, markup: &str);

    /// Rendered markup of a surface.
    fn markup(&self, id: &str) -> Option<String>;

    /// Mark a field as consulted by the current call.
    fn flag_active(&self, id: &str);

    /// Clear all active flags before a new call.
    fn clear_flags(&self) {}

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FieldState {
    value: String,
    #[serde(skip)]
    markup: String,
    #[serde(skip)]
    active: bool,
}

/// In-memory field store backed by a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryFieldStore {
    inner: Arc<DashMap<String, FieldState>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that saves its values to `path` on [`save_to_file`](Self::save_to_file).
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path: Some(path.into()),
        }
    }

    /// Declare a field with a default value. Existing values are kept.
    pub fn declare(&self, id: &str, default: &str) {
        self.inner.entry(id.to_string()).or_insert_with(|| FieldState {
            value: default.to_string(),
            ..Default::default()
        });
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.inner.get(id).map(|f| f.active).unwrap_or(false)
    }

    /// Sorted copy of all field values.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Load persisted values from file if it exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let store = Self::with_persistence(path);
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let values: BTreeMap<String, String> = serde_json::from_reader(reader)?;
            for (id, value) in values {
                store.set(&id, &value);
            }
            tracing::info!(path = %path.display(), fields = store.len(), "Loaded persisted field values");
        }
        Ok(store)
    }

    /// Save field values to the persistence path, if any.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let values = self.snapshot();
            serde_json::to_writer_pretty(writer, &values)?;
            tracing::info!(path = %path.display(), fields = values.len(), "Saved field values");
        }
        Ok(())
    }
}

impl FieldStore for MemoryFieldStore {
    fn get(&self, id: &str) -> Option<String> {
        self.inner.get(id).map(|f| f.value.clone())
    }

    fn set(&self, id: &str, value: &str) {
        self.inner.entry(id.to_string()).or_default().value = value.to_string();
    }

    fn set_markup(&self, id: &str, markup: &str) {
        self.inner.entry(id.to_string()).or_default().markup = markup.to_string();
    }

    fn markup(&self, id: &str) -> Option<String> {
        self.inner.get(id).map(|f| f.markup.clone())
    }

    fn flag_active(&self, id: &str) {
        if let Some(mut field) = self.inner.get_mut(id) {
            field.active = true;
        }
    }

    fn clear_flags(&self) {
        for mut field in self.inner.iter_mut() {
            field.active = false;
        }
    }
}

impl std::fmt::Debug for MemoryFieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFieldStore")
            .field("fields", &self.inner.len())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_keeps_existing() {
        let store = MemoryFieldStore::new();
        store.set("bitmap", "01111");
        store.declare("bitmap", "11111");
        store.declare("count", "5");
        assert_eq!(store.get("bitmap").as_deref(), Some("01111"));
        assert_eq!(store.get("count").as_deref(), Some("5"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_flags() {
        let store = MemoryFieldStore::new();
        store.declare("message", "");
        store.flag_active("message");
        store.flag_active("ghost");
        assert!(store.is_active("message"));
        assert!(!store.contains("ghost"));

        store.clear_flags();
        assert!(!store.is_active("message"));
    }

    #[test]
    fn test_markup_separate_from_value() {
        let store = MemoryFieldStore::new();
        store.set_markup("outputCrypto", "<b>x</b>");
        assert_eq!(store.markup("outputCrypto").as_deref(), Some("<b>x</b>"));
        assert_eq!(store.get("outputCrypto").as_deref(), Some(""));
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("rpc_console_fields_{}.json", uuid::Uuid::new_v4()));

        let store = MemoryFieldStore::with_persistence(&path);
        store.set("privateKey", "5Kb8kLf9zgWQnogidDA76MzPL6TsZZY36hWXMssSzNydYXYB9KF");
        store.set_markup("outputCrypto", "<table></table>");
        store.save_to_file().unwrap();

        let loaded = MemoryFieldStore::load_from_file(&path).unwrap();
        assert_eq!(
            loaded.get("privateKey").as_deref(),
            Some("5Kb8kLf9zgWQnogidDA76MzPL6TsZZY36hWXMssSzNydYXYB9KF")
        );
        assert_eq!(loaded.markup("outputCrypto").as_deref(), Some(""));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
