use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use navigator_core::{FieldColumns, JobId, Layout, LayoutParts, ShortlistSet};
use navigator_logging::{nav_debug, nav_info, nav_warn};
use serde::{Deserialize, Serialize};

use crate::config::StorageKeys;
use crate::error::StoreError;
use crate::persist::AtomicFileWriter;

/// Origin-scoped string storage, in the manner of `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    read_only: Rc<RefCell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }

    /// Makes every following write fail, like a full or blocked storage quota.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.borrow_mut() = read_only;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if *self.read_only.borrow() {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "storage is read-only"),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One file per key in a directory, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileStore {
    writer: AtomicFileWriter,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    fn filename(key: &str) -> String {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{safe}.json")
    }

    fn path(&self, key: &str) -> PathBuf {
        self.writer.dir().join(Self::filename(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writer.write(&Self::filename(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ColumnsRecord {
    #[serde(default)]
    left: Vec<String>,
    #[serde(default)]
    right: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FieldOrderRecord {
    Columns { columns: ColumnsRecord },
    /// Single flat list written before fields had two columns.
    Legacy(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PreferencesRecord {
    section_order: Vec<String>,
    collapsed_sections: BTreeMap<String, bool>,
    field_order: BTreeMap<String, FieldOrderRecord>,
    collapsed_fields: BTreeMap<String, bool>,
    dual_column_enabled: BTreeMap<String, bool>,
}

impl PreferencesRecord {
    fn from_layout(layout: &Layout) -> Self {
        let parts = layout.to_parts();
        Self {
            section_order: parts.section_order,
            collapsed_sections: parts.collapsed_sections,
            field_order: parts
                .field_order
                .into_iter()
                .map(|(panel, columns)| {
                    let record = FieldOrderRecord::Columns {
                        columns: ColumnsRecord {
                            left: columns.left,
                            right: columns.right,
                        },
                    };
                    (panel, record)
                })
                .collect(),
            collapsed_fields: parts.collapsed_fields,
            dual_column_enabled: parts.dual_column_enabled,
        }
    }

    /// Returns the layout and whether any legacy entry had to be upgraded.
    fn into_layout(self) -> (Layout, bool) {
        let mut migrated = false;
        let field_order = self
            .field_order
            .into_iter()
            .map(|(panel, record)| {
                let columns = match record {
                    FieldOrderRecord::Columns { columns } => {
                        FieldColumns::sanitized(columns.left, columns.right)
                    }
                    FieldOrderRecord::Legacy(order) => {
                        nav_info!("Migrating flat field order of panel {:?}", panel);
                        migrated = true;
                        FieldColumns::sanitized(order, Vec::new())
                    }
                };
                (panel, columns)
            })
            .collect();
        let layout = Layout::from_parts(LayoutParts {
            section_order: self.section_order,
            collapsed_sections: self.collapsed_sections,
            field_order,
            collapsed_fields: self.collapsed_fields,
            dual_column_enabled: self.dual_column_enabled,
        });
        (layout, migrated)
    }
}

/// Typed access to the three persisted records, with legacy upgrades on load.
#[derive(Debug)]
pub struct PersistentStore<S> {
    backend: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> PersistentStore<S> {
    pub fn new(backend: S, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn load_layout(&self) -> Layout {
        let Some(record) = self.read_json::<PreferencesRecord>(&self.keys.preferences) else {
            return Layout::new();
        };
        let (layout, migrated) = record.into_layout();
        if migrated {
            if let Err(err) = self.save_layout(&layout) {
                nav_warn!("Failed to write back migrated preferences: {}", err);
            }
        }
        layout
    }

    pub fn save_layout(&self, layout: &Layout) -> Result<(), StoreError> {
        self.write_json(&self.keys.preferences, &PreferencesRecord::from_layout(layout))
    }

    /// Loads the shortlist, dropping `job_` prefixes, non-numeric entries and
    /// duplicates. A cleaned list is written back immediately.
    pub fn load_shortlist(&self) -> ShortlistSet {
        let Some(raw) = self.read_json::<Vec<serde_json::Value>>(&self.keys.shortlist) else {
            return ShortlistSet::new();
        };
        // Entries stored as bare numbers are rewritten as strings.
        let mut non_string = false;
        let raw: Vec<String> = raw
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(text) => text,
                other => {
                    non_string = true;
                    other.to_string()
                }
            })
            .collect();

        let mut seen = BTreeSet::new();
        let cleaned: Vec<JobId> = raw
            .iter()
            .filter_map(|entry| {
                let id = JobId::from_legacy(entry);
                if id.is_none() {
                    nav_debug!("Dropping malformed shortlist entry {:?}", entry);
                }
                id
            })
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let set: ShortlistSet = cleaned.into_iter().collect();

        let canonical: Vec<String> = set.iter().map(|id| id.as_str().to_string()).collect();
        if non_string || canonical != raw {
            nav_info!(
                "Cleaned shortlist from {} to {} entries",
                raw.len(),
                canonical.len()
            );
            if let Err(err) = self.save_shortlist(&set) {
                nav_warn!("Failed to write back cleaned shortlist: {}", err);
            }
        }
        set
    }

    pub fn save_shortlist(&self, set: &ShortlistSet) -> Result<(), StoreError> {
        let ids: Vec<&str> = set.iter().map(JobId::as_str).collect();
        self.write_json(&self.keys.shortlist, &ids)
    }

    /// Absent means enabled; any stored value other than `"true"` means disabled.
    pub fn load_ui_enabled(&self) -> bool {
        match self.backend.get(&self.keys.ui_enabled) {
            Ok(Some(value)) => value == "true",
            Ok(None) => true,
            Err(err) => {
                nav_warn!("Failed to read ui flag: {}", err);
                true
            }
        }
    }

    pub fn save_ui_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.backend
            .set(&self.keys.ui_enabled, if enabled { "true" } else { "false" })
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let content = match self.backend.get(key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(err) => {
                nav_warn!("Failed to read {}: {}", key, err);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(source) => {
                let err = StoreError::Json {
                    key: key.to_string(),
                    source,
                };
                nav_warn!("Ignoring stored value: {}", err);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &content)
    }
}
