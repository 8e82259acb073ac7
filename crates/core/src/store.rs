//! Record store backends.
//!
//! A [`RecordStore`] loads and saves the *whole* patient collection. There is no
//! incremental persistence: every service operation is a full load, one
//! in-memory mutation and a full save. Concurrent writers race and the last save
//! wins.
//!
//! ## Backends
//!
//! - [`JsonFileStore`]: one pretty-printed JSON document on disk. Saves go to a
//!   temporary file in the same directory which is then renamed over the target,
//!   so a reader sees either the old or the new document and never a torn one.
//! - [`MemoryStore`]: an in-process collection for tests and tooling.

use crate::constants::STORE_INDENT;
use crate::error::StorageError;
use crate::record::Collection;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Load/save abstraction over the backing persistence medium.
pub trait RecordStore: Send + Sync {
    /// Returns the full current collection. A medium that does not exist yet
    /// yields an empty collection.
    fn load_all(&self) -> Result<Collection, StorageError>;

    /// Replaces the persisted collection with `collection`.
    fn save_all(&self, collection: &Collection) -> Result<(), StorageError>;
}

/// File-backed store holding the collection in a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn render(collection: &Collection) -> Result<Vec<u8>, StorageError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(STORE_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        collection
            .serialize(&mut serializer)
            .map_err(StorageError::Serialization)?;
        buf.push(b'\n');
        Ok(buf)
    }

    fn write_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load_all(&self) -> Result<Collection, StorageError> {
        let contents = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("store file {} not found, starting empty", self.path.display());
                return Ok(Collection::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let collection: Collection =
            serde_json::from_slice(&contents).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            "loaded {} patient(s) from {}",
            collection.len(),
            self.path.display()
        );
        Ok(collection)
    }

    fn save_all(&self, collection: &Collection) -> Result<(), StorageError> {
        let rendered = Self::render(collection)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_err(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.write_err(e))?;
        tmp.write_all(&rendered).map_err(|e| self.write_err(e))?;
        // The temporary file is created 0600; keep the existing file's mode.
        if let Ok(existing) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| self.write_err(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        tracing::debug!(
            "saved {} patient(s) to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store. Holds a private copy of the collection; callers never share
/// references into it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Collection, StorageError> {
        let guard = self.collection.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save_all(&self, collection: &Collection) -> Result<(), StorageError> {
        let mut guard = self.collection.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = collection.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EmergencyContact, Evaluation, PatientRecord};
    use tempfile::TempDir;

    fn sample_collection() -> Collection {
        let mut collection = Collection::new();
        collection.insert(
            "Juan".into(),
            PatientRecord {
                age: "80".into(),
                conditions: vec!["Diabetes".into()],
                medications: vec!["Metformina".into()],
                emergency_contact: EmergencyContact {
                    name: "Ana".into(),
                    phone: "999".into(),
                },
                evaluations: vec![Evaluation {
                    year: "2024".into(),
                    blood_pressure: "130/85".into(),
                    cholesterol: "210".into(),
                    notes: "Control trimestral".into(),
                }],
                ..Default::default()
            },
        );
        collection
    }

    #[test]
    fn test_load_missing_file_returns_empty_collection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonFileStore::new(temp_dir.path().join("informacion_medica.json"));

        let collection = store.load_all().expect("load should succeed");
        assert!(collection.is_empty());
    }

    #[test]
    fn test_save_then_load_returns_same_collection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonFileStore::new(temp_dir.path().join("informacion_medica.json"));

        let collection = sample_collection();
        store.save_all(&collection).expect("save should succeed");
        let loaded = store.load_all().expect("load should succeed");
        assert_eq!(loaded, collection);

        // Saving what was loaded leaves the observable collection unchanged.
        store.save_all(&loaded).expect("save should succeed");
        assert_eq!(store.load_all().expect("load should succeed"), collection);
    }

    #[test]
    fn test_save_writes_utf8_with_four_space_indent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("informacion_medica.json");
        let store = JsonFileStore::new(&path);

        store.save_all(&sample_collection()).expect("save should succeed");
        let raw = fs::read_to_string(&path).expect("should read store file");

        assert!(raw.contains("\n    \"Juan\": {"));
        assert!(raw.contains("\"Teléfono\": \"999\""));
        assert!(raw.contains("\"Presión Arterial\""));
    }

    #[test]
    fn test_save_creates_missing_parent_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("data.json");
        let store = JsonFileStore::new(&path);

        store.save_all(&sample_collection()).expect("save should succeed");
        assert!(path.is_file());
    }

    #[test]
    fn test_save_leaves_no_temporary_files_behind() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonFileStore::new(temp_dir.path().join("data.json"));

        store.save_all(&sample_collection()).expect("save should succeed");
        store.save_all(&Collection::new()).expect("save should succeed");

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("data.json")]);
    }

    #[test]
    fn test_load_corrupt_file_is_parse_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path)
            .load_all()
            .expect_err("corrupt store should fail");
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[test]
    fn test_load_directory_is_read_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let err = JsonFileStore::new(temp_dir.path())
            .load_all()
            .expect_err("reading a directory should fail");
        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_all().unwrap().is_empty());

        let collection = sample_collection();
        store.save_all(&collection).unwrap();
        assert_eq!(store.load_all().unwrap(), collection);
    }

    #[test]
    fn test_save_over_directory_is_write_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = JsonFileStore::new(&path)
            .save_all(&sample_collection())
            .expect_err("renaming over a directory should fail");
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data.json");
        let store = JsonFileStore::new(&path);
        store.save_all(&Collection::new()).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        store.save_all(&sample_collection()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
