//! Patient service.
//!
//! Every operation re-reads the whole collection from the injected
//! [`RecordStore`], applies a single change and, for mutations, writes the whole
//! collection back. Nothing is cached between calls.

use crate::record::{Collection, Evaluation, PatientRecord, PatientSummary, TaggedEvaluation};
use crate::store::RecordStore;
use crate::{PatientError, PatientResult};
use medrec_types::NonEmptyText;
use std::sync::Arc;

/// Pure patient data operations - no API concerns
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn RecordStore>,
}

impl PatientService {
    /// Creates a service over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Returns the full current collection.
    pub fn load_all(&self) -> PatientResult<Collection> {
        Ok(self.store.load_all()?)
    }

    /// Replaces the persisted collection.
    pub fn save_all(&self, collection: &Collection) -> PatientResult<()> {
        Ok(self.store.save_all(collection)?)
    }

    /// Creates or fully replaces the record stored under `name`.
    ///
    /// The name is trimmed before use. The record is stored as given after list
    /// cleaning; no field of a previous record under the same name survives.
    ///
    /// # Returns
    ///
    /// The stored key and record.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - `name` is empty or whitespace ([`PatientError::InvalidInput`])
    /// - the store cannot be read or written ([`PatientError::StorageUnavailable`])
    pub fn upsert(
        &self,
        name: &str,
        record: PatientRecord,
    ) -> PatientResult<(String, PatientRecord)> {
        let name = NonEmptyText::new(name)
            .map_err(|_| PatientError::InvalidInput("patient name cannot be empty".into()))?
            .into_inner();
        let record = record.normalised();

        let mut collection = self.load_all()?;
        let replaced = collection.insert(name.clone(), record.clone()).is_some();
        self.save_all(&collection)?;

        if replaced {
            tracing::info!("replaced patient record {:?}", name);
        } else {
            tracing::info!("registered patient record {:?}", name);
        }
        Ok((name, record))
    }

    /// Looks up one record.
    ///
    /// # Errors
    ///
    /// [`PatientError::NotFound`] if `name` is not in the collection.
    pub fn get(&self, name: &str) -> PatientResult<PatientRecord> {
        self.load_all()?
            .remove(name)
            .ok_or_else(|| PatientError::NotFound(name.to_string()))
    }

    /// Removes one record.
    ///
    /// # Errors
    ///
    /// [`PatientError::NotFound`] if `name` is not in the collection; the store is
    /// not rewritten in that case.
    pub fn delete(&self, name: &str) -> PatientResult<()> {
        let mut collection = self.load_all()?;
        if collection.remove(name).is_none() {
            return Err(PatientError::NotFound(name.to_string()));
        }
        self.save_all(&collection)?;

        tracing::info!("deleted patient record {:?}", name);
        Ok(())
    }

    /// Appends `evaluation` to the end of the patient's evaluation history.
    ///
    /// # Returns
    ///
    /// The updated record.
    ///
    /// # Errors
    ///
    /// [`PatientError::NotFound`] if `name` is not in the collection.
    pub fn append_evaluation(
        &self,
        name: &str,
        evaluation: Evaluation,
    ) -> PatientResult<PatientRecord> {
        let mut collection = self.load_all()?;
        let record = collection
            .get_mut(name)
            .ok_or_else(|| PatientError::NotFound(name.to_string()))?;
        record.evaluations.push(evaluation);
        let updated = record.clone();
        self.save_all(&collection)?;

        tracing::info!(
            "appended evaluation #{} to patient record {:?}",
            updated.evaluations.len(),
            name
        );
        Ok(updated)
    }

    /// Name and age of every patient, ordered by name.
    pub fn list_summaries(&self) -> PatientResult<Vec<PatientSummary>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|(name, record)| PatientSummary {
                name,
                age: record.age,
            })
            .collect())
    }

    /// Every evaluation in the collection tagged with its patient, ordered by
    /// patient name and then by append order.
    pub fn list_evaluations(&self) -> PatientResult<Vec<TaggedEvaluation>> {
        Ok(self
            .load_all()?
            .into_iter()
            .flat_map(|(name, record)| {
                record
                    .evaluations
                    .into_iter()
                    .map(move |evaluation| TaggedEvaluation {
                        patient: name.clone(),
                        evaluation,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::record::EmergencyContact;
    use crate::store::{JsonFileStore, MemoryStore};
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Loads succeed, every save fails.
    struct ReadOnlyStore(MemoryStore);

    impl RecordStore for ReadOnlyStore {
        fn load_all(&self) -> Result<Collection, StorageError> {
            self.0.load_all()
        }

        fn save_all(&self, _collection: &Collection) -> Result<(), StorageError> {
            Err(StorageError::Write {
                path: PathBuf::from("informacion_medica.json"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only medium"),
            })
        }
    }

    fn memory_service() -> PatientService {
        PatientService::new(Arc::new(MemoryStore::new()))
    }

    fn juan() -> PatientRecord {
        PatientRecord {
            age: "80".into(),
            conditions: vec!["Diabetes".into()],
            medications: vec!["Metformina".into()],
            emergency_contact: EmergencyContact {
                name: "Ana".into(),
                phone: "999".into(),
            },
            ..Default::default()
        }
    }

    fn evaluation(year: &str) -> Evaluation {
        Evaluation {
            year: year.into(),
            blood_pressure: "120/80".into(),
            cholesterol: "180".into(),
            notes: format!("Revisión {year}"),
        }
    }

    #[test]
    fn test_upsert_then_get_returns_record() {
        let service = memory_service();
        service.upsert("Juan", juan()).expect("upsert should succeed");

        let record = service.get("Juan").expect("get should succeed");
        assert_eq!(record, juan());
    }

    #[test]
    fn test_upsert_rejects_empty_name_without_writing() {
        let service = memory_service();

        let err = service.upsert("  ", juan()).expect_err("empty name should fail");
        assert!(matches!(err, PatientError::InvalidInput(_)));
        assert!(service.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_twice_equals_upsert_once() {
        let once = memory_service();
        once.upsert("Juan", juan()).unwrap();

        let twice = memory_service();
        twice.upsert("Juan", juan()).unwrap();
        twice.upsert("Juan", juan()).unwrap();

        assert_eq!(once.load_all().unwrap(), twice.load_all().unwrap());
    }

    #[test]
    fn test_upsert_replaces_whole_record() {
        let service = memory_service();
        let mut first = juan();
        first.allergies = vec!["Penicilina".into()];
        first.evaluations = vec![evaluation("2022")];
        service.upsert("Juan", first).unwrap();

        let second = PatientRecord {
            age: "81".into(),
            ..Default::default()
        };
        service.upsert("Juan", second.clone()).unwrap();

        assert_eq!(service.get("Juan").unwrap(), second);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let service = memory_service();
        service.upsert("Juan", juan()).unwrap();

        assert!(matches!(service.get("juan"), Err(PatientError::NotFound(_))));
    }

    #[test]
    fn test_get_and_delete_missing_patient_return_not_found() {
        let service = memory_service();
        service.upsert("Juan", juan()).unwrap();

        assert!(matches!(service.get("Pedro"), Err(PatientError::NotFound(_))));
        assert!(matches!(service.delete("Pedro"), Err(PatientError::NotFound(_))));
        assert_eq!(service.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_then_delete_again() {
        let service = memory_service();
        service.upsert("Juan", juan()).unwrap();

        service.delete("Juan").expect("first delete should succeed");
        let err = service.delete("Juan").expect_err("second delete should fail");
        assert!(matches!(err, PatientError::NotFound(_)));
    }

    #[test]
    fn test_append_evaluation_is_strictly_additive() {
        let service = memory_service();
        let mut record = juan();
        record.evaluations = vec![evaluation("2022"), evaluation("2023")];
        service.upsert("Juan", record).unwrap();

        let before = service.get("Juan").unwrap().evaluations;
        let updated = service
            .append_evaluation("Juan", evaluation("2024"))
            .expect("append should succeed");

        assert_eq!(updated.evaluations.len(), before.len() + 1);
        assert_eq!(&updated.evaluations[..before.len()], &before[..]);
        assert_eq!(updated.evaluations.last(), Some(&evaluation("2024")));
        assert_eq!(service.get("Juan").unwrap(), updated);
    }

    #[test]
    fn test_append_evaluation_to_missing_patient() {
        let service = memory_service();
        let err = service
            .append_evaluation("Pedro", evaluation("2024"))
            .expect_err("missing patient should fail");
        assert!(matches!(err, PatientError::NotFound(_)));
    }

    #[test]
    fn test_list_summaries_and_evaluations() {
        let service = memory_service();
        let mut maria = juan();
        maria.age = "45".into();
        maria.evaluations = vec![evaluation("2021")];
        service.upsert("María", maria).unwrap();
        service.upsert("Juan", juan()).unwrap();
        service.append_evaluation("Juan", evaluation("2024")).unwrap();

        let summaries = service.list_summaries().unwrap();
        assert_eq!(
            summaries,
            vec![
                PatientSummary {
                    name: "Juan".into(),
                    age: "80".into()
                },
                PatientSummary {
                    name: "María".into(),
                    age: "45".into()
                },
            ]
        );

        let evaluations = service.list_evaluations().unwrap();
        let tags: Vec<_> = evaluations
            .iter()
            .map(|e| (e.patient.as_str(), e.evaluation.year.as_str()))
            .collect();
        assert_eq!(tags, vec![("Juan", "2024"), ("María", "2021")]);
    }

    #[test]
    fn test_each_call_rereads_the_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("informacion_medica.json");
        let service = PatientService::new(Arc::new(JsonFileStore::new(&path)));
        let other = PatientService::new(Arc::new(JsonFileStore::new(&path)));

        service.upsert("Juan", juan()).unwrap();
        // A write through another handle is visible on the next call.
        other.delete("Juan").unwrap();

        assert!(matches!(service.get("Juan"), Err(PatientError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_store_is_storage_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("informacion_medica.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let service = PatientService::new(Arc::new(JsonFileStore::new(&path)));

        assert!(matches!(
            service.upsert("Juan", juan()),
            Err(PatientError::StorageUnavailable(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2");
    }

    #[test]
    fn test_failed_save_is_storage_unavailable() {
        let inner = MemoryStore::new();
        inner.save_all(&Collection::from([("Juan".to_string(), juan())])).unwrap();
        let service = PatientService::new(Arc::new(ReadOnlyStore(inner)));

        for result in [
            service.upsert("María", juan()).map(|_| ()),
            service.delete("Juan"),
            service.append_evaluation("Juan", evaluation("2024")).map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(PatientError::StorageUnavailable(StorageError::Write { .. }))
            ));
        }
        // Reads are unaffected and nothing was applied.
        assert_eq!(service.load_all().unwrap().len(), 1);
        assert!(service.get("Juan").unwrap().evaluations.is_empty());
    }

    #[test]
    fn test_legacy_and_canonical_keys_together_still_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("informacion_medica.json");
        std::fs::write(
            &path,
            r#"{"Juan": {"Contacto": {"Nombre": "A"}, "Contacto de Emergencia": {"Nombre": "B"}}}"#,
        )
        .unwrap();
        let service = PatientService::new(Arc::new(JsonFileStore::new(&path)));

        let collection = service.load_all().expect("load should succeed");
        assert_eq!(collection["Juan"].emergency_contact.name, "B");

        // The next write drops the legacy key.
        service.append_evaluation("Juan", evaluation("2024")).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"Contacto\""));
        assert!(raw.contains("\"Contacto de Emergencia\""));
    }
}
