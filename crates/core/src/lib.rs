//! # Medrec Core
//!
//! Core business logic for the medrec patient profile service.
//!
//! This crate contains pure data operations:
//! - The canonical patient record model and its on-disk document shape
//! - The [`RecordStore`] abstraction with file-backed and in-memory backends
//! - [`PatientService`], the load/mutate/save operations over the collection
//!
//! **No API concerns**: authentication, HTTP servers and rendering belong in
//! `api-shared` and `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod record;
pub mod registration;
pub mod store;

pub use config::CoreConfig;
pub use error::{PatientError, PatientResult, StorageError};
pub use patient::PatientService;
pub use record::{
    Collection, EmergencyContact, Evaluation, PatientRecord, PatientSummary, TaggedEvaluation,
};
pub use registration::{EvaluationEntry, PatientRegistration};
pub use store::{JsonFileStore, MemoryStore, RecordStore};

pub use medrec_types::{split_comma_list, NonEmptyText, TextError};
