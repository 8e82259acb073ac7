//! Registration input.
//!
//! Clients (JSON API, HTML form, CLI) describe a patient with flat snake_case
//! fields. These types accept that shape and turn it into the canonical
//! [`PatientRecord`] keyed by a validated name.

use crate::record::{EmergencyContact, Evaluation, PatientRecord};
use crate::{PatientError, PatientResult};
use medrec_types::lenient::{loose_text, text_list};
use medrec_types::NonEmptyText;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of a patient registration or update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatientRegistration {
    #[serde(default, deserialize_with = "loose_text")]
    pub nombre: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub edad: String,
    #[serde(default, deserialize_with = "text_list")]
    pub enfermedades: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub medicamentos: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub alergias: Vec<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub tipo_sangre: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub contacto_nombre: String,
    #[serde(default, alias = "contacto_tel", deserialize_with = "loose_text")]
    pub contacto_telefono: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub descripcion: String,
    #[serde(default)]
    pub evaluaciones: Vec<EvaluationEntry>,
}

impl PatientRegistration {
    /// Splits the registration into its key and record.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if `nombre` is missing or blank.
    pub fn into_parts(self) -> PatientResult<(NonEmptyText, PatientRecord)> {
        let name = NonEmptyText::new(&self.nombre)
            .map_err(|_| PatientError::InvalidInput("nombre is required".into()))?;

        let record = PatientRecord {
            age: self.edad,
            conditions: self.enfermedades,
            medications: self.medicamentos,
            allergies: self.alergias,
            blood_type: self.tipo_sangre,
            emergency_contact: EmergencyContact {
                name: self.contacto_nombre,
                phone: self.contacto_telefono,
            },
            description: self.descripcion,
            evaluations: self.evaluaciones.into_iter().map(Evaluation::from).collect(),
        }
        .normalised();

        Ok((name, record))
    }
}

/// Body of an evaluation append.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EvaluationEntry {
    #[serde(default, alias = "año", deserialize_with = "loose_text")]
    pub anio: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub presion_arterial: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub colesterol: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub observaciones: String,
}

impl From<EvaluationEntry> for Evaluation {
    fn from(entry: EvaluationEntry) -> Self {
        Evaluation {
            year: entry.anio,
            blood_pressure: entry.presion_arterial,
            cholesterol: entry.colesterol,
            notes: entry.observaciones,
        }
    }
}
