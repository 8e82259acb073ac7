//! Patient record data model.
//!
//! The serde names are the on-disk document keys. Key variants written by older
//! versions of the application are still read, so a document is normalised to
//! the canonical shape the first time it is loaded and rewritten.

use medrec_types::lenient::{loose_text, text_list};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// The whole persisted collection, keyed by patient name.
pub type Collection = BTreeMap<String, PatientRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "StoredContact")]
pub struct EmergencyContact {
    #[serde(rename = "Nombre")]
    pub name: String,
    #[serde(rename = "Teléfono")]
    pub phone: String,
}

/// A periodic medical assessment. Evaluations are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "StoredEvaluation")]
pub struct Evaluation {
    #[serde(rename = "Año")]
    pub year: String,
    #[serde(rename = "Presión Arterial")]
    pub blood_pressure: String,
    #[serde(rename = "Colesterol")]
    pub cholesterol: String,
    #[serde(rename = "Observaciones")]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "StoredRecord")]
pub struct PatientRecord {
    #[serde(rename = "Edad")]
    pub age: String,
    #[serde(rename = "Enfermedades")]
    pub conditions: Vec<String>,
    #[serde(rename = "Medicamentos")]
    pub medications: Vec<String>,
    #[serde(rename = "Alergias")]
    pub allergies: Vec<String>,
    #[serde(rename = "Tipo de Sangre")]
    pub blood_type: String,
    #[serde(rename = "Contacto de Emergencia")]
    pub emergency_contact: EmergencyContact,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Evaluaciones")]
    pub evaluations: Vec<Evaluation>,
}

// Stored shapes. Each legacy key is read into its own slot and only used when
// the canonical key is absent, so a document carrying both still loads.

fn present_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    loose_text(d).map(Some)
}

fn pick<T: Default>(canonical: Option<T>, legacy: Option<T>) -> T {
    canonical.or(legacy).unwrap_or_default()
}

#[derive(Deserialize)]
struct StoredContact {
    #[serde(rename = "Nombre", default, deserialize_with = "loose_text")]
    name: String,
    #[serde(rename = "Teléfono", default, deserialize_with = "present_text")]
    phone: Option<String>,
    #[serde(rename = "Telefono", default, deserialize_with = "present_text")]
    legacy_phone: Option<String>,
}

impl From<StoredContact> for EmergencyContact {
    fn from(raw: StoredContact) -> Self {
        Self {
            name: raw.name,
            phone: pick(raw.phone, raw.legacy_phone),
        }
    }
}

#[derive(Deserialize)]
struct StoredEvaluation {
    #[serde(rename = "Año", default, deserialize_with = "present_text")]
    year: Option<String>,
    #[serde(rename = "Anio", default, deserialize_with = "present_text")]
    legacy_year: Option<String>,
    #[serde(rename = "Presión Arterial", default, deserialize_with = "present_text")]
    blood_pressure: Option<String>,
    #[serde(rename = "Presion Arterial", default, deserialize_with = "present_text")]
    legacy_blood_pressure: Option<String>,
    #[serde(rename = "Colesterol", default, deserialize_with = "loose_text")]
    cholesterol: String,
    #[serde(rename = "Observaciones", default, deserialize_with = "loose_text")]
    notes: String,
}

impl From<StoredEvaluation> for Evaluation {
    fn from(raw: StoredEvaluation) -> Self {
        Self {
            year: pick(raw.year, raw.legacy_year),
            blood_pressure: pick(raw.blood_pressure, raw.legacy_blood_pressure),
            cholesterol: raw.cholesterol,
            notes: raw.notes,
        }
    }
}

#[derive(Deserialize)]
struct StoredRecord {
    #[serde(rename = "Edad", default, deserialize_with = "loose_text")]
    age: String,
    #[serde(rename = "Enfermedades", default, deserialize_with = "text_list")]
    conditions: Vec<String>,
    #[serde(rename = "Medicamentos", default, deserialize_with = "text_list")]
    medications: Vec<String>,
    #[serde(rename = "Alergias", default, deserialize_with = "text_list")]
    allergies: Vec<String>,
    #[serde(rename = "Tipo de Sangre", default, deserialize_with = "present_text")]
    blood_type: Option<String>,
    #[serde(rename = "TipoSangre", default, deserialize_with = "present_text")]
    legacy_blood_type: Option<String>,
    #[serde(rename = "Contacto de Emergencia", default)]
    emergency_contact: Option<EmergencyContact>,
    #[serde(rename = "Contacto", default)]
    legacy_contact: Option<EmergencyContact>,
    #[serde(rename = "Descripcion", default, deserialize_with = "present_text")]
    description: Option<String>,
    #[serde(rename = "Descripción", default, deserialize_with = "present_text")]
    legacy_description: Option<String>,
    #[serde(rename = "Evaluaciones", default)]
    evaluations: Vec<Evaluation>,
}

impl From<StoredRecord> for PatientRecord {
    fn from(raw: StoredRecord) -> Self {
        Self {
            age: raw.age,
            conditions: raw.conditions,
            medications: raw.medications,
            allergies: raw.allergies,
            blood_type: pick(raw.blood_type, raw.legacy_blood_type),
            emergency_contact: pick(raw.emergency_contact, raw.legacy_contact),
            description: pick(raw.description, raw.legacy_description),
            evaluations: raw.evaluations,
        }
    }
}

impl PatientRecord {
    /// Applies the boundary rules to a record built in code rather than
    /// deserialised: list entries are trimmed and blanks dropped, text is trimmed.
    pub fn normalised(mut self) -> Self {
        self.age = self.age.trim().to_owned();
        self.conditions = medrec_types::clean_entries(&self.conditions);
        self.medications = medrec_types::clean_entries(&self.medications);
        self.allergies = medrec_types::clean_entries(&self.allergies);
        self.blood_type = self.blood_type.trim().to_owned();
        self
    }
}

/// Abbreviated listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientSummary {
    pub name: String,
    pub age: String,
}

/// An evaluation surfaced outside its record, tagged with the owning patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaggedEvaluation {
    #[serde(rename = "paciente")]
    pub patient: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_document_is_normalised() {
        let raw = r#"{
            "Edad": 80,
            "Enfermedades": ["Diabetes", " Hipertensión", ""],
            "Medicamentos": ["Metformina"],
            "TipoSangre": "O+",
            "Contacto": {"Nombre": "Ana", "Telefono": "999"}
        }"#;
        let record: PatientRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.age, "80");
        assert_eq!(record.conditions, vec!["Diabetes", "Hipertensión"]);
        assert_eq!(record.blood_type, "O+");
        assert_eq!(record.emergency_contact.name, "Ana");
        assert_eq!(record.emergency_contact.phone, "999");
        assert!(record.allergies.is_empty());
        assert!(record.evaluations.is_empty());
    }

    #[test]
    fn test_canonical_key_wins_over_legacy_duplicate() {
        let raw = r#"{
            "Contacto": {"Nombre": "A", "Telefono": "111"},
            "Contacto de Emergencia": {"Nombre": "B", "Teléfono": "222", "Telefono": "333"},
            "TipoSangre": "O+",
            "Tipo de Sangre": "AB-",
            "Descripción": "antigua",
            "Descripcion": "actual",
            "Evaluaciones": [{"Anio": 2020, "Año": "2021", "Presion Arterial": "1", "Presión Arterial": "2"}]
        }"#;
        let record: PatientRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.emergency_contact.name, "B");
        assert_eq!(record.emergency_contact.phone, "222");
        assert_eq!(record.blood_type, "AB-");
        assert_eq!(record.description, "actual");
        assert_eq!(record.evaluations[0].year, "2021");
        assert_eq!(record.evaluations[0].blood_pressure, "2");

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("Contacto").is_none());
        assert!(value.get("Descripción").is_none());
    }

    #[test]
    fn test_record_serialises_canonical_keys() {
        let record = PatientRecord {
            age: "80".into(),
            blood_type: "A-".into(),
            evaluations: vec![Evaluation {
                year: "2024".into(),
                blood_pressure: "120/80".into(),
                cholesterol: "190".into(),
                notes: "Estable".into(),
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["Edad"], "80");
        assert_eq!(value["Tipo de Sangre"], "A-");
        assert_eq!(value["Contacto de Emergencia"]["Teléfono"], "");
        assert_eq!(value["Evaluaciones"][0]["Presión Arterial"], "120/80");
        assert!(value.get("TipoSangre").is_none());
    }

    #[test]
    fn test_tagged_evaluation_flattens_fields() {
        let tagged = TaggedEvaluation {
            patient: "Juan".into(),
            evaluation: Evaluation {
                year: "2023".into(),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&tagged).unwrap();
        assert_eq!(value["paciente"], "Juan");
        assert_eq!(value["Año"], "2023");
    }

    #[test]
    fn test_normalised_cleans_lists() {
        let record = PatientRecord {
            age: " 33 ".into(),
            allergies: vec!["  Penicilina ".into(), " ".into()],
            ..Default::default()
        }
        .normalised();
        assert_eq!(record.age, "33");
        assert_eq!(record.allergies, vec!["Penicilina"]);
    }
}
