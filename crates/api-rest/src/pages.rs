//! Server-rendered browsing pages.
//!
//! Reads are open. The two form posts mutate the collection, so each handler
//! authorises the form's `api_key` field through the gateway before delegating.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use medrec_core::{Evaluation, EvaluationEntry, PatientError, PatientRecord, PatientRegistration};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

pub(crate) const INDEX_TEMPLATE: &str = "index.html";
pub(crate) const DETAIL_TEMPLATE: &str = "detail.html";

/// Builds the template set. Names ending in `.html` are autoescaped.
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        (INDEX_TEMPLATE, include_str!("../templates/index.html")),
        (DETAIL_TEMPLATE, include_str!("../templates/detail.html")),
    ])?;
    Ok(tera)
}

#[derive(Serialize)]
struct EvaluationView<'a> {
    year: &'a str,
    blood_pressure: &'a str,
    cholesterol: &'a str,
    notes: &'a str,
}

impl<'a> From<&'a Evaluation> for EvaluationView<'a> {
    fn from(e: &'a Evaluation) -> Self {
        Self {
            year: &e.year,
            blood_pressure: &e.blood_pressure,
            cholesterol: &e.cholesterol,
            notes: &e.notes,
        }
    }
}

#[derive(Serialize)]
struct PatientView<'a> {
    name: &'a str,
    age: &'a str,
    conditions: &'a [String],
    medications: &'a [String],
    allergies: &'a [String],
    blood_type: &'a str,
    contact_name: &'a str,
    contact_phone: &'a str,
    description: &'a str,
    evaluations: Vec<EvaluationView<'a>>,
}

impl<'a> PatientView<'a> {
    fn new(name: &'a str, record: &'a PatientRecord) -> Self {
        Self {
            name,
            age: &record.age,
            conditions: &record.conditions,
            medications: &record.medications,
            allergies: &record.allergies,
            blood_type: &record.blood_type,
            contact_name: &record.emergency_contact.name,
            contact_phone: &record.emergency_contact.phone,
            description: &record.description,
            evaluations: record.evaluations.iter().map(EvaluationView::from).collect(),
        }
    }
}

fn render(tera: &Tera, template: &str, context: &Context) -> Result<Html<String>, ApiError> {
    tera.render(template, context).map(Html).map_err(|e| {
        tracing::error!("Template {} failed to render: {:?}", template, e);
        ApiError::internal()
    })
}

fn detail_url(name: &str) -> String {
    format!("/paciente/{}", utf8_percent_encode(name, NON_ALPHANUMERIC))
}

/// Index page: every patient plus the registration form.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let collection = state.patients.load_all()?;
    let patients: Vec<PatientView<'_>> = collection
        .iter()
        .map(|(name, record)| PatientView::new(name, record))
        .collect();

    let mut context = Context::new();
    context.insert("patients", &patients);
    render(&state.templates, INDEX_TEMPLATE, &context)
}

/// Detail page for one patient. Unknown names render the page's not-found
/// variant with a 404 status.
pub async fn detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let mut context = Context::new();
    context.insert("name", &name);
    context.insert("action", &format!("{}/evaluacion", detail_url(&name)));

    match state.patients.get(&name) {
        Ok(record) => {
            context.insert("patient", &PatientView::new(&name, &record));
            Ok(render(&state.templates, DETAIL_TEMPLATE, &context)?.into_response())
        }
        Err(PatientError::NotFound(_)) => {
            let page = render(&state.templates, DETAIL_TEMPLATE, &context)?;
            Ok((StatusCode::NOT_FOUND, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    api_key: String,
    #[serde(flatten)]
    registration: PatientRegistration,
}

/// Form registration; list fields are comma-separated.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    state.gateway.authorize(Some(&form.api_key))?;

    let (name, record) = form.registration.into_parts()?;
    state.patients.upsert(name.as_str(), record)?;
    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct EvaluationForm {
    #[serde(default)]
    api_key: String,
    #[serde(flatten)]
    entry: EvaluationEntry,
}

pub async fn add_evaluation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Form(form): Form<EvaluationForm>,
) -> Result<Redirect, ApiError> {
    state.gateway.authorize(Some(&form.api_key))?;

    state
        .patients
        .append_evaluation(&name, Evaluation::from(form.entry))?;
    Ok(Redirect::to(&detail_url(&name)))
}
