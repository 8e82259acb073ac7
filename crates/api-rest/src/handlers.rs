//! JSON API handlers.
//!
//! Every `/api` handler sits behind [`crate::guard::require_api_key`].

use crate::error::{ApiError, ErrorRes};
use crate::AppState;
use api_shared::{HealthRes, HealthService};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use medrec_core::{
    Collection, Evaluation, EvaluationEntry, PatientRecord, PatientRegistration, PatientSummary,
    TaggedEvaluation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OkRes {
    pub ok: bool,
}

/// Acknowledges a mutation and echoes the stored record keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub ok: bool,
    pub paciente: BTreeMap<String, PatientRecord>,
}

impl PatientRes {
    fn single(name: String, record: PatientRecord) -> Self {
        Self {
            ok: true,
            paciente: BTreeMap::from([(name, record)]),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    summary: Option<String>,
}

impl ListQuery {
    fn summary(&self) -> bool {
        self.summary
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("true") || s.trim() == "1")
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint. Not protected.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/pacientes",
    params(
        ("summary" = Option<bool>, Query, description = "Return only name and age of each patient")
    ),
    responses(
        (status = 200, description = "Full collection keyed by name, or a list of name/age summaries", body = BTreeMap<String, PatientRecord>),
        (status = 400, description = "Malformed query string", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all patients
///
/// # Returns
/// * the full collection as `{name: record}`, or
/// * `[{name, age}]` when `summary=true`
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if query.summary() {
        let summaries: Vec<PatientSummary> = state.patients.list_summaries()?;
        Ok(Json(summaries).into_response())
    } else {
        let collection: Collection = state.patients.load_all()?;
        Ok(Json(collection).into_response())
    }
}

#[utoipa::path(
    get,
    path = "/api/paciente/{name}",
    params(("name" = String, Path, description = "Patient name (case-sensitive)")),
    responses(
        (status = 200, description = "The record keyed by name", body = BTreeMap<String, PatientRecord>),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BTreeMap<String, PatientRecord>>, ApiError> {
    let record = state.patients.get(&name)?;
    Ok(Json(BTreeMap::from([(name, record)])))
}

#[utoipa::path(
    post,
    path = "/api/paciente",
    request_body = PatientRegistration,
    responses(
        (status = 201, description = "Patient created or replaced", body = PatientRes),
        (status = 400, description = "Missing nombre or unparseable body", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create or replace a patient record
///
/// Also routed for `PUT`. The record stored under `nombre` is replaced as a
/// whole, evaluations included.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not valid JSON for a registration, or
/// - `nombre` is missing or blank.
#[axum::debug_handler]
pub async fn upsert_patient(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let registration: PatientRegistration = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;
    let (name, record) = registration.into_parts()?;

    let (name, record) = state.patients.upsert(name.as_str(), record)?;
    Ok((StatusCode::CREATED, Json(PatientRes::single(name, record))))
}

#[utoipa::path(
    delete,
    path = "/api/paciente/{name}",
    params(("name" = String, Path, description = "Patient name (case-sensitive)")),
    responses(
        (status = 200, description = "Patient deleted", body = OkRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OkRes>, ApiError> {
    state.patients.delete(&name)?;
    Ok(Json(OkRes { ok: true }))
}

#[utoipa::path(
    post,
    path = "/api/paciente/{name}/evaluaciones",
    params(("name" = String, Path, description = "Patient name (case-sensitive)")),
    request_body = EvaluationEntry,
    responses(
        (status = 201, description = "Evaluation appended", body = PatientRes),
        (status = 400, description = "Unparseable body", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Append an evaluation to a patient's history
#[axum::debug_handler]
pub async fn append_evaluation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let entry: EvaluationEntry = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;

    let record = state
        .patients
        .append_evaluation(&name, Evaluation::from(entry))?;
    Ok((StatusCode::CREATED, Json(PatientRes::single(name, record))))
}

#[utoipa::path(
    get,
    path = "/api/evaluaciones",
    responses(
        (status = 200, description = "Every evaluation tagged with its patient", body = Vec<TaggedEvaluation>),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_evaluations(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaggedEvaluation>>, ApiError> {
    Ok(Json(state.patients.list_evaluations()?))
}
