//! # API REST
//!
//! HTTP surface for medrec.
//!
//! Handles:
//! - JSON API under `/api`, guarded by the API key gateway
//! - Server-rendered browsing pages (`/`, `/paciente/{name}`) and their forms
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `medrec-core` for data operations and `api-shared` for authorisation.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod guard;
pub mod handlers;
pub mod pages;

use api_shared::{ApiKeyGateway, HealthRes};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use medrec_core::{
    EmergencyContact, Evaluation, EvaluationEntry, PatientRecord, PatientRegistration,
    PatientService, PatientSummary, TaggedEvaluation,
};
use std::sync::Arc;
use tera::Tera;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ErrorRes};

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientService,
    pub gateway: ApiKeyGateway,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Builds the state, compiling the page templates.
    ///
    /// # Errors
    /// Returns a `tera::Error` if a bundled template fails to parse.
    pub fn new(patients: PatientService, gateway: ApiKeyGateway) -> Result<Self, tera::Error> {
        Ok(Self {
            patients,
            gateway,
            templates: Arc::new(pages::templates()?),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_patients,
        handlers::get_patient,
        handlers::upsert_patient,
        handlers::delete_patient,
        handlers::append_evaluation,
        handlers::list_evaluations,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        handlers::OkRes,
        handlers::PatientRes,
        PatientRecord,
        EmergencyContact,
        Evaluation,
        PatientSummary,
        TaggedEvaluation,
        PatientRegistration,
        EvaluationEntry,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// Every `/api` route is wrapped in [`guard::require_api_key`]; the health
/// check, the browsing pages and the documentation are open.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/pacientes", get(handlers::list_patients))
        .route(
            "/api/paciente",
            post(handlers::upsert_patient).put(handlers::upsert_patient),
        )
        .route(
            "/api/paciente/:name",
            get(handlers::get_patient).delete(handlers::delete_patient),
        )
        .route(
            "/api/paciente/:name/evaluaciones",
            post(handlers::append_evaluation),
        )
        .route("/api/evaluaciones", get(handlers::list_evaluations))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(pages::index))
        .route("/registrar", post(pages::register))
        .route("/paciente/:name", get(pages::detail))
        .route("/paciente/:name/evaluacion", post(pages::add_evaluation))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
