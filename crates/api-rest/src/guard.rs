//! Credential check applied to the protected API routes.

use crate::error::ApiError;
use crate::AppState;
use api_shared::auth::API_KEY_HEADER;
use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct CredentialQuery {
    api_key: Option<String>,
}

/// Reads the credential from the `x-api-key` header, falling back to the
/// `api_key` query parameter.
pub(crate) fn credential(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| {
            Query::<CredentialQuery>::try_from_uri(uri)
                .ok()
                .and_then(|Query(q)| q.api_key)
        })
}

/// Rejects the request with 401 unless it carries a currently valid API key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = credential(request.headers(), request.uri());
    state.gateway.authorize(credential.as_deref())?;
    Ok(next.run(request).await)
}
