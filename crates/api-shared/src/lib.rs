//! # API Shared
//!
//! Shared utilities for the medrec surfaces.
//!
//! Contains:
//! - The API key access gateway (`auth` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the CLI.

pub mod auth;
pub mod health;

pub use auth::{ApiKeyGateway, AuthError, EnvKeySource, KeyFileSource, KeySource, StaticKeys};
pub use health::{HealthRes, HealthService};
