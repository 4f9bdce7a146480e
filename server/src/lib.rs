//! Contag Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and the SQLite implementation
//! - services: Identity, authorization, mutations and feed queries
//! - auth: Bearer token verification against the identity provider
//! - api: axum router and operation dispatch

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod repository;
pub mod services;

use std::sync::Arc;

use axum::Router;

use api::AppState;
use auth::{DevIdentityVerifier, FirebaseIdentityVerifier, IdentityVerifier};
use config::Config;
use domain::DomainResult;
use repository::{init_db, init_memory_db};
use services::file_access::{FileAccess, HttpFileAccess, LoggingFileAccess};
use services::Services;

/// Open the database and wire the router from configuration
pub fn build_app(config: &Config) -> DomainResult<Router> {
    let db = if config.in_memory() {
        init_memory_db()?
    } else {
        init_db(&config.db_path)?
    };

    let file_access: Arc<dyn FileAccess> = match &config.file_access_url {
        Some(url) => Arc::new(HttpFileAccess::new(url.clone())),
        None => {
            tracing::warn!("CONTAG_FILE_ACCESS_URL not set, file access changes are only logged");
            Arc::new(LoggingFileAccess)
        }
    };

    let verifier: Arc<dyn IdentityVerifier> = if config.dev_auth {
        tracing::warn!("development authentication enabled, dev:<email> tokens are trusted");
        Arc::new(DevIdentityVerifier)
    } else {
        Arc::new(FirebaseIdentityVerifier::new(
            config.identity_url.clone(),
            config.identity_api_key.clone(),
        ))
    };

    let state = AppState {
        services: Services::new(db, file_access),
        verifier,
    };
    Ok(api::router(state, &config.allowed_origin))
}
