//! medir-web library - practice directory web application
//!
//! Management pages (behind the Session Gate) maintain the Entity Store;
//! public pages search the Directory Snapshot.

use axum::Router;
use medir_common::config::Config;
use medir_common::session::{SessionConfig, SessionGate};
use medir_common::snapshot::SnapshotStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod flash;
pub mod templates;

pub use crate::error::{WebError, WebResult};

use crate::flash::FlashStore;
use crate::templates::Templates;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Entity Store connection pool
    pub db: SqlitePool,
    /// Directory Snapshot document
    pub snapshot: Arc<SnapshotStore>,
    /// Shared-password session gate
    pub sessions: Arc<SessionGate>,
    /// Pending management flash messages
    pub flashes: FlashStore,
    pub templates: Templates,
    /// Specialty shortcuts offered on the search page
    pub known_specialties: Arc<Vec<String>>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        snapshot: SnapshotStore,
        session: &SessionConfig,
        known_specialties: Vec<String>,
    ) -> Result<Self, WebError> {
        Ok(Self {
            db,
            snapshot: Arc::new(snapshot),
            sessions: Arc::new(SessionGate::new(session)),
            flashes: FlashStore::default(),
            templates: Templates::new()?,
            known_specialties: Arc::new(known_specialties),
        })
    }

    /// Create application state from resolved configuration
    pub fn from_config(db: SqlitePool, config: &Config) -> Result<Self, WebError> {
        Self::new(
            db,
            SnapshotStore::new(&config.snapshot_path),
            &config.session,
            config.known_specialties.clone(),
        )
    }
}

/// Build application router
///
/// Management routes require a live session and redirect to `/login`
/// otherwise. Search and listing pages are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require a management session)
    let protected = Router::new()
        .route("/management", get(api::management_page).post(api::management_page))
        .route("/add_doctor", post(api::add_doctor))
        .route("/add_insurance", post(api::add_insurance))
        .route("/add_specialty", post(api::add_specialty))
        .route("/delete_doctor", post(api::delete_doctor))
        .route("/delete_insurance", post(api::delete_insurance))
        .route("/delete_specialty", post(api::delete_specialty))
        .route("/link", post(api::link_insurance))
        .route("/unlink", post(api::unlink_insurance))
        .route("/link_specialty", post(api::link_specialty))
        .route("/unlink_specialty", post(api::unlink_specialty))
        .route("/mass_link", post(api::mass_link))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/login", get(api::login_page).post(api::login))
        .route("/logout", get(api::logout))
        .route("/specialties", get(api::specialties_page))
        .route("/specialty/:name", get(api::specialty_doctors))
        .route("/query_page", get(api::query_page))
        .route("/standalone_verify", get(api::standalone_verify))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
