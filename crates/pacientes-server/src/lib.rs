//! REST backend for the patient portal.
//!
//! Every route lives under [`BASE_PATH`]. Handlers run their store work on
//! the blocking pool through [`AppState::with_db`], which also turns
//! internal failures into the `{error, details}` body the clients expect.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use pacientes_core::Database;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorResponse};

pub const BASE_PATH: &str = "/app-pacientes-server";
pub const VERSION: &str = "2.1.0";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run `f` against the database on the blocking pool.
    ///
    /// Internal errors are reported with `context` as their message.
    pub async fn with_db<T, F>(&self, context: &'static str, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Database) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let expose_details = self.config.is_development();
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().map_err(ApiError::internal)?;
            f(&mut guard)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(ApiError::internal(e)),
        };
        result.map_err(|e| e.with_context(context, expose_details))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(status))
        .nest("/api/patients", routes::patients::router())
        .nest("/api/prescriptions", routes::prescriptions::router());

    Router::new()
        .route("/", get(root))
        .nest(BASE_PATH, api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "API del servidor de Pacientes funcionando correctamente",
        "environment": state.config().environment,
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION,
        "endpoints": {
            "patients": format!("{}/api/patients", BASE_PATH),
            "prescriptions": format!("{}/api/prescriptions", BASE_PATH),
            "studies": format!("{}/api/prescriptions/studies", BASE_PATH),
            "certificates": format!("{}/api/prescriptions/certificates", BASE_PATH),
        }
    }))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "API del servidor de Pacientes funcionando correctamente",
        "environment": state.config().environment,
        "timestamp": Utc::now().to_rfc3339(),
        "documentation": format!("{}/status", BASE_PATH),
    }))
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::debug!(%method, path = uri.path(), "no route");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Ruta no encontrada",
            "path": uri.path(),
            "method": method.as_str(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
