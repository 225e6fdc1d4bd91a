//! `/api/patients` handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use pacientes_core::{
    db::DbError,
    models::{DniPatch, ProfilePatch},
    CheckOutcome, IdentitySync, NewPatient, ScannedIdentity,
};
use serde_json::json;
use tracing::info;

use super::{parse_patient_id, require_dni, PATIENT_NOT_FOUND};
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Header carrying the JSON identity read from the DNI barcode.
pub const DNI_DATA_HEADER: &str = "x-dni-data";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_patient))
        .route("/check/:dni", get(check_patient))
        .route("/:id", put(update_patient))
        .route("/:id/dni-update", put(update_from_dni))
}

/// Decode the optional scanned identity header.
///
/// Names may carry non-ASCII letters, so the raw bytes are read as UTF-8
/// rather than through `HeaderValue::to_str`.
fn scanned_identity(headers: &HeaderMap) -> ApiResult<Option<ScannedIdentity>> {
    let Some(value) = headers.get(DNI_DATA_HEADER) else {
        return Ok(None);
    };
    let identity = std::str::from_utf8(value.as_bytes())
        .ok()
        .and_then(|raw| serde_json::from_str::<ScannedIdentity>(raw).ok())
        .ok_or_else(|| ApiError::bad_request("Encabezado X-DNI-Data inválido"))?;
    Ok(Some(identity))
}

async fn check_patient(
    State(state): State<AppState>,
    Path(dni): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<CheckOutcome>> {
    let dni = require_dni(&dni)?;
    let scanned = scanned_identity(&headers)?;

    let outcome = state
        .with_db("Error al verificar el paciente", move |db| {
            IdentitySync::new(&*db)
                .check(&dni, scanned.as_ref())
                .map_err(ApiError::from)
        })
        .await?;
    Ok(Json(outcome))
}

async fn create_patient(
    State(state): State<AppState>,
    Json(patient): Json<NewPatient>,
) -> ApiResult<impl IntoResponse> {
    let created = state
        .with_db("Error al registrar el paciente", move |db| {
            db.insert_patient(&patient).map_err(|e| match e {
                DbError::Validation(_) => {
                    ApiError::bad_request("Faltan datos obligatorios (dni, nombre, apellido, sexo)")
                }
                DbError::Constraint(_) => {
                    ApiError::Conflict("Ya existe un paciente con ese DNI".to_string())
                }
                other => other.into(),
            })
        })
        .await?;

    info!(patient_id = created.id, "patient registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "patient": created })),
    ))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_patient_id(&id)?;
    let patient = state
        .with_db("Error al actualizar el paciente", move |db| {
            db.update_profile(id, &patch).map_err(|e| match e {
                DbError::NotFound(_) => ApiError::not_found(PATIENT_NOT_FOUND),
                DbError::Validation(_) => {
                    ApiError::bad_request("No se proporcionaron campos válidos para actualizar")
                }
                other => other.into(),
            })
        })
        .await?;

    Ok(Json(json!({ "success": true, "patient": patient })))
}

async fn update_from_dni(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<DniPatch>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_patient_id(&id)?;
    let patient = state
        .with_db("Error al actualizar el paciente con datos del DNI", move |db| {
            db.apply_dni_patch(id, patch).map_err(|e| match e {
                DbError::NotFound(_) => ApiError::not_found(PATIENT_NOT_FOUND),
                DbError::Validation(_) => ApiError::bad_request(
                    "No se proporcionaron campos válidos del DNI para actualizar",
                ),
                DbError::IdentityMismatch(_) => ApiError::bad_request(
                    "El sexo del DNI no coincide con el paciente existente",
                ),
                other => other.into(),
            })
        })
        .await?;

    info!(patient_id = patient.id, "patient updated from scanned DNI");
    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "message": "Datos actualizados desde DNI escaneado",
    })))
}
