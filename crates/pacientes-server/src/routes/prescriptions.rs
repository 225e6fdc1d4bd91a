//! `/api/prescriptions` handlers: prescriptions, study orders and
//! medical certificates.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDateTime};
use pacientes_core::{db::DbError, models::NewPrescription};
use serde_json::json;
use tracing::{debug, info};

use super::{parse_patient_id, patient_by_dni, require_dni, PATIENT_NOT_FOUND};
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_prescription))
        .route("/patient/:patient_id", get(prescriptions_by_patient))
        .route("/dni/:dni", get(prescriptions_by_dni))
        .route("/studies/dni/:dni", get(studies_by_dni))
        .route("/certificates/dni/:dni", get(certificates_by_dni))
        .route("/certificates/patient/:patient_id", get(certificates_by_patient))
        .route(
            "/certificates/certificate/:encrypted_id",
            get(certificate_by_encrypted_id),
        )
}

/// Certificate status depends on the server's local clock.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

// ============================================================================
// Prescriptions
// ============================================================================

async fn prescriptions_by_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let patient_id = parse_patient_id(&patient_id)?;
    let prescriptions = state
        .with_db("Error al obtener las recetas del paciente", move |db| {
            Ok(db.prescriptions_for_patient(patient_id)?)
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": prescriptions.len(),
        "prescriptions": prescriptions,
    })))
}

async fn prescriptions_by_dni(
    State(state): State<AppState>,
    Path(dni): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dni = require_dni(&dni)?;
    let (patient, prescriptions) = state
        .with_db("Error al obtener las recetas por DNI", move |db| {
            let patient = patient_by_dni(db, &dni)?;
            let prescriptions = db.prescriptions_for_patient(patient.id)?;
            Ok((patient.summary(), prescriptions))
        })
        .await?;

    debug!(patient_id = patient.id, count = prescriptions.len(), "prescriptions by dni");
    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "count": prescriptions.len(),
        "prescriptions": prescriptions,
    })))
}

async fn create_prescription(
    State(state): State<AppState>,
    Json(new): Json<NewPrescription>,
) -> ApiResult<impl IntoResponse> {
    let prescription = state
        .with_db("Error al crear la receta", move |db| {
            db.create_prescription(&new).map_err(|e| match e {
                DbError::Validation(_) => ApiError::bad_request("Faltan campos obligatorios"),
                DbError::NotFound(_) => ApiError::not_found(PATIENT_NOT_FOUND),
                other => other.into(),
            })
        })
        .await?;

    info!(
        idreceta = prescription.idreceta,
        idpaciente = prescription.idpaciente,
        "prescription created"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Receta creada exitosamente",
            "prescription": prescription,
        })),
    ))
}

// ============================================================================
// Study orders
// ============================================================================

async fn studies_by_dni(
    State(state): State<AppState>,
    Path(dni): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dni = require_dni(&dni)?;
    let (patient, studies) = state
        .with_db("Error al obtener los estudios médicos por DNI", move |db| {
            let patient = patient_by_dni(db, &dni)?;
            let studies = db.studies_for_patient(patient.id)?;
            Ok((patient.summary(), studies))
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "count": studies.len(),
        "studies": studies,
    })))
}

// ============================================================================
// Certificates
// ============================================================================

async fn certificates_by_dni(
    State(state): State<AppState>,
    Path(dni): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dni = require_dni(&dni)?;
    let (patient, certificates) = state
        .with_db("Error al obtener los certificados médicos por DNI", move |db| {
            let patient = patient_by_dni(db, &dni)?;
            let certificates = db.certificates_for_patient(patient.id, now())?;
            Ok((patient.summary(), certificates))
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "count": certificates.len(),
        "certificates": certificates,
    })))
}

async fn certificates_by_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let patient_id = parse_patient_id(&patient_id)?;
    let certificates = state
        .with_db("Error al obtener los certificados del paciente", move |db| {
            Ok(db.certificates_for_patient(patient_id, now())?)
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": certificates.len(),
        "certificates": certificates,
    })))
}

async fn certificate_by_encrypted_id(
    State(state): State<AppState>,
    Path(encrypted_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let encrypted_id = encrypted_id.trim().to_string();
    if encrypted_id.is_empty() {
        return Err(ApiError::bad_request("ID encriptado requerido"));
    }

    let (patient, certificate) = state
        .with_db("Error al obtener el certificado", move |db| {
            db.certificate_by_encrypted_id(&encrypted_id, now())?
                .ok_or_else(|| ApiError::not_found("Certificado no encontrado"))
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "certificate": certificate,
    })))
}
