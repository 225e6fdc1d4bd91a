//! Route handlers, grouped by resource.

pub mod patients;
pub mod prescriptions;

use pacientes_core::{Database, PatientRecord};

use crate::error::{ApiError, ApiResult};

pub(crate) const PATIENT_NOT_FOUND: &str = "Paciente no encontrado";

/// Parse a numeric patient id from a path segment.
pub(crate) fn parse_patient_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("ID de paciente inválido"))
}

/// Reject a blank DNI path segment.
pub(crate) fn require_dni(raw: &str) -> ApiResult<String> {
    let dni = raw.trim();
    if dni.is_empty() {
        return Err(ApiError::bad_request("DNI requerido"));
    }
    Ok(dni.to_string())
}

pub(crate) fn patient_by_dni(db: &Database, dni: &str) -> ApiResult<PatientRecord> {
    db.find_patient_by_dni(dni)?
        .ok_or_else(|| ApiError::not_found(PATIENT_NOT_FOUND))
}
