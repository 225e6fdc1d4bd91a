//! Pacientes Core Library
//!
//! Patient portal core: reads the PDF417 barcode of an Argentine DNI,
//! reconciles the scanned identity with the stored patient record and
//! serves the patient's prescriptions, studies and certificates.
//!
//! # Flow
//!
//! ```text
//! PDF417 payload ──► barcode::parse_barcode ──► ScannedIdentity
//!                                                     │
//!                             db::find_patient_by_dni │
//!                                                     ▼
//!                                  ┌──────────────────────────────────┐
//!                                  │   reconcile::reconcile           │
//!                                  │   gate: dni == dni, sexo == sexo │
//!                                  │   diff: nombre, apellido, fecnac │
//!                                  └────────────────┬─────────────────┘
//!                                                   │ updated?
//!                                                   ▼
//!                                     db::update_identity (patch only)
//! ```
//!
//! # Core Principle
//!
//! **Identity is anchored on DNI and sex.** A scan never changes a record
//! whose document number or sex code differs from the scanned one.
//!
//! # Modules
//!
//! - [`barcode`]: DNI barcode payload parser
//! - [`reconcile`]: Identity reconciliation and the check-patient flow
//! - [`dates`]: DNI / ISO date conversion
//! - [`db`]: SQLite patient store and record queries
//! - [`models`]: Domain types (PatientRecord, Prescription, Certificate, etc.)

pub mod barcode;
pub mod dates;
pub mod db;
pub mod models;
pub mod reconcile;

// Re-export commonly used types
pub use barcode::{parse_barcode, BarcodeError};
pub use db::{Database, DbError};
pub use models::{
    Certificate, CertificateKind, CertificateStatus, NewPatient, PatientRecord, PatientSummary,
    Prescription, PrescriptionStatus, ScannedIdentity, Study, StudyStatus,
};
pub use reconcile::{reconcile, CheckOutcome, IdentitySync, PatientStore, Reconciliation};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PortalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Carries the retry hint to show after a failed scan
    #[error("Invalid barcode: {0}")]
    InvalidBarcode(String),
}

impl From<db::DbError> for PortalError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PortalError::NotFound(what),
            db::DbError::Constraint(msg) => PortalError::Conflict(msg),
            db::DbError::Validation(msg) | db::DbError::IdentityMismatch(msg) => {
                PortalError::InvalidInput(msg)
            }
            other => PortalError::DatabaseError(other.to_string()),
        }
    }
}

impl From<barcode::BarcodeError> for PortalError {
    fn from(e: barcode::BarcodeError) -> Self {
        PortalError::InvalidBarcode(e.retry_hint())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PortalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PortalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Scanner Functions (exported to FFI)
// =========================================================================

/// Parse the decoded PDF417 payload of a DNI.
#[uniffi::export]
pub fn parse_dni_barcode(raw: String) -> Result<FfiScannedIdentity, PortalError> {
    Ok(parse_barcode(&raw)?.into())
}

/// Validate a hand-typed DNI number.
#[uniffi::export]
pub fn is_valid_dni(dni: String) -> bool {
    barcode::is_valid_dni(&dni)
}

/// `DD/MM/YYYY` to `YYYY-MM-DD`, `None` when not convertible.
#[uniffi::export]
pub fn dni_date_to_iso(date: String) -> Option<String> {
    dates::to_iso(&date)
}

/// Stored date to `DD/MM/YYYY`, `None` when not convertible.
#[uniffi::export]
pub fn iso_date_to_display(date: String) -> Option<String> {
    dates::to_display(&date)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PortalCore>, PortalError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PortalCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PortalCore>, PortalError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PortalCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PortalCore {
    db: Arc<Mutex<Database>>,
}

impl PortalCore {
    fn require_patient_by_dni(db: &Database, dni: &str) -> Result<PatientRecord, PortalError> {
        db.find_patient_by_dni(dni)?
            .ok_or_else(|| PortalError::NotFound(format!("patient with dni {}", dni)))
    }
}

#[uniffi::export]
impl PortalCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Look up a patient and apply identity corrections from a scan.
    pub fn check_patient(
        &self,
        dni: String,
        scanned: Option<FfiScannedIdentity>,
    ) -> Result<FfiCheckOutcome, PortalError> {
        let db = self.db.lock()?;
        let scanned: Option<ScannedIdentity> = scanned.map(Into::into);
        let outcome = IdentitySync::new(&*db).check(&dni, scanned.as_ref())?;
        Ok(outcome.into())
    }

    /// Register a new patient.
    pub fn register_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, PortalError> {
        let db = self.db.lock()?;
        let created = db.insert_patient(&patient.into())?;
        Ok(created.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, PortalError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(id)?;
        Ok(patient.map(|p| p.into()))
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Prescriptions of the patient with `dni`, newest first.
    pub fn prescriptions_for_dni(&self, dni: String) -> Result<Vec<FfiPrescription>, PortalError> {
        let db = self.db.lock()?;
        let patient = Self::require_patient_by_dni(&db, &dni)?;
        let prescriptions = db.prescriptions_for_patient(patient.id)?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    /// Study orders of the patient with `dni`, newest first.
    pub fn studies_for_dni(&self, dni: String) -> Result<Vec<FfiStudy>, PortalError> {
        let db = self.db.lock()?;
        let patient = Self::require_patient_by_dni(&db, &dni)?;
        let studies = db.studies_for_patient(patient.id)?;
        Ok(studies.into_iter().map(|s| s.into()).collect())
    }

    /// Certificates of the patient with `dni`, classified as of now.
    pub fn certificates_for_dni(&self, dni: String) -> Result<Vec<FfiCertificate>, PortalError> {
        let db = self.db.lock()?;
        let patient = Self::require_patient_by_dni(&db, &dni)?;
        let now = chrono::Local::now().naive_local();
        let certificates = db.certificates_for_patient(patient.id, now)?;
        Ok(certificates
            .into_iter()
            .map(|c| FfiCertificate::new(c, now))
            .collect())
    }
}

// =========================================================================
// FFI-safe Types
// =========================================================================

/// FFI-safe scanned identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScannedIdentity {
    pub dni: String,
    pub apellido: Option<String>,
    pub nombre: Option<String>,
    pub genero: Option<String>,
    pub fecha_nac: Option<String>,
}

impl From<ScannedIdentity> for FfiScannedIdentity {
    fn from(identity: ScannedIdentity) -> Self {
        Self {
            dni: identity.dni,
            apellido: identity.apellido,
            nombre: identity.nombre,
            genero: identity.genero,
            fecha_nac: identity.fecha_nac,
        }
    }
}

impl From<FfiScannedIdentity> for ScannedIdentity {
    fn from(identity: FfiScannedIdentity) -> Self {
        ScannedIdentity {
            dni: identity.dni,
            apellido: identity.apellido,
            nombre: identity.nombre,
            genero: identity.genero,
            fecha_nac: identity.fecha_nac,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub dni: String,
    pub nombre: String,
    pub apellido: String,
    pub sexo: String,
    pub fecnac: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub ciudad: Option<String>,
    pub provincia: Option<String>,
    pub numeroafiliado: Option<String>,
}

impl From<PatientRecord> for FfiPatient {
    fn from(patient: PatientRecord) -> Self {
        Self {
            id: patient.id,
            dni: patient.dni,
            nombre: patient.nombre,
            apellido: patient.apellido,
            sexo: patient.sexo,
            fecnac: patient.fecnac,
            email: patient.email,
            telefono: patient.telefono,
            ciudad: patient.ciudad,
            provincia: patient.provincia,
            numeroafiliado: patient.numeroafiliado,
        }
    }
}

/// FFI-safe registration payload.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub dni: String,
    pub nombre: String,
    pub apellido: String,
    pub sexo: String,
    pub fecnac: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub numeroafiliado: Option<String>,
}

impl From<FfiNewPatient> for NewPatient {
    fn from(patient: FfiNewPatient) -> Self {
        NewPatient {
            fecnac: patient.fecnac,
            email: patient.email,
            telefono: patient.telefono,
            numeroafiliado: patient.numeroafiliado,
            ..NewPatient::new(patient.dni, patient.nombre, patient.apellido, patient.sexo)
        }
    }
}

/// FFI-safe check-patient result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCheckOutcome {
    pub exists: bool,
    pub patient: Option<FfiPatient>,
    pub updated: bool,
}

impl From<CheckOutcome> for FfiCheckOutcome {
    fn from(outcome: CheckOutcome) -> Self {
        Self {
            exists: outcome.exists,
            patient: outcome.patient.map(|p| p.into()),
            updated: outcome.updated.unwrap_or(false),
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub idreceta: i64,
    pub numero: Option<String>,
    pub fechaemision: Option<String>,
    pub medico: String,
    pub diagnostico: Option<String>,
    pub status: String,
    pub dispensable: bool,
    /// First medication plus a counter, for list rows
    pub resumen: String,
    pub medicamentos: Vec<String>,
}

impl From<Prescription> for FfiPrescription {
    fn from(prescription: Prescription) -> Self {
        Self {
            dispensable: prescription.status.is_dispensable(),
            resumen: prescription.medication_summary(),
            idreceta: prescription.idreceta,
            numero: prescription.num_receta_ofuscada,
            fechaemision: prescription.fechaemision,
            medico: prescription.medico_nombre_completo,
            diagnostico: prescription.diagnostico,
            status: prescription.status.label().to_string(),
            medicamentos: prescription
                .medicamentos
                .iter()
                .map(|m| m.display_name())
                .collect(),
        }
    }
}

/// FFI-safe study.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStudy {
    pub id: i64,
    pub id_encriptado: Option<String>,
    pub tipo_estudio: String,
    pub fecha_solicitud: Option<String>,
    pub estado: String,
    pub medico_solicitante: String,
    pub centro_medico: Option<String>,
    pub has_result: bool,
}

impl From<Study> for FfiStudy {
    fn from(study: Study) -> Self {
        Self {
            has_result: study.has_result_available(),
            id: study.id,
            id_encriptado: study.id_encriptado,
            tipo_estudio: study.tipo_estudio,
            fecha_solicitud: study.fecha_solicitud,
            estado: study.estado.label().to_string(),
            medico_solicitante: study.medico_solicitante,
            centro_medico: study.centro_medico,
        }
    }
}

/// FFI-safe certificate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCertificate {
    pub id: i64,
    pub id_encriptado: Option<String>,
    pub tipo: String,
    pub fecha_emision: Option<String>,
    pub fecha_fin: Option<String>,
    pub dias_reposo: Option<u32>,
    pub dias_restantes: Option<i64>,
    pub estado: String,
    pub medico_emisor: String,
}

impl FfiCertificate {
    fn new(certificate: Certificate, now: chrono::NaiveDateTime) -> Self {
        let dias_restantes = certificate.days_remaining(now);
        Self {
            id: certificate.id,
            id_encriptado: certificate.id_encriptado,
            tipo: certificate.tipo_certificado.label().to_string(),
            fecha_emision: certificate.fecha_emision,
            fecha_fin: certificate.fecha_fin,
            dias_reposo: certificate.dias_reposo,
            dias_restantes,
            estado: certificate.estado.label().to_string(),
            medico_emisor: certificate.medico_emisor,
        }
    }
}
