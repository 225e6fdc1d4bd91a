//! Prescription models.

use serde::{Deserialize, Serialize};

/// Display status of a prescription, derived from its stored flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "String", from = "String")]
pub enum PrescriptionStatus {
    /// No state recorded; valid for dispensing
    Activa,
    /// Locked by the dispensing workflow
    Bloqueada,
    /// Voided, with a recorded reason
    Anulada,
    /// Any other state stored upstream (uppercased)
    Other(String),
}

impl PrescriptionStatus {
    /// Classify from stored columns. Voiding wins over locking, locking
    /// wins over the free-text state.
    pub fn classify(estado: Option<&str>, anulacionmotivo: Option<&str>, bloqueo: bool) -> Self {
        if has_text(anulacionmotivo) {
            return Self::Anulada;
        }
        if bloqueo {
            return Self::Bloqueada;
        }
        match estado.map(str::trim).filter(|e| !e.is_empty()) {
            None => Self::Activa,
            Some(e) if e.eq_ignore_ascii_case("null") => Self::Activa,
            Some(e) => Self::from(e.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Activa => "ACTIVA",
            Self::Bloqueada => "BLOQUEADA",
            Self::Anulada => "ANULADA",
            Self::Other(s) => s,
        }
    }

    /// Whether the prescription can still be dispensed.
    pub fn is_dispensable(&self) -> bool {
        matches!(self, Self::Activa)
    }
}

impl From<PrescriptionStatus> for String {
    fn from(status: PrescriptionStatus) -> Self {
        status.label().to_string()
    }
}

impl From<String> for PrescriptionStatus {
    fn from(s: String) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "ACTIVA" => Self::Activa,
            "BLOQUEADA" => Self::Bloqueada,
            "ANULADA" => Self::Anulada,
            _ => Self::Other(upper),
        }
    }
}

/// A medication line on a prescription, resolved against the vademecum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescribedMedication {
    /// Line ID
    pub idrecetamedic: i64,
    /// Position on the prescription (1-based)
    pub nro_orden: i64,
    /// Vademecum code
    pub codigo: String,
    pub monodroga: Option<String>,
    pub nombre_comercial: Option<String>,
    pub presentacion: Option<String>,
    pub laboratorio: Option<String>,
}

impl PrescribedMedication {
    /// "monodrug - brand (presentation)", or the bare code when the
    /// vademecum has no entry.
    pub fn display_name(&self) -> String {
        match (&self.monodroga, &self.nombre_comercial, &self.presentacion) {
            (Some(mono), Some(brand), Some(pres)) => format!("{} - {} ({})", mono, brand, pres),
            _ => format!("Código: {}", self.codigo),
        }
    }
}

/// A prescription with its physician and medications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub idreceta: i64,
    /// Public identifier of the prescription PDF
    pub num_receta_ofuscada: Option<String>,
    pub fechaemision: Option<String>,
    /// Prescriber licence number
    pub matricprescr: Option<String>,
    /// Prescriber specialty licence number
    pub matricespec_prescr: Option<String>,
    pub idpaciente: i64,
    pub lugaratencion: Option<String>,
    pub diagnostico: Option<String>,
    pub diagnostico2: Option<String>,
    pub estado: Option<String>,
    pub anulacionmotivo: Option<String>,
    pub bloqueo: bool,
    pub medico_nombre: Option<String>,
    pub medico_apellido: Option<String>,
    pub medico_nombre_completo: String,
    pub status: PrescriptionStatus,
    pub medicamentos: Vec<PrescribedMedication>,
}

impl Prescription {
    /// Short description for list views: first medication plus a counter.
    pub fn medication_summary(&self) -> String {
        match self.medicamentos.as_slice() {
            [] => "Sin medicamentos especificados".to_string(),
            [only] => only
                .nombre_comercial
                .clone()
                .unwrap_or_else(|| only.display_name()),
            [first, rest @ ..] => format!(
                "{} y {} más",
                first
                    .nombre_comercial
                    .clone()
                    .unwrap_or_else(|| first.display_name()),
                rest.len()
            ),
        }
    }
}

/// Medication line on a new prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMedication {
    pub codigo: String,
    pub idmedicamento: Option<i64>,
}

/// Prescription creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewPrescription {
    pub idpaciente: Option<i64>,
    pub fechaemision: Option<String>,
    pub matricprescr: Option<String>,
    pub matricespec_prescr: Option<String>,
    pub lugaratencion: Option<String>,
    pub diagnostico: Option<String>,
    pub diagnostico2: Option<String>,
    pub estado: Option<String>,
    #[serde(default)]
    pub medicamentos: Vec<NewMedication>,
}

/// A physician, keyed by licence number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Physician {
    pub matricula: String,
    pub nombre: String,
    pub apellido: String,
}

/// Vademecum entry for a medication code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VademecumEntry {
    pub codigo: String,
    pub monodroga: Option<String>,
    pub nombre_comercial: Option<String>,
    pub presentacion: Option<String>,
    pub laboratorio: Option<String>,
}

/// Physician display name, falling back to the licence number.
pub fn physician_display_name(
    nombre: Option<&str>,
    apellido: Option<&str>,
    matricula: Option<&str>,
) -> String {
    match (nombre, apellido) {
        (Some(n), Some(a)) => format!("{} {}", n, a),
        _ => format!("Matrícula: {}", matricula.unwrap_or_default()),
    }
}

pub(crate) fn has_text(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}
