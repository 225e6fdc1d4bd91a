//! Lab/imaging study models.

use serde::{Deserialize, Serialize};

use super::prescription::has_text;

/// Status of a requested study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "String", from = "String")]
pub enum StudyStatus {
    Completado,
    EnProceso,
    Pendiente,
    Cancelado,
    /// Voided, with a recorded reason
    Anulado,
    Other(String),
}

impl StudyStatus {
    /// Void reason first, then the stored state; no state means completed.
    pub fn classify(estado: Option<&str>, anulacionmotivo: Option<&str>) -> Self {
        if has_text(anulacionmotivo) {
            return Self::Anulado;
        }
        match estado.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) => Self::from(e.to_string()),
            None => Self::Completado,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Completado => "COMPLETADO",
            Self::EnProceso => "EN_PROCESO",
            Self::Pendiente => "PENDIENTE",
            Self::Cancelado => "CANCELADO",
            Self::Anulado => "ANULADO",
            Self::Other(s) => s,
        }
    }
}

impl From<StudyStatus> for String {
    fn from(status: StudyStatus) -> Self {
        status.label().to_string()
    }
}

impl From<String> for StudyStatus {
    fn from(s: String) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "COMPLETADO" => Self::Completado,
            "EN_PROCESO" => Self::EnProceso,
            "PENDIENTE" => Self::Pendiente,
            "CANCELADO" => Self::Cancelado,
            "ANULADO" => Self::Anulado,
            _ => Self::Other(upper),
        }
    }
}

/// A study order for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Study {
    pub id: i64,
    /// File name of the result PDF
    pub id_encriptado: Option<String>,
    /// Study type (the order's diagnosis line)
    pub tipo_estudio: String,
    pub fecha_solicitud: Option<String>,
    pub estado: StudyStatus,
    pub medico_solicitante: String,
    pub medico_nombre: Option<String>,
    pub medico_apellido: Option<String>,
    pub centro_medico: Option<String>,
    pub observaciones: Option<String>,
    pub matricula_prescriptor: Option<String>,
    pub matricula_especialidad: Option<String>,
}

impl Study {
    /// Default label for orders without a diagnosis line.
    pub const DEFAULT_TYPE: &'static str = "Estudio Médico";

    /// A completed study with a result file can be downloaded.
    pub fn has_result_available(&self) -> bool {
        self.estado == StudyStatus::Completado && has_text(self.id_encriptado.as_deref())
    }
}

/// Study order to store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewStudy {
    pub idpaciente: i64,
    pub id_encriptado: Option<String>,
    pub fechaemision: Option<String>,
    pub matricprescr: Option<String>,
    pub matricespec_prescr: Option<String>,
    pub lugaratencion: Option<String>,
    pub diagnostico: Option<String>,
    pub diagnostico2: Option<String>,
    pub estado: Option<String>,
    pub anulacionmotivo: Option<String>,
}
