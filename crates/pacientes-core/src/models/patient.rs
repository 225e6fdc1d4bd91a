//! Patient models.

use serde::{Deserialize, Serialize};

/// A persisted patient record.
///
/// `dni` and `sexo` are identity anchors: automatic updates from a
/// rescanned DNI are only applied when both match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Store-assigned numeric ID
    pub id: i64,
    /// National identity number (unique)
    pub dni: String,
    /// Given name(s)
    pub nombre: String,
    /// Surname
    pub apellido: String,
    /// Sex code ("M" / "F")
    pub sexo: String,
    /// Birth date (YYYY-MM-DD)
    pub fecnac: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub calle: Option<String>,
    pub numero: Option<String>,
    pub piso: Option<String>,
    pub departamento: Option<String>,
    pub cpostal: Option<String>,
    pub barrio: Option<String>,
    pub ciudad: Option<String>,
    pub provincia: Option<String>,
    /// Weight in kg
    pub peso: Option<f64>,
    /// Height in cm
    pub talla: Option<f64>,
    /// Health insurance member number
    pub numeroafiliado: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl PatientRecord {
    /// Short summary shipped alongside prescription/study/certificate listings.
    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            id: self.id,
            dni: self.dni.clone(),
            nombre: self.nombre.clone(),
            apellido: self.apellido.clone(),
            sexo: self.sexo.clone(),
            fecnac: self.fecnac.clone(),
        }
    }
}

/// Identity-only projection of a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: i64,
    pub dni: String,
    pub nombre: String,
    pub apellido: String,
    pub sexo: String,
    pub fecnac: Option<String>,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewPatient {
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub sexo: String,
    pub fecnac: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub calle: Option<String>,
    pub numero: Option<String>,
    pub piso: Option<String>,
    pub departamento: Option<String>,
    pub cpostal: Option<String>,
    pub barrio: Option<String>,
    pub ciudad: Option<String>,
    pub provincia: Option<String>,
    pub peso: Option<f64>,
    pub talla: Option<f64>,
    pub numeroafiliado: Option<String>,
}

impl NewPatient {
    /// Create a registration with the required fields.
    pub fn new(dni: String, nombre: String, apellido: String, sexo: String) -> Self {
        Self {
            dni,
            nombre,
            apellido,
            sexo,
            ..Default::default()
        }
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("dni", &self.dni),
            ("nombre", &self.nombre),
            ("apellido", &self.apellido),
            ("sexo", &self.sexo),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Manual profile edit. Identity fields are not editable here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub calle: Option<String>,
    pub numero: Option<String>,
    pub piso: Option<String>,
    pub departamento: Option<String>,
    pub cpostal: Option<String>,
    pub barrio: Option<String>,
    pub ciudad: Option<String>,
    pub provincia: Option<String>,
    pub peso: Option<f64>,
    pub talla: Option<f64>,
}

impl ProfilePatch {
    /// True when no editable field was supplied.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.telefono.is_none()
            && self.calle.is_none()
            && self.numero.is_none()
            && self.piso.is_none()
            && self.departamento.is_none()
            && self.cpostal.is_none()
            && self.barrio.is_none()
            && self.ciudad.is_none()
            && self.provincia.is_none()
            && self.peso.is_none()
            && self.talla.is_none()
    }
}

/// Explicit update of the fields printed on the DNI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DniPatch {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub sexo: Option<String>,
    pub fecnac: Option<String>,
}

impl DniPatch {
    /// Drop blank values so they never overwrite stored data.
    pub fn non_blank(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        Self {
            nombre: keep(self.nombre),
            apellido: keep(self.apellido),
            sexo: keep(self.sexo),
            fecnac: keep(self.fecnac),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.apellido.is_none()
            && self.sexo.is_none()
            && self.fecnac.is_none()
    }
}
