//! Medical certificate models.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::prescription::{has_text, physician_display_name};
use crate::dates;

/// Kind of certificate, inferred from the diagnosis line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateKind {
    /// Sick leave
    Reposo,
    /// Fitness for an activity
    Aptitud,
    Discapacidad,
    Salud,
    Medico,
}

impl CertificateKind {
    /// Keyword match on the diagnosis, first hit wins. Defaults to sick leave.
    pub fn infer(diagnostico: Option<&str>) -> Self {
        let lower = diagnostico.unwrap_or_default().to_lowercase();
        if lower.contains("aptitud") || lower.contains("apto") {
            Self::Aptitud
        } else if lower.contains("discapacidad") {
            Self::Discapacidad
        } else if lower.contains("salud") {
            Self::Salud
        } else if lower.contains("medico") {
            Self::Medico
        } else {
            Self::Reposo
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Reposo => "REPOSO",
            Self::Aptitud => "APTITUD",
            Self::Discapacidad => "DISCAPACIDAD",
            Self::Salud => "SALUD",
            Self::Medico => "MEDICO",
        }
    }
}

/// Validity of a certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "String", from = "String")]
pub enum CertificateStatus {
    Vigente,
    Vencido,
    Cancelado,
    Other(String),
}

impl CertificateStatus {
    /// Classify from stored columns and the computed end date.
    ///
    /// A stored `VIGENTE` whose end date already passed is reported as
    /// expired.
    pub fn classify(
        estado: Option<&str>,
        anulacionmotivo: Option<&str>,
        fecha_fin: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Self {
        if has_text(anulacionmotivo) {
            return Self::Cancelado;
        }
        let expired = fecha_fin.map(|end| end < now).unwrap_or(false);
        match estado.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) => match Self::from(e.to_string()) {
                Self::Vigente if expired => Self::Vencido,
                other => other,
            },
            None if expired => Self::Vencido,
            None => Self::Vigente,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Vigente => "VIGENTE",
            Self::Vencido => "VENCIDO",
            Self::Cancelado => "CANCELADO",
            Self::Other(s) => s,
        }
    }
}

impl From<CertificateStatus> for String {
    fn from(status: CertificateStatus) -> Self {
        status.label().to_string()
    }
}

impl From<String> for CertificateStatus {
    fn from(s: String) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "VIGENTE" => Self::Vigente,
            "VENCIDO" => Self::Vencido,
            "CANCELADO" => Self::Cancelado,
            _ => Self::Other(upper),
        }
    }
}

/// Stored certificate columns joined with the issuing physician.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CertificateRow {
    pub id: i64,
    pub id_encriptado: Option<String>,
    pub fecha_emision: Option<String>,
    pub matricprescr: Option<String>,
    pub matricespec_prescr: Option<String>,
    pub idpaciente: i64,
    pub lugaratencion: Option<String>,
    pub diagnostico: Option<String>,
    pub diagnostico2: Option<String>,
    pub estado: Option<String>,
    pub anulacionmotivo: Option<String>,
    pub medico_nombre: Option<String>,
    pub medico_apellido: Option<String>,
}

/// Certificate to store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewCertificate {
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

/// A certificate as shown to the patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certificate {
    pub id: i64,
    /// File name of the certificate PDF
    pub id_encriptado: Option<String>,
    pub tipo_certificado: CertificateKind,
    pub fecha_emision: Option<String>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub dias_reposo: Option<u32>,
    pub estado: CertificateStatus,
    pub medico_emisor: String,
    pub medico_nombre: Option<String>,
    pub medico_apellido: Option<String>,
    pub centro_medico: Option<String>,
    pub observaciones: Option<String>,
    pub matricula_prescriptor: Option<String>,
    pub matricula_especialidad: Option<String>,
}

impl Certificate {
    /// Build the patient-facing view of a stored certificate as of `now`.
    pub fn from_row(row: CertificateRow, now: NaiveDateTime) -> Self {
        let kind = CertificateKind::infer(row.diagnostico.as_deref());

        let dias_reposo = match kind {
            CertificateKind::Reposo => row.diagnostico2.as_deref().and_then(rest_days),
            _ => None,
        };
        let fin = dias_reposo.and_then(|days| {
            let start = dates::parse_timestamp(row.fecha_emision.as_deref()?)?;
            start.checked_add_signed(Duration::days(i64::from(days)))
        });

        let estado = CertificateStatus::classify(
            row.estado.as_deref(),
            row.anulacionmotivo.as_deref(),
            fin,
            now,
        );
        let medico_emisor = physician_display_name(
            row.medico_nombre.as_deref(),
            row.medico_apellido.as_deref(),
            row.matricprescr.as_deref(),
        );

        Self {
            id: row.id,
            id_encriptado: row.id_encriptado,
            tipo_certificado: kind,
            fecha_inicio: row.fecha_emision.clone(),
            fecha_emision: row.fecha_emision,
            // Only set when the rest period could be computed
            fecha_fin: fin.map(|f| f.format("%Y-%m-%dT%H:%M:%S").to_string()),
            dias_reposo: if fin.is_some() { dias_reposo } else { None },
            estado,
            medico_emisor,
            medico_nombre: row.medico_nombre,
            medico_apellido: row.medico_apellido,
            centro_medico: row.lugaratencion.filter(|l| !l.trim().is_empty()),
            observaciones: row.diagnostico2.filter(|o| !o.trim().is_empty()),
            matricula_prescriptor: row.matricprescr,
            matricula_especialidad: row.matricespec_prescr,
        }
    }

    /// Whole days left on a valid certificate with an end date.
    pub fn days_remaining(&self, now: NaiveDateTime) -> Option<i64> {
        if self.estado != CertificateStatus::Vigente {
            return None;
        }
        let end = dates::parse_timestamp(self.fecha_fin.as_deref()?)?;
        let seconds = (end - now).num_seconds();
        if seconds <= 0 {
            return Some(0);
        }
        Some((seconds + 86_399) / 86_400)
    }
}

/// Number of rest days written in free text ("reposo 5 días").
pub fn rest_days(text: &str) -> Option<u32> {
    static REST_DAYS: OnceLock<Regex> = OnceLock::new();
    let re = REST_DAYS.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*d[íi]as?").expect("rest-days pattern is valid")
    });
    re.captures(text)?.get(1)?.as_str().parse().ok()
}
