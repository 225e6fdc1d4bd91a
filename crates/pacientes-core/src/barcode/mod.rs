//! PDF417 payload parser for Argentine DNI barcodes.
//!
//! Layout of the decoded payload, `@`-separated:
//!
//! ```text
//! tramite@APELLIDO@NOMBRE@SEXO@DNI@EJEMPLAR@NACIMIENTO@EMISION@...
//! 00610299988@JAIME@FEDERICO NICOLAS@M@38437748@C@22/09/1994@28/09/2019@204
//! ```
//!
//! Payloads without any `@` fall back to a search for a standalone 7-8
//! digit run, which yields a DNI-only identity.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::ScannedIdentity;

/// Minimum number of `@` segments to reach the DNI field.
pub const MIN_SEGMENTS: usize = 5;

const DNI_SEGMENT: usize = 4;
const APELLIDO_SEGMENT: usize = 1;
const NOMBRE_SEGMENT: usize = 2;
const GENERO_SEGMENT: usize = 3;
const BIRTH_DATE_SEGMENT: usize = 6;

/// Barcode parse errors. All are terminal for the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    #[error("DNI field has invalid format: {0:?}")]
    InvalidDniFormat(String),

    #[error("Payload has {found} fields, expected at least 5")]
    InsufficientFields { found: usize },

    #[error("Payload is not a DNI barcode and contains no DNI number")]
    UnrecognizedFormat,
}

impl BarcodeError {
    /// Message shown to the person scanning, asking for another attempt.
    pub fn retry_hint(&self) -> String {
        match self {
            Self::InvalidDniFormat(dni) => format!(
                "El DNI encontrado ({}) no tiene el formato correcto. Debe tener entre 7 y 8 dígitos.",
                dni
            ),
            Self::InsufficientFields { .. } => {
                "El código escaneado no contiene suficientes datos en el formato esperado.".to_string()
            }
            Self::UnrecognizedFormat => {
                "El código escaneado no tiene el formato esperado y no se pudo encontrar un DNI."
                    .to_string()
            }
        }
    }
}

pub type BarcodeResult<T> = Result<T, BarcodeError>;

/// Parse a decoded barcode payload into a scanned identity.
pub fn parse_barcode(raw: &str) -> BarcodeResult<ScannedIdentity> {
    if raw.contains('@') {
        parse_structured(raw)
    } else {
        parse_fallback(raw)
    }
}

/// Validate a hand-typed DNI number (7-8 ASCII digits).
pub fn is_valid_dni(dni: &str) -> bool {
    (7..=8).contains(&dni.len()) && dni.bytes().all(|b| b.is_ascii_digit())
}

fn parse_structured(raw: &str) -> BarcodeResult<ScannedIdentity> {
    let segments: Vec<&str> = raw.split('@').collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(BarcodeError::InsufficientFields {
            found: segments.len(),
        });
    }

    let dni = segments[DNI_SEGMENT];
    if !is_valid_dni(dni) {
        return Err(BarcodeError::InvalidDniFormat(dni.to_string()));
    }

    let field = |index: usize| {
        segments
            .get(index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Ok(ScannedIdentity {
        dni: dni.to_string(),
        apellido: field(APELLIDO_SEGMENT),
        nombre: field(NOMBRE_SEGMENT),
        genero: field(GENERO_SEGMENT),
        fecha_nac: field(BIRTH_DATE_SEGMENT),
    })
}

fn parse_fallback(raw: &str) -> BarcodeResult<ScannedIdentity> {
    static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();
    // ASCII word boundaries: a run glued to a non-ASCII letter ("Nº12345678")
    // still counts as standalone.
    let re = DIGIT_RUN.get_or_init(|| {
        Regex::new(r"(?-u:\b)[0-9]{7,8}(?-u:\b)").expect("digit-run pattern is valid")
    });

    re.find(raw)
        .map(|m| ScannedIdentity::dni_only(m.as_str()))
        .ok_or(BarcodeError::UnrecognizedFormat)
}
