//! Identity data read from a DNI barcode.

use serde::{Deserialize, Deserializer, Serialize};

/// Marker the scanner clients send for fields they could not read.
pub const UNAVAILABLE: &str = "No disponible";

/// Identity fields extracted from a scanned DNI.
///
/// Only `dni` is guaranteed. The remaining fields are `None` when the
/// barcode did not carry them (e.g. the digit-run fallback).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScannedIdentity {
    /// DNI number (7-8 digits)
    pub dni: String,
    /// Surname
    #[serde(default, deserialize_with = "available")]
    pub apellido: Option<String>,
    /// Given name(s)
    #[serde(default, deserialize_with = "available")]
    pub nombre: Option<String>,
    /// Sex code as printed on the document ("M" / "F")
    #[serde(default, deserialize_with = "available")]
    pub genero: Option<String>,
    /// Birth date, raw `DD/MM/YYYY`
    #[serde(default, deserialize_with = "available")]
    pub fecha_nac: Option<String>,
}

impl ScannedIdentity {
    /// Identity carrying only a DNI number.
    pub fn dni_only(dni: impl Into<String>) -> Self {
        Self {
            dni: dni.into(),
            ..Default::default()
        }
    }

    /// True when every field besides `dni` was read.
    pub fn is_complete(&self) -> bool {
        self.apellido.is_some()
            && self.nombre.is_some()
            && self.genero.is_some()
            && self.fecha_nac.is_some()
    }
}

/// Trim, and treat `null`, empty strings and the legacy sentinel as missing.
fn available<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != UNAVAILABLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_header() {
        let json = r#"{"dni":"38437748","apellido":"JAIME","nombre":"FEDERICO NICOLAS","genero":"M","fechaNac":"22/09/1994"}"#;
        let identity: ScannedIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.dni, "38437748");
        assert_eq!(identity.genero.as_deref(), Some("M"));
        assert_eq!(identity.fecha_nac.as_deref(), Some("22/09/1994"));
        assert!(identity.is_complete());
    }

    #[test]
    fn test_sentinel_becomes_none() {
        let json = r#"{"dni":"87654321","apellido":"No disponible","nombre":"No disponible","genero":"No disponible","fechaNac":"No disponible"}"#;
        let identity: ScannedIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity, ScannedIdentity::dni_only("87654321"));
        assert!(!identity.is_complete());
    }

    #[test]
    fn test_header_values_are_trimmed() {
        let json = r#"{"dni":"38437748","apellido":"JAIME ","nombre":" FEDERICO","genero":" M","fechaNac":"22/09/1994\n"}"#;
        let identity: ScannedIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.apellido.as_deref(), Some("JAIME"));
        assert_eq!(identity.nombre.as_deref(), Some("FEDERICO"));
        assert_eq!(identity.genero.as_deref(), Some("M"));
        assert_eq!(identity.fecha_nac.as_deref(), Some("22/09/1994"));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let identity: ScannedIdentity = serde_json::from_str(r#"{"dni":"1234567"}"#).unwrap();
        assert_eq!(identity.nombre, None);
        assert_eq!(identity.fecha_nac, None);
    }
}
