//! Identity reconciliation between a scanned DNI and a stored patient.
//!
//! A rescanned document may carry corrected names or birth date. Those are
//! propagated to the stored record only when the document number and the
//! sex code both match, so a mis-scan can never rewrite another person's
//! identity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dates;
use crate::models::{PatientRecord, ScannedIdentity};

/// Identity field that reconciliation may update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityField {
    Nombre,
    Apellido,
    Fecnac,
}

impl IdentityField {
    /// Column name in the patient store.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Nombre => "nombre",
            Self::Apellido => "apellido",
            Self::Fecnac => "fecnac",
        }
    }
}

/// New values for the identity fields that changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IdentityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    /// ISO `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecnac: Option<String>,
}

impl IdentityPatch {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.apellido.is_none() && self.fecnac.is_none()
    }

    /// Fields carried by this patch.
    pub fn fields(&self) -> BTreeSet<IdentityField> {
        let mut fields = BTreeSet::new();
        if self.nombre.is_some() {
            fields.insert(IdentityField::Nombre);
        }
        if self.apellido.is_some() {
            fields.insert(IdentityField::Apellido);
        }
        if self.fecnac.is_some() {
            fields.insert(IdentityField::Fecnac);
        }
        fields
    }

    /// Write the patch values onto `record`.
    pub fn apply_to(&self, record: &mut PatientRecord) {
        if let Some(nombre) = &self.nombre {
            record.nombre = nombre.clone();
        }
        if let Some(apellido) = &self.apellido {
            record.apellido = apellido.clone();
        }
        if let Some(fecnac) = &self.fecnac {
            record.fecnac = Some(fecnac.clone());
        }
    }
}

/// Outcome of comparing a stored record against a scanned identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// True when at least one field changed and the safety gate passed
    pub updated: bool,
    pub changed_fields: BTreeSet<IdentityField>,
    pub patch: IdentityPatch,
    /// The record with the patch applied (unchanged when not updated)
    pub patched_record: PatientRecord,
}

impl Reconciliation {
    fn unchanged(record: &PatientRecord) -> Self {
        Self {
            updated: false,
            changed_fields: BTreeSet::new(),
            patch: IdentityPatch::default(),
            patched_record: record.clone(),
        }
    }
}

/// Decide which identity fields of `record` should take the scanned values.
///
/// Never fails. A scanned field that is unavailable, or a birth date that
/// does not convert, counts as "no change".
pub fn reconcile(record: &PatientRecord, identity: &ScannedIdentity) -> Reconciliation {
    if record.dni != identity.dni {
        debug!(dni = %record.dni, "scanned dni differs from record, skipping reconciliation");
        return Reconciliation::unchanged(record);
    }
    if identity.genero.as_deref() != Some(record.sexo.as_str()) {
        debug!(dni = %record.dni, "scanned sex code differs from record, skipping reconciliation");
        return Reconciliation::unchanged(record);
    }

    let mut patch = IdentityPatch::default();

    if let Some(nombre) = identity.nombre.as_deref() {
        if nombre != record.nombre {
            patch.nombre = Some(nombre.to_string());
        }
    }
    if let Some(apellido) = identity.apellido.as_deref() {
        if apellido != record.apellido {
            patch.apellido = Some(apellido.to_string());
        }
    }
    if let Some(scanned) = identity.fecha_nac.as_deref().and_then(dates::to_iso) {
        let stored = record
            .fecnac
            .as_deref()
            .map(|f| dates::normalize_iso(f).unwrap_or_else(|| f.to_string()));
        if stored.as_deref() != Some(scanned.as_str()) {
            patch.fecnac = Some(scanned);
        }
    }

    if patch.is_empty() {
        return Reconciliation::unchanged(record);
    }

    let mut patched_record = record.clone();
    patch.apply_to(&mut patched_record);

    Reconciliation {
        updated: true,
        changed_fields: patch.fields(),
        patch,
        patched_record,
    }
}

/// Patient lookup and identity writes needed by [`IdentitySync`].
pub trait PatientStore {
    type Error;

    fn find_by_dni(&self, dni: &str) -> Result<Option<PatientRecord>, Self::Error>;

    /// Persist `patch` on patient `id` and return the stored record.
    fn apply_identity_patch(
        &self,
        id: i64,
        patch: &IdentityPatch,
    ) -> Result<PatientRecord, Self::Error>;
}

/// Result of a patient check by DNI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutcome {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<bool>,
}

impl CheckOutcome {
    fn missing() -> Self {
        Self {
            exists: false,
            patient: None,
            updated: None,
        }
    }
}

/// Runs the check-patient flow against a store.
pub struct IdentitySync<'a, S: PatientStore> {
    store: &'a S,
}

impl<'a, S: PatientStore> IdentitySync<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Look up `dni` and, when a scan of the same document is supplied,
    /// reconcile and persist any identity changes.
    pub fn check(
        &self,
        dni: &str,
        scanned: Option<&ScannedIdentity>,
    ) -> Result<CheckOutcome, S::Error> {
        let Some(patient) = self.store.find_by_dni(dni)? else {
            debug!(dni, "patient not found");
            return Ok(CheckOutcome::missing());
        };

        let scanned = match scanned {
            Some(identity) if identity.dni == dni => identity,
            _ => {
                return Ok(CheckOutcome {
                    exists: true,
                    patient: Some(patient),
                    updated: Some(false),
                })
            }
        };

        let outcome = reconcile(&patient, scanned);
        if !outcome.updated {
            return Ok(CheckOutcome {
                exists: true,
                patient: Some(patient),
                updated: Some(false),
            });
        }

        info!(
            patient_id = patient.id,
            fields = ?outcome.changed_fields,
            "updating patient identity from scanned DNI"
        );
        let stored = self.store.apply_identity_patch(patient.id, &outcome.patch)?;

        Ok(CheckOutcome {
            exists: true,
            patient: Some(stored),
            updated: Some(true),
        })
    }
}
