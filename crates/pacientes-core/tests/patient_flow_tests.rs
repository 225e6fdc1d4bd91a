//! End-to-end scan → check → register → rescan flow against SQLite.

use pacientes_core::barcode::parse_barcode;
use pacientes_core::db::{Database, DbError};
use pacientes_core::models::{DniPatch, NewPatient};
use pacientes_core::reconcile::{IdentityField, IdentitySync};
use pacientes_core::{dates, reconcile};

const FIRST_SCAN: &str = "00610299988@JAIME@FEDERICO@M@38437748@C@22/09/1994@28/09/2019@204";
const RENEWED_DNI: &str =
    "00710299988@JAIME@FEDERICO NICOLAS@M@38437748@D@22/09/1994@28/09/2024@204";

fn register_from_scan(db: &Database, payload: &str) -> pacientes_core::PatientRecord {
    let identity = parse_barcode(payload).unwrap();
    let patient = NewPatient {
        fecnac: identity.fecha_nac.as_deref().and_then(dates::to_iso),
        ..NewPatient::new(
            identity.dni.clone(),
            identity.nombre.clone().unwrap_or_default(),
            identity.apellido.clone().unwrap_or_default(),
            identity.genero.clone().unwrap_or_default(),
        )
    };
    db.insert_patient(&patient).unwrap()
}

#[test]
fn test_first_visit_registers() {
    let db = Database::open_in_memory().unwrap();
    let identity = parse_barcode(FIRST_SCAN).unwrap();

    let outcome = IdentitySync::new(&db).check(&identity.dni, Some(&identity)).unwrap();
    assert!(!outcome.exists);

    let created = register_from_scan(&db, FIRST_SCAN);
    assert_eq!(created.fecnac.as_deref(), Some("1994-09-22"));

    let outcome = IdentitySync::new(&db).check(&identity.dni, Some(&identity)).unwrap();
    assert!(outcome.exists);
    assert_eq!(outcome.updated, Some(false));
}

#[test]
fn test_renewed_document_updates_name() {
    let db = Database::open_in_memory().unwrap();
    let created = register_from_scan(&db, FIRST_SCAN);

    let renewed = parse_barcode(RENEWED_DNI).unwrap();
    let preview = reconcile(&created, &renewed);
    assert_eq!(
        preview.changed_fields.into_iter().collect::<Vec<_>>(),
        vec![IdentityField::Nombre]
    );

    let outcome = IdentitySync::new(&db).check("38437748", Some(&renewed)).unwrap();
    assert_eq!(outcome.updated, Some(true));

    let stored = db.get_patient(created.id).unwrap().unwrap();
    assert_eq!(stored.nombre, "FEDERICO NICOLAS");
    assert_eq!(stored.apellido, "JAIME");
}

#[test]
fn test_scan_with_other_sex_is_ignored() {
    let db = Database::open_in_memory().unwrap();
    let created = register_from_scan(&db, FIRST_SCAN);

    let other = parse_barcode("0001@OTRA@PERSONA@F@38437748@A@01/01/2001").unwrap();
    let outcome = IdentitySync::new(&db).check("38437748", Some(&other)).unwrap();

    assert_eq!(outcome.updated, Some(false));
    assert_eq!(db.get_patient(created.id).unwrap().unwrap(), created);
}

#[test]
fn test_fallback_scan_never_updates() {
    let db = Database::open_in_memory().unwrap();
    let created = register_from_scan(&db, FIRST_SCAN);

    let digits_only = parse_barcode("DNI 38437748").unwrap();
    let outcome = IdentitySync::new(&db).check("38437748", Some(&digits_only)).unwrap();

    assert!(outcome.exists);
    assert_eq!(outcome.updated, Some(false));
    assert_eq!(outcome.patient.unwrap(), created);
}

#[test]
fn test_manual_dni_update_keeps_sex_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pacientes.db");

    let id = {
        let db = Database::open(&path).unwrap();
        register_from_scan(&db, FIRST_SCAN).id
    };

    let db = Database::open(&path).unwrap();
    let err = db
        .apply_dni_patch(
            id,
            DniPatch {
                sexo: Some("F".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DbError::IdentityMismatch(_)));

    let updated = db
        .apply_dni_patch(
            id,
            DniPatch {
                fecnac: Some("1994-09-23".into()),
                sexo: Some("M".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.fecnac.as_deref(), Some("1994-09-23"));
}
