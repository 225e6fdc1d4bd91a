//! Patient database operations.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use super::{Database, DbError, DbResult};
use crate::models::{DniPatch, NewPatient, PatientRecord, ProfilePatch};
use crate::reconcile::{IdentityField, IdentityPatch, PatientStore};

const PATIENT_COLUMNS: &str = r#"
    id, dni, nombre, apellido, sexo, fecnac, email, telefono, calle, numero,
    piso, departamento, cpostal, barrio, ciudad, provincia, peso, talla,
    numeroafiliado, created_at, updated_at
"#;

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        dni: row.get(1)?,
        nombre: row.get(2)?,
        apellido: row.get(3)?,
        sexo: row.get(4)?,
        fecnac: row.get(5)?,
        email: row.get(6)?,
        telefono: row.get(7)?,
        calle: row.get(8)?,
        numero: row.get(9)?,
        piso: row.get(10)?,
        departamento: row.get(11)?,
        cpostal: row.get(12)?,
        barrio: row.get(13)?,
        ciudad: row.get(14)?,
        provincia: row.get(15)?,
        peso: row.get(16)?,
        talla: row.get(17)?,
        numeroafiliado: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

fn text(value: &Option<String>) -> Option<Value> {
    value.as_ref().map(|v| Value::Text(v.clone()))
}

fn real(value: &Option<f64>) -> Option<Value> {
    value.map(Value::Real)
}

impl Database {
    /// Register a new patient.
    ///
    /// Fails with `Validation` when a required field is blank and with
    /// `Constraint` when the DNI is already registered.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<PatientRecord> {
        let missing = patient.missing_fields();
        if !missing.is_empty() {
            return Err(DbError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if self.find_patient_by_dni(&patient.dni)?.is_some() {
            return Err(DbError::Constraint(format!(
                "patient with dni {} already exists",
                patient.dni
            )));
        }

        self.conn.execute(
            r#"
            INSERT INTO pacientes (
                dni, nombre, apellido, sexo, fecnac, email, telefono, calle,
                numero, piso, departamento, cpostal, barrio, ciudad, provincia,
                peso, talla, numeroafiliado
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                patient.dni.trim(),
                patient.nombre.trim(),
                patient.apellido.trim(),
                patient.sexo.trim(),
                patient.fecnac,
                patient.email,
                patient.telefono,
                patient.calle,
                patient.numero,
                patient.piso,
                patient.departamento,
                patient.cpostal,
                patient.barrio,
                patient.ciudad,
                patient.provincia,
                patient.peso,
                patient.talla,
                patient.numeroafiliado,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, "patient inserted");
        self.require_patient(id)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pacientes WHERE id = ?", PATIENT_COLUMNS),
                [id],
                row_to_patient,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by DNI.
    pub fn find_patient_by_dni(&self, dni: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pacientes WHERE dni = ?", PATIENT_COLUMNS),
                [dni.trim()],
                row_to_patient,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Apply a manual profile edit.
    pub fn update_profile(&self, id: i64, patch: &ProfilePatch) -> DbResult<PatientRecord> {
        self.require_patient(id)?;
        if patch.is_empty() {
            return Err(DbError::Validation(
                "no editable fields supplied".to_string(),
            ));
        }

        let changes = [
            ("email", text(&patch.email)),
            ("telefono", text(&patch.telefono)),
            ("calle", text(&patch.calle)),
            ("numero", text(&patch.numero)),
            ("piso", text(&patch.piso)),
            ("departamento", text(&patch.departamento)),
            ("cpostal", text(&patch.cpostal)),
            ("barrio", text(&patch.barrio)),
            ("ciudad", text(&patch.ciudad)),
            ("provincia", text(&patch.provincia)),
            ("peso", real(&patch.peso)),
            ("talla", real(&patch.talla)),
        ];
        self.update_columns(id, changes)
    }

    /// Apply an explicit update of the DNI-printed fields.
    ///
    /// Blank values are ignored. A supplied `sexo` must equal the stored
    /// one; the sex code is never changed through this path.
    pub fn apply_dni_patch(&self, id: i64, patch: DniPatch) -> DbResult<PatientRecord> {
        let existing = self.require_patient(id)?;
        let patch = patch.non_blank();
        if patch.is_empty() {
            return Err(DbError::Validation(
                "no DNI fields supplied".to_string(),
            ));
        }
        if let Some(sexo) = &patch.sexo {
            if *sexo != existing.sexo {
                return Err(DbError::IdentityMismatch(
                    "DNI sex code does not match the patient".to_string(),
                ));
            }
        }

        let changes = [
            ("nombre", text(&patch.nombre)),
            ("apellido", text(&patch.apellido)),
            ("sexo", text(&patch.sexo)),
            ("fecnac", text(&patch.fecnac)),
        ];
        self.update_columns(id, changes)
    }

    /// Persist a reconciliation patch.
    pub fn update_identity(&self, id: i64, patch: &IdentityPatch) -> DbResult<PatientRecord> {
        let changes = [
            (IdentityField::Nombre.column(), text(&patch.nombre)),
            (IdentityField::Apellido.column(), text(&patch.apellido)),
            (IdentityField::Fecnac.column(), text(&patch.fecnac)),
        ];
        self.update_columns(id, changes)
    }

    fn require_patient(&self, id: i64) -> DbResult<PatientRecord> {
        self.get_patient(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", id)))
    }

    /// UPDATE only the columns that carry a value, then reload the row.
    fn update_columns<const N: usize>(
        &self,
        id: i64,
        changes: [(&'static str, Option<Value>); N],
    ) -> DbResult<PatientRecord> {
        let (columns, mut values): (Vec<&str>, Vec<Value>) = changes
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .unzip();

        if !columns.is_empty() {
            let set_clause = columns
                .iter()
                .map(|column| format!("{} = ?", column))
                .collect::<Vec<_>>()
                .join(", ");
            values.push(Value::Integer(id));

            let rows_affected = self.conn.execute(
                &format!(
                    "UPDATE pacientes SET {}, updated_at = datetime('now') WHERE id = ?",
                    set_clause
                ),
                params_from_iter(values),
            )?;
            if rows_affected == 0 {
                return Err(DbError::NotFound(format!("patient {}", id)));
            }
            debug!(id, ?columns, "patient updated");
        }

        self.require_patient(id)
    }
}

impl PatientStore for Database {
    type Error = DbError;

    fn find_by_dni(&self, dni: &str) -> DbResult<Option<PatientRecord>> {
        self.find_patient_by_dni(dni)
    }

    fn apply_identity_patch(&self, id: i64, patch: &IdentityPatch) -> DbResult<PatientRecord> {
        self.update_identity(id, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScannedIdentity;
    use crate::reconcile::IdentitySync;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_patient() -> NewPatient {
        NewPatient {
            fecnac: Some("1994-09-22".into()),
            email: Some("fede@example.com".into()),
            ..NewPatient::new(
                "38437748".into(),
                "FEDERICO".into(),
                "JAIME".into(),
                "M".into(),
            )
        }
    }

    #[test]
    fn test_insert_and_get_patient() {
        let db = setup_db();
        let created = db.insert_patient(&new_patient()).unwrap();

        assert!(created.id > 0);
        assert_eq!(created.email.as_deref(), Some("fede@example.com"));

        let by_id = db.get_patient(created.id).unwrap().unwrap();
        let by_dni = db.find_patient_by_dni("38437748").unwrap().unwrap();
        assert_eq!(by_id, created);
        assert_eq!(by_dni, created);
    }

    #[test]
    fn test_insert_requires_fields() {
        let db = setup_db();
        let mut patient = new_patient();
        patient.sexo = String::new();

        let err = db.insert_patient(&patient).unwrap_err();
        assert!(matches!(err, DbError::Validation(msg) if msg.contains("sexo")));
    }

    #[test]
    fn test_duplicate_dni_is_constraint() {
        let db = setup_db();
        db.insert_patient(&new_patient()).unwrap();

        let err = db.insert_patient(&new_patient()).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn test_missing_patient() {
        let db = setup_db();
        assert!(db.get_patient(42).unwrap().is_none());
        assert!(db.find_patient_by_dni("11111111").unwrap().is_none());
    }

    #[test]
    fn test_update_profile() {
        let db = setup_db();
        let created = db.insert_patient(&new_patient()).unwrap();

        let patch = ProfilePatch {
            telefono: Some("3415551234".into()),
            peso: Some(72.5),
            ..Default::default()
        };
        let updated = db.update_profile(created.id, &patch).unwrap();

        assert_eq!(updated.telefono.as_deref(), Some("3415551234"));
        assert_eq!(updated.peso, Some(72.5));
        // Untouched fields survive
        assert_eq!(updated.email.as_deref(), Some("fede@example.com"));
    }

    #[test]
    fn test_update_profile_errors() {
        let db = setup_db();
        assert!(matches!(
            db.update_profile(99, &ProfilePatch::default()),
            Err(DbError::NotFound(_))
        ));

        let created = db.insert_patient(&new_patient()).unwrap();
        assert!(matches!(
            db.update_profile(created.id, &ProfilePatch::default()),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_dni_patch() {
        let db = setup_db();
        let created = db.insert_patient(&new_patient()).unwrap();

        let patch = DniPatch {
            nombre: Some("FEDERICO NICOLAS".into()),
            apellido: Some("".into()),
            sexo: Some("M".into()),
            fecnac: None,
        };
        let updated = db.apply_dni_patch(created.id, patch).unwrap();
        assert_eq!(updated.nombre, "FEDERICO NICOLAS");
        assert_eq!(updated.apellido, "JAIME");
    }

    #[test]
    fn test_dni_patch_rejects_sex_mismatch() {
        let db = setup_db();
        let created = db.insert_patient(&new_patient()).unwrap();

        let patch = DniPatch {
            nombre: Some("OTRA".into()),
            sexo: Some("F".into()),
            ..Default::default()
        };
        assert!(matches!(
            db.apply_dni_patch(created.id, patch),
            Err(DbError::IdentityMismatch(_))
        ));
        assert_eq!(db.get_patient(created.id).unwrap().unwrap().nombre, "FEDERICO");
    }

    #[test]
    fn test_dni_patch_requires_fields() {
        let db = setup_db();
        let created = db.insert_patient(&new_patient()).unwrap();
        let patch = DniPatch {
            nombre: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            db.apply_dni_patch(created.id, patch),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_identity_sync_against_database() {
        let db = setup_db();
        db.insert_patient(&new_patient()).unwrap();

        let scanned = ScannedIdentity {
            dni: "38437748".into(),
            apellido: Some("JAIME".into()),
            nombre: Some("FEDERICO NICOLAS".into()),
            genero: Some("M".into()),
            fecha_nac: Some("22/09/1994".into()),
        };
        let outcome = IdentitySync::new(&db)
            .check("38437748", Some(&scanned))
            .unwrap();

        assert!(outcome.exists);
        assert_eq!(outcome.updated, Some(true));
        let stored = db.find_patient_by_dni("38437748").unwrap().unwrap();
        assert_eq!(stored.nombre, "FEDERICO NICOLAS");
        assert_eq!(outcome.patient, Some(stored));

        // Second scan finds nothing to change
        let again = IdentitySync::new(&db)
            .check("38437748", Some(&scanned))
            .unwrap();
        assert_eq!(again.updated, Some(false));
    }
}
