//! Study order queries.

use rusqlite::{params, Row};

use super::{Database, DbError, DbResult};
use crate::models::{physician_display_name, NewStudy, Study, StudyStatus};

fn row_to_study(row: &Row<'_>) -> rusqlite::Result<Study> {
    let matricprescr: Option<String> = row.get(3)?;
    let lugaratencion: Option<String> = row.get(5)?;
    let diagnostico: Option<String> = row.get(6)?;
    let diagnostico2: Option<String> = row.get(7)?;
    let estado: Option<String> = row.get(8)?;
    let anulacionmotivo: Option<String> = row.get(9)?;
    let medico_nombre: Option<String> = row.get(10)?;
    let medico_apellido: Option<String> = row.get(11)?;

    Ok(Study {
        id: row.get(0)?,
        id_encriptado: row.get(1)?,
        tipo_estudio: diagnostico
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| Study::DEFAULT_TYPE.to_string()),
        fecha_solicitud: row.get(2)?,
        estado: StudyStatus::classify(estado.as_deref(), anulacionmotivo.as_deref()),
        medico_solicitante: physician_display_name(
            medico_nombre.as_deref(),
            medico_apellido.as_deref(),
            matricprescr.as_deref(),
        ),
        medico_nombre,
        medico_apellido,
        centro_medico: lugaratencion
            .filter(|l| !l.trim().is_empty())
            .map(|l| format!("Centro {}", l)),
        observaciones: diagnostico2.filter(|o| !o.trim().is_empty()),
        matricula_prescriptor: matricprescr,
        matricula_especialidad: row.get(4)?,
    })
}

impl Database {
    /// Store a study order.
    pub fn insert_study(&self, study: &NewStudy) -> DbResult<i64> {
        if self.get_patient(study.idpaciente)?.is_none() {
            return Err(DbError::NotFound(format!("patient {}", study.idpaciente)));
        }
        self.conn.execute(
            r#"
            INSERT INTO estudios (
                id_encriptado, fechaemision, matricprescr, matricespec_prescr, idpaciente,
                lugaratencion, diagnostico, diagnostico2, estado, anulacionmotivo
            ) VALUES (?1, COALESCE(?2, datetime('now')), ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                study.id_encriptado,
                study.fechaemision,
                study.matricprescr,
                study.matricespec_prescr,
                study.idpaciente,
                study.lugaratencion,
                study.diagnostico,
                study.diagnostico2,
                study.estado,
                study.anulacionmotivo,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Study orders of a patient, newest first.
    pub fn studies_for_patient(&self, idpaciente: i64) -> DbResult<Vec<Study>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.idestudio, e.id_encriptado, e.fechaemision, e.matricprescr,
                   e.matricespec_prescr, e.lugaratencion, e.diagnostico, e.diagnostico2,
                   e.estado, e.anulacionmotivo, m.nombre, m.apellido
            FROM estudios e
            LEFT JOIN medicos m ON e.matricprescr = m.matricula
            WHERE e.idpaciente = ?
            ORDER BY e.fechaemision DESC, e.idestudio DESC
            "#,
        )?;

        let studies = stmt
            .query_map([idpaciente], row_to_study)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(studies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPatient, Physician};

    fn setup_db() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let patient = db
            .insert_patient(&NewPatient::new(
                "30111222".into(),
                "ANA".into(),
                "LOPEZ".into(),
                "F".into(),
            ))
            .unwrap();
        (db, patient.id)
    }

    #[test]
    fn test_study_mapping() {
        let (db, patient_id) = setup_db();
        db.upsert_physician(&Physician {
            matricula: "MP1".into(),
            nombre: "Laura".into(),
            apellido: "Sosa".into(),
        })
        .unwrap();
        db.insert_study(&NewStudy {
            idpaciente: patient_id,
            id_encriptado: Some("e3f1.pdf".into()),
            fechaemision: Some("2025-01-10 10:00:00".into()),
            matricprescr: Some("MP1".into()),
            lugaratencion: Some("12".into()),
            diagnostico: Some("Hemograma completo".into()),
            diagnostico2: Some("En ayunas".into()),
            ..Default::default()
        })
        .unwrap();

        let studies = db.studies_for_patient(patient_id).unwrap();
        assert_eq!(studies.len(), 1);
        let study = &studies[0];
        assert_eq!(study.tipo_estudio, "Hemograma completo");
        assert_eq!(study.estado, StudyStatus::Completado);
        assert_eq!(study.medico_solicitante, "Laura Sosa");
        assert_eq!(study.centro_medico.as_deref(), Some("Centro 12"));
        assert_eq!(study.observaciones.as_deref(), Some("En ayunas"));
        assert!(study.has_result_available());
    }

    #[test]
    fn test_defaults_and_order() {
        let (db, patient_id) = setup_db();
        db.insert_study(&NewStudy {
            idpaciente: patient_id,
            fechaemision: Some("2024-05-01 08:00:00".into()),
            matricprescr: Some("MP9".into()),
            estado: Some("pendiente".into()),
            ..Default::default()
        })
        .unwrap();
        db.insert_study(&NewStudy {
            idpaciente: patient_id,
            fechaemision: Some("2025-02-01 08:00:00".into()),
            anulacionmotivo: Some("duplicado".into()),
            ..Default::default()
        })
        .unwrap();

        let studies = db.studies_for_patient(patient_id).unwrap();
        assert_eq!(studies[0].estado, StudyStatus::Anulado);
        assert_eq!(studies[1].tipo_estudio, Study::DEFAULT_TYPE);
        assert_eq!(studies[1].estado, StudyStatus::Pendiente);
        assert_eq!(studies[1].medico_solicitante, "Matrícula: MP9");
        assert_eq!(studies[1].centro_medico, None);
    }

    #[test]
    fn test_insert_for_unknown_patient() {
        let (db, _) = setup_db();
        let result = db.insert_study(&NewStudy {
            idpaciente: 999,
            ..Default::default()
        });
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }
}
