//! Medical certificate queries.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Certificate, CertificateRow, NewCertificate, PatientSummary};

const CERTIFICATE_QUERY: &str = r#"
    SELECT c.idcertificado, c.id_encriptado, c.fechaemision, c.matricprescr,
           c.matricespec_prescr, c.idpaciente, c.lugaratencion, c.diagnostico,
           c.diagnostico2, c.estado, c.anulacionmotivo, m.nombre, m.apellido
    FROM certificados c
    LEFT JOIN medicos m ON c.matricprescr = m.matricula
"#;

fn row_to_certificate_row(row: &Row<'_>) -> rusqlite::Result<CertificateRow> {
    Ok(CertificateRow {
        id: row.get(0)?,
        id_encriptado: row.get(1)?,
        fecha_emision: row.get(2)?,
        matricprescr: row.get(3)?,
        matricespec_prescr: row.get(4)?,
        idpaciente: row.get(5)?,
        lugaratencion: row.get(6)?,
        diagnostico: row.get(7)?,
        diagnostico2: row.get(8)?,
        estado: row.get(9)?,
        anulacionmotivo: row.get(10)?,
        medico_nombre: row.get(11)?,
        medico_apellido: row.get(12)?,
    })
}

impl Database {
    /// Store a certificate.
    pub fn insert_certificate(&self, certificate: &NewCertificate) -> DbResult<i64> {
        if self.get_patient(certificate.idpaciente)?.is_none() {
            return Err(DbError::NotFound(format!(
                "patient {}",
                certificate.idpaciente
            )));
        }
        self.conn.execute(
            r#"
            INSERT INTO certificados (
                id_encriptado, fechaemision, matricprescr, matricespec_prescr, idpaciente,
                lugaratencion, diagnostico, diagnostico2, estado, anulacionmotivo
            ) VALUES (?1, COALESCE(?2, datetime('now')), ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                certificate.id_encriptado,
                certificate.fechaemision,
                certificate.matricprescr,
                certificate.matricespec_prescr,
                certificate.idpaciente,
                certificate.lugaratencion,
                certificate.diagnostico,
                certificate.diagnostico2,
                certificate.estado,
                certificate.anulacionmotivo,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Certificates of a patient as of `now`, newest first.
    pub fn certificates_for_patient(
        &self,
        idpaciente: i64,
        now: NaiveDateTime,
    ) -> DbResult<Vec<Certificate>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE c.idpaciente = ? ORDER BY c.fechaemision DESC, c.idcertificado DESC",
            CERTIFICATE_QUERY
        ))?;

        let rows = stmt
            .query_map([idpaciente], row_to_certificate_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .map(|row| Certificate::from_row(row, now))
            .collect())
    }

    /// Look up a certificate by its file identifier, with its patient.
    pub fn certificate_by_encrypted_id(
        &self,
        encrypted_id: &str,
        now: NaiveDateTime,
    ) -> DbResult<Option<(PatientSummary, Certificate)>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE c.id_encriptado = ?", CERTIFICATE_QUERY),
                [encrypted_id],
                row_to_certificate_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        let patient = self
            .get_patient(row.idpaciente)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", row.idpaciente)))?;

        Ok(Some((patient.summary(), Certificate::from_row(row, now))))
    }
}
