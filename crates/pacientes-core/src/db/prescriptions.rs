//! Prescription queries and reference data (physicians, vademecum).

use rusqlite::{params, OptionalExtension, Row, ToSql};
use tracing::debug;
use uuid::Uuid;

use super::{Database, DbError, DbResult};
use crate::models::{
    physician_display_name, NewPrescription, PrescribedMedication, Prescription,
    PrescriptionStatus, Physician, VademecumEntry,
};

/// Prescription header joined with physician and medication lines.
/// One row per medication line, or one row with NULL line columns.
const PRESCRIPTION_QUERY: &str = r#"
    SELECT r.idreceta, r.num_receta_ofuscada, r.fechaemision, r.matricprescr,
           r.matricespec_prescr, r.idpaciente, r.lugaratencion, r.diagnostico,
           r.diagnostico2, r.estado, r.anulacionmotivo, r.bloqueo,
           m.nombre, m.apellido,
           rm.idrecetamedic, rm.nro_orden, rm.codigo,
           v.monodroga, v.nombre_comercial, v.presentacion, v.laboratorio
    FROM recetas r
    LEFT JOIN medicos m ON r.matricprescr = m.matricula
    LEFT JOIN receta_medicamentos rm ON r.idreceta = rm.idreceta
    LEFT JOIN vademecum v ON rm.codigo = v.codigo
"#;

fn row_to_header(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    let matricprescr: Option<String> = row.get(3)?;
    let estado: Option<String> = row.get(9)?;
    let anulacionmotivo: Option<String> = row.get(10)?;
    let bloqueo: bool = row.get(11)?;
    let medico_nombre: Option<String> = row.get(12)?;
    let medico_apellido: Option<String> = row.get(13)?;

    Ok(Prescription {
        idreceta: row.get(0)?,
        num_receta_ofuscada: row.get(1)?,
        fechaemision: row.get(2)?,
        medico_nombre_completo: physician_display_name(
            medico_nombre.as_deref(),
            medico_apellido.as_deref(),
            matricprescr.as_deref(),
        ),
        status: PrescriptionStatus::classify(
            estado.as_deref(),
            anulacionmotivo.as_deref(),
            bloqueo,
        ),
        matricprescr,
        matricespec_prescr: row.get(4)?,
        idpaciente: row.get(5)?,
        lugaratencion: row.get(6)?,
        diagnostico: row.get(7)?,
        diagnostico2: row.get(8)?,
        estado,
        anulacionmotivo,
        bloqueo,
        medico_nombre,
        medico_apellido,
        medicamentos: Vec::new(),
    })
}

fn row_to_medication(row: &Row<'_>) -> rusqlite::Result<Option<PrescribedMedication>> {
    let Some(idrecetamedic) = row.get::<_, Option<i64>>(14)? else {
        return Ok(None);
    };
    Ok(Some(PrescribedMedication {
        idrecetamedic,
        nro_orden: row.get(15)?,
        codigo: row.get(16)?,
        monodroga: row.get(17)?,
        nombre_comercial: row.get(18)?,
        presentacion: row.get(19)?,
        laboratorio: row.get(20)?,
    }))
}

/// Fold joined rows into prescriptions, keeping row order.
fn group_rows(rows: Vec<(Prescription, Option<PrescribedMedication>)>) -> Vec<Prescription> {
    let mut grouped: Vec<Prescription> = Vec::new();
    for (header, medication) in rows {
        let same = grouped
            .last()
            .map(|p| p.idreceta == header.idreceta)
            .unwrap_or(false);
        if !same {
            grouped.push(header);
        }
        if let (Some(medication), Some(current)) = (medication, grouped.last_mut()) {
            current.medicamentos.push(medication);
        }
    }
    grouped
}

impl Database {
    /// Insert or replace a physician.
    pub fn upsert_physician(&self, physician: &Physician) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicos (matricula, nombre, apellido) VALUES (?1, ?2, ?3)
            ON CONFLICT(matricula) DO UPDATE SET
                nombre = excluded.nombre,
                apellido = excluded.apellido
            "#,
            params![physician.matricula, physician.nombre, physician.apellido],
        )?;
        Ok(())
    }

    /// Insert or replace a vademecum entry.
    pub fn upsert_vademecum_entry(&self, entry: &VademecumEntry) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vademecum (codigo, monodroga, nombre_comercial, presentacion, laboratorio)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(codigo) DO UPDATE SET
                monodroga = excluded.monodroga,
                nombre_comercial = excluded.nombre_comercial,
                presentacion = excluded.presentacion,
                laboratorio = excluded.laboratorio
            "#,
            params![
                entry.codigo,
                entry.monodroga,
                entry.nombre_comercial,
                entry.presentacion,
                entry.laboratorio,
            ],
        )?;
        Ok(())
    }

    /// Prescriptions of a patient, newest first, medications in order.
    pub fn prescriptions_for_patient(&self, idpaciente: i64) -> DbResult<Vec<Prescription>> {
        self.query_prescriptions(
            "WHERE r.idpaciente = ?1 ORDER BY r.idreceta DESC, rm.nro_orden ASC",
            &[&idpaciente],
        )
    }

    /// Get a single prescription with its medications.
    pub fn get_prescription(&self, idreceta: i64) -> DbResult<Option<Prescription>> {
        let mut found = self.query_prescriptions(
            "WHERE r.idreceta = ?1 ORDER BY rm.nro_orden ASC",
            &[&idreceta],
        )?;
        Ok(found.pop())
    }

    /// Get a prescription by its public (obfuscated) number.
    pub fn get_prescription_by_number(&self, number: &str) -> DbResult<Option<Prescription>> {
        let idreceta: Option<i64> = self
            .conn
            .query_row(
                "SELECT idreceta FROM recetas WHERE num_receta_ofuscada = ?",
                [number],
                |row| row.get(0),
            )
            .optional()?;
        match idreceta {
            Some(id) => self.get_prescription(id),
            None => Ok(None),
        }
    }

    /// Create a prescription with its medication lines.
    pub fn create_prescription(&mut self, new: &NewPrescription) -> DbResult<Prescription> {
        let idpaciente = new
            .idpaciente
            .ok_or_else(|| DbError::Validation("missing required fields: idpaciente".to_string()))?;
        if self.get_patient(idpaciente)?.is_none() {
            return Err(DbError::NotFound(format!("patient {}", idpaciente)));
        }

        let number = Uuid::new_v4().simple().to_string();
        let tx = self.transaction()?;
        tx.execute(
            r#"
            INSERT INTO recetas (
                num_receta_ofuscada, fechaemision, matricprescr, matricespec_prescr,
                idpaciente, lugaratencion, diagnostico, diagnostico2, estado
            ) VALUES (?1, COALESCE(?2, datetime('now')), ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                number,
                new.fechaemision,
                new.matricprescr,
                new.matricespec_prescr,
                idpaciente,
                new.lugaratencion,
                new.diagnostico,
                new.diagnostico2,
                new.estado,
            ],
        )?;
        let idreceta = tx.last_insert_rowid();

        for (index, medication) in new.medicamentos.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO receta_medicamentos (idreceta, nro_orden, idmedicamento, codigo)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![idreceta, index as i64 + 1, medication.idmedicamento, medication.codigo],
            )?;
        }
        tx.commit()?;

        debug!(idreceta, idpaciente, lines = new.medicamentos.len(), "prescription created");
        self.get_prescription(idreceta)?
            .ok_or_else(|| DbError::NotFound(format!("prescription {}", idreceta)))
    }

    fn query_prescriptions(
        &self,
        filter: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} {}", PRESCRIPTION_QUERY, filter))?;
        let rows = stmt
            .query_map(params, |row| Ok((row_to_header(row)?, row_to_medication(row)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(group_rows(rows))
    }
}
