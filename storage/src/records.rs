// storage/src/records.rs
//! Clinical records: at most one per appointment, authored by the doctor
//! who serviced it. Creating a record also forces the appointment into
//! "completed" — the two writes share one transaction.

use rusqlite::{OptionalExtension, Row, params};

use models::{MedicalRecord, MedicalRecordView};

use crate::{Database, StorageError, StorageResult, opt_date_col, timestamp_col};

const RECORD_COLUMNS: &str = "r.id, r.appointment_id, r.doctor_id, r.diagnosis, r.symptoms, \
     r.treatment, r.prescription, r.notes, r.created_at";

const VIEW_SELECT: &str = "SELECT r.id, r.appointment_id, r.doctor_id, r.diagnosis, r.symptoms, \
         r.treatment, r.prescription, r.notes, r.created_at, \
         a.appointment_date, a.pet_id, p.name, p.species, a.owner_id, o.name, d.name \
     FROM medical_records r \
     LEFT JOIN appointments a ON a.id = r.appointment_id \
     LEFT JOIN pets p ON p.id = a.pet_id \
     LEFT JOIN owners o ON o.id = a.owner_id \
     LEFT JOIN staff_users d ON d.id = r.doctor_id";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        doctor_id: row.get(2)?,
        diagnosis: row.get(3)?,
        symptoms: row.get(4)?,
        treatment: row.get(5)?,
        prescription: row.get(6)?,
        notes: row.get(7)?,
        created_at: timestamp_col(row, 8)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecordView> {
    Ok(MedicalRecordView {
        record: record_from_row(row)?,
        appointment_date: opt_date_col(row, 9)?,
        pet_id: row.get(10)?,
        pet_name: row.get(11)?,
        species: row.get(12)?,
        owner_id: row.get(13)?,
        owner_name: row.get(14)?,
        doctor_name: row.get(15)?,
    })
}

/// The clinical content of a record; used for both create and full
/// update.
#[derive(Debug, Clone)]
pub struct RecordFields {
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

impl Database {
    /// Writes the record and completes the appointment atomically.
    /// Fails with Conflict if the appointment already has a record.
    pub fn create_medical_record(
        &mut self,
        appointment_id: i64,
        doctor_id: i64,
        fields: &RecordFields,
    ) -> StorageResult<MedicalRecord> {
        let tx = self.conn.transaction()?;

        let appointment_exists: bool = tx
            .query_row(
                "SELECT 1 FROM appointments WHERE id = ?1",
                [appointment_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !appointment_exists {
            return Err(StorageError::NotFound("Appointment not found".into()));
        }

        let already: bool = tx
            .query_row(
                "SELECT 1 FROM medical_records WHERE appointment_id = ?1",
                [appointment_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if already {
            return Err(StorageError::Conflict(
                "Medical record already exists for this appointment".into(),
            ));
        }

        tx.execute(
            "INSERT INTO medical_records
                 (appointment_id, doctor_id, diagnosis, symptoms, treatment, prescription, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                appointment_id,
                doctor_id,
                fields.diagnosis,
                fields.symptoms,
                fields.treatment,
                fields.prescription,
                fields.notes,
            ],
        )?;
        let record_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE appointments SET status = 'completed' WHERE id = ?1",
            [appointment_id],
        )?;

        tx.commit()?;
        self.get_medical_record(record_id)
    }

    pub fn get_medical_record(&self, record_id: i64) -> StorageResult<MedicalRecord> {
        self.conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM medical_records r WHERE r.id = ?1"),
                [record_id],
                record_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Medical record not found".into()))
    }

    /// Full replacement of the clinical fields. Ownership (only the
    /// authoring doctor may edit) is checked by the HTTP layer against
    /// the record returned from `get_medical_record`.
    pub fn update_medical_record(
        &self,
        record_id: i64,
        fields: &RecordFields,
    ) -> StorageResult<MedicalRecordView> {
        let updated = self.conn.execute(
            "UPDATE medical_records
             SET diagnosis = ?1, symptoms = ?2, treatment = ?3, prescription = ?4, notes = ?5
             WHERE id = ?6",
            params![
                fields.diagnosis,
                fields.symptoms,
                fields.treatment,
                fields.prescription,
                fields.notes,
                record_id,
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound("Medical record not found".into()));
        }
        self.get_medical_record_view(record_id)
    }

    pub fn get_medical_record_view(&self, record_id: i64) -> StorageResult<MedicalRecordView> {
        self.conn
            .query_row(
                &format!("{VIEW_SELECT} WHERE r.id = ?1"),
                [record_id],
                view_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Medical record not found".into()))
    }

    /// Records authored by one doctor, newest first.
    pub fn records_by_doctor(&self, doctor_id: i64) -> StorageResult<Vec<MedicalRecordView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VIEW_SELECT} WHERE r.doctor_id = ?1 ORDER BY r.created_at DESC, r.id DESC"
        ))?;
        let rows = stmt.query_map([doctor_id], view_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Full clinical history of one pet, newest first.
    pub fn records_for_pet(&self, pet_id: i64) -> StorageResult<Vec<MedicalRecordView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VIEW_SELECT} WHERE a.pet_id = ?1 ORDER BY r.created_at DESC, r.id DESC"
        ))?;
        let rows = stmt.query_map([pet_id], view_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
