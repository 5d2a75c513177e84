// storage/src/appointments.rs
//! Scheduling ledger. Appointments always start out "scheduled"; the
//! engine applies no state-machine guard on later transitions (see
//! DESIGN.md), it only reports the prior status so callers can react to
//! a cancellation.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};

use models::{Appointment, AppointmentStatus, AppointmentType, AppointmentView};

use crate::{Database, StorageError, StorageResult, date_col, enum_col, time_col, timestamp_col};

const APPOINTMENT_COLUMNS: &str = "a.id, a.owner_id, a.pet_id, a.appointment_date, \
     a.appointment_time, a.type, a.status, a.notes, a.created_at";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        pet_id: row.get(2)?,
        appointment_date: date_col(row, 3)?,
        appointment_time: time_col(row, 4)?,
        kind: enum_col(row, 5)?,
        status: enum_col(row, 6)?,
        notes: row.get(7)?,
        created_at: timestamp_col(row, 8)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentView> {
    Ok(AppointmentView {
        appointment: appointment_from_row(row)?,
        owner_name: row.get(9)?,
        pet_name: row.get(10)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub owner_id: i64,
    pub pet_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: chrono::NaiveTime,
    pub kind: AppointmentType,
    pub notes: Option<String>,
}

/// Website intake form: an unauthenticated appointment request that
/// reuses or creates the owner and pet it names.
#[derive(Debug, Clone)]
pub struct PublicIntake {
    pub owner_name: String,
    pub phone: String,
    pub pet_name: String,
    pub species: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: chrono::NaiveTime,
    pub notes: Option<String>,
}

/// Partial update; only supplied fields change.
#[derive(Debug, Default, Clone)]
pub struct AppointmentPatch {
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<chrono::NaiveTime>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl Database {
    /// Books an appointment. Owner and pet must exist; both walk-in and
    /// scheduled bookings start in the "scheduled" state.
    pub fn create_appointment(&self, new: &NewAppointment) -> StorageResult<Appointment> {
        self.get_owner(new.owner_id)?;
        self.get_pet(new.pet_id)?;

        self.conn.execute(
            "INSERT INTO appointments
                 (owner_id, pet_id, appointment_date, appointment_time, type, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.owner_id,
                new.pet_id,
                new.appointment_date.format("%Y-%m-%d").to_string(),
                new.appointment_time.format("%H:%M:%S").to_string(),
                new.kind.as_str(),
                AppointmentStatus::Scheduled.as_str(),
                new.notes,
            ],
        )?;
        self.get_appointment(self.conn.last_insert_rowid())
    }

    pub fn get_appointment(&self, appointment_id: i64) -> StorageResult<Appointment> {
        self.conn
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1"),
                [appointment_id],
                appointment_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Appointment not found".into()))
    }

    /// Single appointment with owner/pet names joined in.
    pub fn get_appointment_view(&self, appointment_id: i64) -> StorageResult<AppointmentView> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {APPOINTMENT_COLUMNS}, o.name, p.name
                     FROM appointments a
                     LEFT JOIN owners o ON o.id = a.owner_id
                     LEFT JOIN pets p ON p.id = a.pet_id
                     WHERE a.id = ?1"
                ),
                [appointment_id],
                view_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Appointment not found".into()))
    }

    /// All appointments on a calendar day, ordered by time.
    pub fn appointments_on(&self, date: NaiveDate) -> StorageResult<Vec<AppointmentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS}, o.name, p.name
             FROM appointments a
             LEFT JOIN owners o ON o.id = a.owner_id
             LEFT JOIN pets p ON p.id = a.pet_id
             WHERE a.appointment_date = ?1
             ORDER BY a.appointment_time"
        ))?;
        let rows = stmt.query_map([date.format("%Y-%m-%d").to_string()], view_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Applies a partial update and returns the prior status together
    /// with the updated row, so the caller can notice a transition into
    /// "cancelled".
    pub fn update_appointment(
        &self,
        appointment_id: i64,
        patch: &AppointmentPatch,
    ) -> StorageResult<(AppointmentStatus, Appointment)> {
        let before = self.get_appointment(appointment_id)?;

        if let Some(date) = patch.appointment_date {
            self.conn.execute(
                "UPDATE appointments SET appointment_date = ?1 WHERE id = ?2",
                params![date.format("%Y-%m-%d").to_string(), appointment_id],
            )?;
        }
        if let Some(time) = patch.appointment_time {
            self.conn.execute(
                "UPDATE appointments SET appointment_time = ?1 WHERE id = ?2",
                params![time.format("%H:%M:%S").to_string(), appointment_id],
            )?;
        }
        if let Some(status) = patch.status {
            self.conn.execute(
                "UPDATE appointments SET status = ?1 WHERE id = ?2",
                params![status.as_str(), appointment_id],
            )?;
        }
        if let Some(notes) = &patch.notes {
            self.conn.execute(
                "UPDATE appointments SET notes = ?1 WHERE id = ?2",
                params![notes, appointment_id],
            )?;
        }

        Ok((before.status, self.get_appointment(appointment_id)?))
    }

    /// Handles a public appointment request: the owner is matched by
    /// phone (or created), the pet by name under that owner (or
    /// created), and a "scheduled" appointment of type "scheduled" is
    /// booked — one transaction for the whole chain. The front desk
    /// confirms it later.
    pub fn public_appointment_request(&mut self, intake: &PublicIntake) -> StorageResult<Appointment> {
        let tx = self.conn.transaction()?;

        let owner_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM owners WHERE phone = ?1",
                [&intake.phone],
                |row| row.get(0),
            )
            .optional()?;
        let owner_id = match owner_id {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO owners (name, phone) VALUES (?1, ?2)",
                    params![intake.owner_name, intake.phone],
                )?;
                tx.last_insert_rowid()
            }
        };

        let pet_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM pets WHERE owner_id = ?1 AND name = ?2",
                params![owner_id, intake.pet_name],
                |row| row.get(0),
            )
            .optional()?;
        let pet_id = match pet_id {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO pets (owner_id, name, species) VALUES (?1, ?2, ?3)",
                    params![owner_id, intake.pet_name, intake.species],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO appointments
                 (owner_id, pet_id, appointment_date, appointment_time, type, status, notes)
             VALUES (?1, ?2, ?3, ?4, 'scheduled', 'scheduled', ?5)",
            params![
                owner_id,
                pet_id,
                intake.preferred_date.format("%Y-%m-%d").to_string(),
                intake.preferred_time.format("%H:%M:%S").to_string(),
                intake.notes,
            ],
        )?;
        let appointment_id = tx.last_insert_rowid();

        tx.commit()?;
        self.get_appointment(appointment_id)
    }

    /// Doctor action: force the appointment into "completed".
    pub fn complete_appointment(&self, appointment_id: i64) -> StorageResult<Appointment> {
        let updated = self.conn.execute(
            "UPDATE appointments SET status = 'completed' WHERE id = ?1",
            [appointment_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound("Appointment not found".into()));
        }
        self.get_appointment(appointment_id)
    }
}
