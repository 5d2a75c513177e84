// storage/src/staff.rs
//! Staff accounts: creation, lookup, status and profile updates.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};

use models::{Role, StaffUser};

use crate::{Database, StorageError, StorageResult, enum_col, timestamp_col};

const STAFF_COLUMNS: &str =
    "id, name, username, email, role, password_hash, is_active, created_at";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<StaffUser> {
    Ok(StaffUser {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        role: enum_col(row, 4)?,
        password_hash: row.get(5)?,
        is_active: row.get(6)?,
        created_at: timestamp_col(row, 7)?,
    })
}

#[derive(Debug, Default, Clone)]
pub struct StaffProfilePatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Database {
    /// Creates a staff account. `password_hash` is an already-hashed
    /// password; hashing happens at the HTTP boundary.
    pub fn create_staff(
        &self,
        name: &str,
        username: &str,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> StorageResult<StaffUser> {
        if self.staff_username_taken(username, None)? {
            return Err(StorageError::Conflict("Username already exists".into()));
        }
        if self.staff_email_taken(email, None)? {
            return Err(StorageError::Conflict("Email already exists".into()));
        }
        self.conn.execute(
            "INSERT INTO staff_users (name, username, email, role, password_hash, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![name, username, email, role.as_str(), password_hash],
        )?;
        self.get_staff(self.conn.last_insert_rowid())
    }

    pub fn get_staff(&self, staff_id: i64) -> StorageResult<StaffUser> {
        self.conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff_users WHERE id = ?1"),
                [staff_id],
                staff_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Staff user not found".into()))
    }

    /// Lookup used by the auth extractor: id must resolve to an active
    /// account.
    pub fn get_active_staff(&self, staff_id: i64) -> StorageResult<Option<StaffUser>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff_users WHERE id = ?1 AND is_active = 1"),
                [staff_id],
                staff_from_row,
            )
            .optional()?)
    }

    /// Login lookup: username must resolve to an active account.
    pub fn find_active_staff_by_username(
        &self,
        username: &str,
    ) -> StorageResult<Option<StaffUser>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {STAFF_COLUMNS} FROM staff_users
                     WHERE username = ?1 AND is_active = 1"
                ),
                [username],
                staff_from_row,
            )
            .optional()?)
    }

    pub fn list_staff(&self) -> StorageResult<Vec<StaffUser>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff_users ORDER BY id"))?;
        let rows = stmt.query_map([], staff_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn staff_count(&self) -> StorageResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM staff_users", [], |row| row.get(0))?)
    }

    /// Activates or deactivates an account. Deactivating a doctor is
    /// refused while any scheduled appointment from `today` onward
    /// exists — the clinic has no per-doctor assignment, so the guard
    /// counts the shared queue.
    pub fn set_staff_status(
        &self,
        staff_id: i64,
        is_active: bool,
        today: NaiveDate,
    ) -> StorageResult<StaffUser> {
        let staff = self.get_staff(staff_id)?;

        if !is_active && staff.role == Role::Doctor {
            let upcoming: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM appointments
                 WHERE status = 'scheduled' AND appointment_date >= ?1",
                [today.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )?;
            if upcoming > 0 {
                return Err(StorageError::Conflict(format!(
                    "Cannot deactivate: doctor has {upcoming} upcoming appointment(s). \
                     Reassign or cancel them first."
                )));
            }
        }

        self.conn.execute(
            "UPDATE staff_users SET is_active = ?1 WHERE id = ?2",
            params![is_active, staff_id],
        )?;
        self.get_staff(staff_id)
    }

    pub fn update_staff_profile(
        &self,
        staff_id: i64,
        patch: &StaffProfilePatch,
    ) -> StorageResult<StaffUser> {
        let staff = self.get_staff(staff_id)?;

        if let Some(username) = &patch.username {
            if username != &staff.username && self.staff_username_taken(username, Some(staff_id))? {
                return Err(StorageError::Conflict("Username already exists".into()));
            }
            self.conn.execute(
                "UPDATE staff_users SET username = ?1 WHERE id = ?2",
                params![username, staff_id],
            )?;
        }
        if let Some(email) = &patch.email {
            if email != &staff.email && self.staff_email_taken(email, Some(staff_id))? {
                return Err(StorageError::Conflict("Email already exists".into()));
            }
            self.conn.execute(
                "UPDATE staff_users SET email = ?1 WHERE id = ?2",
                params![email, staff_id],
            )?;
        }
        if let Some(name) = &patch.name {
            self.conn.execute(
                "UPDATE staff_users SET name = ?1 WHERE id = ?2",
                params![name, staff_id],
            )?;
        }
        self.get_staff(staff_id)
    }

    pub fn reset_staff_password(&self, staff_id: i64, password_hash: &str) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE staff_users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, staff_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound("Staff user not found".into()));
        }
        Ok(())
    }

    fn staff_username_taken(&self, username: &str, except: Option<i64>) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM staff_users WHERE username = ?1 AND id != ?2",
            params![username, except.unwrap_or(-1)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn staff_email_taken(&self, email: &str, except: Option<i64>) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM staff_users WHERE email = ?1 AND id != ?2",
            params![email, except.unwrap_or(-1)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
