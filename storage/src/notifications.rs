// storage/src/notifications.rs
//! Notification log. There is no delivery provider behind this; rows are
//! recorded with status "sent" and serve as an audit trail. The
//! fire-and-forget wrapper around this store lives in the HTTP layer.

use rusqlite::{OptionalExtension, Row, params};

use models::NotificationLog;

use crate::{Database, StorageError, StorageResult, timestamp_col};

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationLog> {
    Ok(NotificationLog {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        appointment_id: row.get(2)?,
        channel: row.get(3)?,
        message: row.get(4)?,
        status: row.get(5)?,
        sent_at: timestamp_col(row, 6)?,
    })
}

impl Database {
    /// Records an outbound message. The owner must exist; status is
    /// always "sent".
    pub fn record_notification(
        &self,
        owner_id: i64,
        appointment_id: Option<i64>,
        channel: &str,
        message: &str,
    ) -> StorageResult<NotificationLog> {
        self.conn.execute(
            "INSERT INTO notification_logs (owner_id, appointment_id, channel, message, status)
             VALUES (?1, ?2, ?3, ?4, 'sent')",
            params![owner_id, appointment_id, channel, message],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, owner_id, appointment_id, channel, message, status, sent_at
                 FROM notification_logs WHERE id = ?1",
                [id],
                log_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Notification not found".into()))
    }

    /// Sent messages, newest first, optionally for one owner.
    pub fn list_notifications(&self, owner_id: Option<i64>) -> StorageResult<Vec<NotificationLog>> {
        let mut sql = String::from(
            "SELECT id, owner_id, appointment_id, channel, message, status, sent_at
             FROM notification_logs WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(owner_id) = owner_id {
            sql.push_str(" AND owner_id = ?");
            args.push(Box::new(owner_id));
        }
        sql.push_str(" ORDER BY sent_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|b| b.as_ref())),
            log_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
