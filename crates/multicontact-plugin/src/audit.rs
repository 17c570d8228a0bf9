// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail: append-only SQLite log of every privileged contacts operation.
//
// Schema:
//   audit_log(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     action        TEXT    NOT NULL,   -- e.g. "get_contact", "delete_contact"
//     subject_hash  TEXT    NOT NULL,   -- SHA-256 hex of the contact id, or "*"
//     success       INTEGER NOT NULL,   -- 0 = failure, 1 = success
//     details       TEXT                -- optional free-form context
//   )
//
// Contact identifiers are hashed before they are written, so the database
// never holds a raw id.

use std::path::Path;

use chrono::Utc;
use multicontact_core::error::{ContactsError, Result};
use multicontact_core::ContactId;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Subject recorded for operations that touch the whole address book.
pub const ALL_CONTACTS: &str = "*";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit_log (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp     TEXT    NOT NULL,
    action        TEXT    NOT NULL,
    subject_hash  TEXT    NOT NULL,
    success       INTEGER NOT NULL,
    details       TEXT
);";

fn db_err(e: rusqlite::Error) -> ContactsError {
    ContactsError::Database(e.to_string())
}

/// SHA-256 of a contact id as lowercase hex.
pub fn subject_hash(id: &ContactId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// A single entry in the audit log, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub subject_hash: String,
    pub success: bool,
    pub details: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            action: row.get(2)?,
            subject_hash: row.get(3)?,
            success: row.get::<_, i32>(4)? != 0,
            details: row.get(5)?,
        })
    }
}

/// Append-only audit log backed by a SQLite database.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Record a new audit entry. `subject` is already hashed (see
    /// [`subject_hash`]) or [`ALL_CONTACTS`].
    #[instrument(skip(self, details), fields(%action, %subject, success))]
    pub fn record(
        &self,
        action: &str,
        subject: &str,
        success: bool,
        details: Option<&str>,
    ) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        let success_int: i32 = if success { 1 } else { 0 };

        self.conn
            .execute(
                "INSERT INTO audit_log (timestamp, action, subject_hash, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![timestamp, action, subject, success_int, details],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries concerning one contact, oldest first.
    pub fn entries_for_contact(&self, id: &ContactId) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, subject_hash, success, details
                 FROM audit_log
                 WHERE subject_hash = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![subject_hash(id)], AuditEntry::from_row)
            .map_err(db_err)?;
        rows.map(|r| r.map_err(db_err)).collect()
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, subject_hash, success, details
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![limit], AuditEntry::from_row)
            .map_err(db_err)?;
        rows.map(|r| r.map_err(db_err)).collect()
    }

    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .map_err(db_err)
    }
}
