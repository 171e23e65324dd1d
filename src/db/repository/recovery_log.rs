use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

use super::user::parse_uuid;
use crate::db::{unique_violation, DatabaseError};
use crate::models::*;

pub fn insert_recovery_log(conn: &Connection, entry: &RecoveryLogEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO recovery_logs (id, patient_id, recovery_progress_value, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id.to_string(),
            entry.patient_id.to_string(),
            entry.recovery_progress_value,
            entry.notes_text,
            entry.created_at,
        ],
    )
    .map_err(|e| unique_violation(e, &format!("recovery log {}", entry.id)))?;
    Ok(())
}

/// Record a new entry for a patient, stamped now.
pub fn record_recovery_log(
    conn: &Connection,
    patient_id: &Uuid,
    input: &NewRecoveryLog,
) -> Result<RecoveryLogEntry, DatabaseError> {
    let entry = RecoveryLogEntry {
        id: Uuid::new_v4(),
        patient_id: *patient_id,
        recovery_progress_value: input.recovery_progress_value,
        notes_text: input.compose_notes(),
        created_at: Utc::now(),
    };
    insert_recovery_log(conn, &entry)?;
    Ok(entry)
}

/// Insert a batch of externally supplied entries in one transaction.
/// Every owner must be an existing patient, or nothing is written.
pub fn import_recovery_logs(
    conn: &mut Connection,
    entries: &[RecoveryLogEntry],
) -> Result<usize, DatabaseError> {
    let tx = conn.transaction()?;
    for entry in entries {
        super::user::get_patient_profile(&tx, &entry.patient_id)?;
        insert_recovery_log(&tx, entry)?;
    }
    tx.commit()?;
    Ok(entries.len())
}

/// A patient's entries, most recent first.
pub fn list_recovery_logs(
    conn: &Connection,
    patient_id: &Uuid,
    limit: Option<u32>,
) -> Result<Vec<RecoveryLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, recovery_progress_value, notes, created_at
         FROM recovery_logs WHERE patient_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2",
    )?;
    let limit = limit.map_or(-1, i64::from);
    let rows = stmt.query_map(params![patient_id.to_string(), limit], log_row)?;
    collect_entries(rows)
}

/// Entries for several patients in one query, most recent first overall.
pub fn list_recovery_logs_for_patients(
    conn: &Connection,
    patient_ids: &[Uuid],
) -> Result<Vec<RecoveryLogEntry>, DatabaseError> {
    if patient_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; patient_ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT id, patient_id, recovery_progress_value, notes, created_at
         FROM recovery_logs WHERE patient_id IN ({placeholders})
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let ids: Vec<String> = patient_ids.iter().map(Uuid::to_string).collect();
    let rows = stmt.query_map(params_from_iter(ids.iter()), log_row)?;
    collect_entries(rows)
}

type LogRow = (String, String, Option<f64>, String, DateTime<Utc>);

fn log_row(row: &Row<'_>) -> rusqlite::Result<LogRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn collect_entries(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<LogRow>>,
) -> Result<Vec<RecoveryLogEntry>, DatabaseError> {
    let mut entries = Vec::new();
    for row in rows {
        let (id, patient_id, value, notes, created_at) = row?;
        entries.push(RecoveryLogEntry {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            recovery_progress_value: value.filter(|v| v.is_finite()),
            notes_text: notes,
            created_at,
        });
    }
    Ok(entries)
}
