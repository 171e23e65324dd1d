use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::user::{get_user_with_role, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_doctor_note(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
    content: &str,
) -> Result<DoctorNote, DatabaseError> {
    let doctor = get_user_with_role(conn, doctor_id, Role::Doctor)?;
    get_user_with_role(conn, patient_id, Role::Patient)?;

    let note = DoctorNote {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        doctor_name: doctor.name,
        patient_id: *patient_id,
        content: content.trim().to_string(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO doctor_notes (id, doctor_id, patient_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            note.id.to_string(),
            note.doctor_id.to_string(),
            note.patient_id.to_string(),
            note.content,
            note.created_at,
        ],
    )?;
    Ok(note)
}

/// Notes left for a patient, most recent first. `doctor_id` narrows to one author.
pub fn list_doctor_notes(
    conn: &Connection,
    patient_id: &Uuid,
    doctor_id: Option<&Uuid>,
) -> Result<Vec<DoctorNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT n.id, n.doctor_id, d.name, n.patient_id, n.content, n.created_at
         FROM doctor_notes n
         JOIN users d ON d.id = n.doctor_id
         WHERE n.patient_id = ?1 AND (?2 IS NULL OR n.doctor_id = ?2)
         ORDER BY n.created_at DESC, n.rowid DESC",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), doctor_id.map(Uuid::to_string)],
        note_row,
    )?;

    let mut notes = Vec::new();
    for row in rows {
        let (id, doctor_id, doctor_name, patient_id, content, created_at) = row?;
        notes.push(DoctorNote {
            id: parse_uuid(&id)?,
            doctor_id: parse_uuid(&doctor_id)?,
            doctor_name,
            patient_id: parse_uuid(&patient_id)?,
            content,
            created_at,
        });
    }
    Ok(notes)
}

type NoteRow = (String, String, String, String, String, DateTime<Utc>);

fn note_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}
