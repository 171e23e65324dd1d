use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::user::{get_user_with_role, parse_uuid};
use crate::db::{unique_violation, DatabaseError};
use crate::models::*;

const ASSIGNMENT_SELECT: &str = "SELECT a.id, a.doctor_id, d.name, a.patient_id, p.name, a.created_at
     FROM assignments a
     JOIN users d ON d.id = a.doctor_id
     JOIN users p ON p.id = a.patient_id";

/// Assign a patient to a doctor. Both ends must exist with the right role.
pub fn insert_assignment(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Assignment, DatabaseError> {
    let doctor = get_user_with_role(conn, doctor_id, Role::Doctor)?;
    let patient = get_user_with_role(conn, patient_id, Role::Patient)?;

    let assignment = Assignment {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        doctor_name: doctor.name,
        patient_id: patient.id,
        patient_name: patient.name,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO assignments (id, doctor_id, patient_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            assignment.id.to_string(),
            assignment.doctor_id.to_string(),
            assignment.patient_id.to_string(),
            assignment.created_at,
        ],
    )
    .map_err(|e| unique_violation(e, "assignment"))?;

    Ok(assignment)
}

pub fn get_assignment(conn: &Connection, id: &Uuid) -> Result<Option<Assignment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{ASSIGNMENT_SELECT} WHERE a.id = ?1"),
            params![id.to_string()],
            assignment_row,
        )
        .optional()?;
    row.map(into_assignment).transpose()
}

/// Remove an assignment and return the row as it was.
pub fn delete_assignment(conn: &Connection, id: &Uuid) -> Result<Assignment, DatabaseError> {
    let assignment =
        get_assignment(conn, id)?.ok_or_else(|| DatabaseError::not_found("assignment", id))?;
    conn.execute(
        "DELETE FROM assignments WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(assignment)
}

pub fn list_assignments(
    conn: &Connection,
    doctor_id: Option<&Uuid>,
) -> Result<Vec<Assignment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{ASSIGNMENT_SELECT}
         WHERE (?1 IS NULL OR a.doctor_id = ?1)
         ORDER BY d.name COLLATE NOCASE, p.name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![doctor_id.map(Uuid::to_string)], assignment_row)?;
    rows.map(|row| into_assignment(row?)).collect()
}

/// Patients assigned to a doctor, ordered by name.
pub fn patients_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<PatientProfile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id FROM assignments a
         JOIN users p ON p.id = a.patient_id
         WHERE a.doctor_id = ?1 AND p.role = 'patient'
         ORDER BY p.name COLLATE NOCASE, p.username",
    )?;
    let ids = stmt
        .query_map(params![doctor_id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    ids.iter()
        .map(|id| super::user::get_patient_profile(conn, &parse_uuid(id)?))
        .collect()
}

pub fn is_assigned(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM assignments WHERE doctor_id = ?1 AND patient_id = ?2)",
        params![doctor_id.to_string(), patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

type AssignmentRow = (String, String, String, String, String, DateTime<Utc>);

fn assignment_row(row: &Row<'_>) -> rusqlite::Result<AssignmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_assignment(row: AssignmentRow) -> Result<Assignment, DatabaseError> {
    let (id, doctor_id, doctor_name, patient_id, patient_name, created_at) = row;
    Ok(Assignment {
        id: parse_uuid(&id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        doctor_name,
        patient_id: parse_uuid(&patient_id)?,
        patient_name,
        created_at,
    })
}
