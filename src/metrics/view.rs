use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::aggregator::{aggregate_many, PatientMetricsView};
use crate::models::{PatientProfile, RecoveryLogEntry};

/// Shallow merge of a patient profile and its metrics.
///
/// Metrics fields overwrite profile fields of the same name.
pub fn compose_patient_view(
    patient: &PatientProfile,
    metrics: &PatientMetricsView,
) -> Result<Value, serde_json::Error> {
    let mut merged = match serde_json::to_value(patient)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(fields) = serde_json::to_value(metrics)? {
        merged.extend(fields);
    }
    Ok(Value::Object(merged))
}

/// Aggregate and compose the dashboard rows for a set of patients.
pub fn compose_patient_views(
    patients: &[PatientProfile],
    entries: Vec<RecoveryLogEntry>,
    now: DateTime<Utc>,
) -> Result<Vec<Value>, serde_json::Error> {
    let metrics = aggregate_many(patients, entries, now);
    patients
        .iter()
        .zip(metrics.iter())
        .map(|(patient, metrics)| compose_patient_view(patient, metrics))
        .collect()
}
