use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::extract::{
    extract_temperature, mentions_temperature, mobility_score, DEFAULT_TEMPERATURE_F,
};
use super::status::classify_status;
use crate::models::{PatientProfile, RecoveryLogEntry, RecoveryStatus};

const MILLIS_PER_AGE_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;

/// One row of the recovery history chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub pain: f64,
    pub temp: f64,
    pub mobility: u32,
}

/// Aggregated recovery metrics for one patient, computed per request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientMetricsView {
    pub pain_level: f64,
    pub temperature: f64,
    pub mobility: f64,
    pub status: RecoveryStatus,
    pub unread_notes: usize,
    pub log_entries: usize,
    pub age: String,
    pub last_updated: DateTime<Utc>,
    pub recovery_history: Vec<HistoryPoint>,
}

/// Aggregate a patient's recovery entries into dashboard metrics.
///
/// `entries` must already be filtered to this patient and sorted most
/// recent first; the first entry supplies `last_updated` and the history
/// keeps that order.
pub fn aggregate_patient_metrics(
    patient: &PatientProfile,
    entries: &[RecoveryLogEntry],
    now: DateTime<Utc>,
) -> PatientMetricsView {
    let age = derive_age(patient.date_of_birth, now);

    let Some(latest) = entries.first() else {
        return PatientMetricsView {
            pain_level: 0.0,
            temperature: DEFAULT_TEMPERATURE_F,
            mobility: 0.0,
            status: RecoveryStatus::Stable,
            unread_notes: 0,
            log_entries: 0,
            age,
            last_updated: patient.created_at,
            recovery_history: Vec::new(),
        };
    };

    let mut temps = Vec::new();
    let mut pains = Vec::new();
    let mut mobility_scores = Vec::with_capacity(entries.len());
    let mut recovery_history = Vec::with_capacity(entries.len());

    for entry in entries {
        let temp = extract_temperature(&entry.notes_text);
        let mobility = mobility_score(&entry.notes_text);

        if let Some(t) = temp {
            temps.push(t);
        }
        if let Some(p) = entry.recovery_progress_value {
            pains.push(p);
        }
        mobility_scores.push(f64::from(mobility));

        recovery_history.push(HistoryPoint {
            date: entry.created_at,
            pain: entry.recovery_progress_value.unwrap_or(0.0),
            temp: temp.unwrap_or(DEFAULT_TEMPERATURE_F),
            mobility,
        });
    }

    let avg_temp = mean(&temps).unwrap_or(DEFAULT_TEMPERATURE_F);
    let avg_pain = mean(&pains).unwrap_or(0.0);
    let avg_mobility = mean(&mobility_scores).unwrap_or(0.0);

    let log_entries = entries.iter().filter(|e| is_valid_entry(e)).count();
    let unread_notes = entries
        .iter()
        .filter(|e| !e.notes_text.trim().is_empty())
        .count();

    PatientMetricsView {
        pain_level: round_one_decimal(avg_pain),
        temperature: round_one_decimal(avg_temp),
        mobility: round_one_decimal(avg_mobility),
        status: classify_status(avg_pain, avg_temp),
        unread_notes,
        log_entries,
        age,
        last_updated: latest.created_at,
        recovery_history,
    }
}

/// Aggregate many patients from one batched entry fetch.
///
/// Entries are grouped by owner, keeping their relative order, so the
/// result matches calling [`aggregate_patient_metrics`] per patient with a
/// per-patient fetch.
pub fn aggregate_many(
    patients: &[PatientProfile],
    entries: Vec<RecoveryLogEntry>,
    now: DateTime<Utc>,
) -> Vec<PatientMetricsView> {
    let mut by_patient: HashMap<Uuid, Vec<RecoveryLogEntry>> = HashMap::new();
    for entry in entries {
        by_patient.entry(entry.patient_id).or_default().push(entry);
    }

    patients
        .iter()
        .map(|patient| {
            let own = by_patient.get(&patient.id).map(Vec::as_slice).unwrap_or(&[]);
            aggregate_patient_metrics(patient, own, now)
        })
        .collect()
}

/// Whole years since birth on a 365.25-day year, or `"N/A"`.
///
/// Not calendar-aware: a birth date exactly 730 days back reads as 1.
pub fn derive_age(date_of_birth: Option<NaiveDate>, now: DateTime<Utc>) -> String {
    match date_of_birth {
        Some(dob) => {
            let born = dob.and_time(NaiveTime::MIN).and_utc();
            let elapsed_ms = (now - born).num_milliseconds() as f64;
            ((elapsed_ms / MILLIS_PER_AGE_YEAR).floor() as i64).to_string()
        }
        None => "N/A".to_string(),
    }
}

/// An entry counts toward `logEntries` when it carries any usable signal.
fn is_valid_entry(entry: &RecoveryLogEntry) -> bool {
    entry.recovery_progress_value.is_some()
        || !entry.notes_text.trim().is_empty()
        || mentions_temperature(&entry.notes_text)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    fn patient(dob: Option<NaiveDate>) -> PatientProfile {
        PatientProfile {
            id: Uuid::new_v4(),
            name: "Grace Hopper".into(),
            username: "grace".into(),
            date_of_birth: dob,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 8, 30, 0).unwrap(),
            surgery_type: Some("Hip replacement".into()),
            surgery_date: None,
        }
    }

    fn entry(patient: &PatientProfile, pain: Option<f64>, notes: &str, hour: u32) -> RecoveryLogEntry {
        RecoveryLogEntry {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            recovery_progress_value: pain,
            notes_text: notes.into(),
            created_at: at(hour),
        }
    }

    #[test]
    fn empty_entries_yield_default_view() {
        let p = patient(None);
        let view = aggregate_patient_metrics(&p, &[], at(12));
        assert_eq!(
            view,
            PatientMetricsView {
                pain_level: 0.0,
                temperature: 98.6,
                mobility: 0.0,
                status: RecoveryStatus::Stable,
                unread_notes: 0,
                log_entries: 0,
                age: "N/A".into(),
                last_updated: p.created_at,
                recovery_history: vec![],
            }
        );
    }

    #[test]
    fn partial_temperature_data_averages_only_readings() {
        let p = patient(None);
        let entries = vec![
            entry(&p, Some(2.0), "Temp: 100.4 walked", 12),
            entry(&p, Some(4.0), "got dressed", 11),
            entry(&p, Some(6.0), "", 10),
        ];
        let view = aggregate_patient_metrics(&p, &entries, at(13));
        assert_eq!(view.temperature, 100.4);
        assert_eq!(view.pain_level, 4.0);
        // (20 + 15 + 0) / 3 = 11.666...
        assert_eq!(view.mobility, 11.7);
        assert_eq!(view.status, RecoveryStatus::Moderate);
        assert_eq!(view.last_updated, at(12));
    }

    #[test]
    fn missing_pain_is_excluded_from_average_but_zero_in_history() {
        let p = patient(None);
        let entries = vec![
            entry(&p, None, "walked", 12),
            entry(&p, Some(8.0), "", 11),
        ];
        let view = aggregate_patient_metrics(&p, &entries, at(13));
        assert_eq!(view.pain_level, 8.0);
        assert_eq!(view.status, RecoveryStatus::Critical);
        assert_eq!(view.recovery_history[0].pain, 0.0);
        assert_eq!(view.recovery_history[1].pain, 8.0);
    }

    #[test]
    fn history_preserves_order_and_defaults_temperature() {
        let p = patient(None);
        let entries = vec![
            entry(&p, Some(1.0), "TEMP:99.9 stairs", 12),
            entry(&p, Some(2.0), "rested", 9),
        ];
        let view = aggregate_patient_metrics(&p, &entries, at(13));
        assert_eq!(
            view.recovery_history,
            vec![
                HistoryPoint { date: at(12), pain: 1.0, temp: 99.9, mobility: 25 },
                HistoryPoint { date: at(9), pain: 2.0, temp: 98.6, mobility: 0 },
            ]
        );
    }

    #[test]
    fn validity_and_unread_counts_are_independent() {
        let p = patient(None);
        let entries = vec![
            entry(&p, None, "   ", 12),
            entry(&p, None, "ok", 11),
            entry(&p, Some(3.0), "", 10),
            entry(&p, None, "", 9),
        ];
        let view = aggregate_patient_metrics(&p, &entries, at(13));
        // "ok" (non-empty note) and the numeric entry are valid.
        assert_eq!(view.log_entries, 2);
        // Only "ok" has a non-blank note.
        assert_eq!(view.unread_notes, 1);
    }

    #[test]
    fn age_uses_365_25_day_years() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let dob = (now - Duration::days(730)).date_naive();
        assert_eq!(derive_age(Some(dob), now), "1");

        let dob = (now - Duration::days(731)).date_naive();
        assert_eq!(derive_age(Some(dob), now), "2");
        assert_eq!(derive_age(None, now), "N/A");
    }

    #[test]
    fn age_is_reported_on_the_empty_view() {
        let p = patient(NaiveDate::from_ymd_opt(1990, 1, 1));
        let view = aggregate_patient_metrics(&p, &[], at(12));
        assert_eq!(view.age, "34");
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let p = patient(None);
        let entries = vec![
            entry(&p, Some(1.0), "Temp: 99.1", 12),
            entry(&p, Some(2.0), "Temp: 99.2", 11),
            entry(&p, Some(2.0), "Temp: 99.4", 10),
        ];
        let view = aggregate_patient_metrics(&p, &entries, at(13));
        assert_eq!(view.pain_level, 1.7);
        assert_eq!(view.temperature, 99.2);
    }

    #[test]
    fn batched_aggregation_matches_per_patient() {
        let a = patient(None);
        let b = patient(None);
        let c = patient(None);
        let a_entries = vec![entry(&a, Some(8.0), "Temp: 101.2", 12), entry(&a, Some(6.0), "walk", 10)];
        let b_entries = vec![entry(&b, Some(1.0), "exercise", 11)];

        let mut batch = Vec::new();
        batch.push(a_entries[0].clone());
        batch.push(b_entries[0].clone());
        batch.push(a_entries[1].clone());

        let now = at(14);
        let views = aggregate_many(&[a.clone(), b.clone(), c.clone()], batch, now);
        assert_eq!(views[0], aggregate_patient_metrics(&a, &a_entries, now));
        assert_eq!(views[1], aggregate_patient_metrics(&b, &b_entries, now));
        assert_eq!(views[2], aggregate_patient_metrics(&c, &[], now));
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let p = patient(None);
        let view = aggregate_patient_metrics(&p, &[entry(&p, Some(5.0), "walk", 12)], at(13));
        let json = serde_json::to_value(&view).unwrap();
        for key in [
            "painLevel", "temperature", "mobility", "status", "unreadNotes",
            "logEntries", "age", "lastUpdated", "recoveryHistory",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["status"], "moderate");
        assert_eq!(json["recoveryHistory"][0]["mobility"], 20);
    }
}
