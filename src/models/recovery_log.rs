use chrono::{DateTime, Utc};
use serde::de::{Deserializer, Error as _, IgnoredAny};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One patient-submitted recovery entry. Immutable once stored.
///
/// Deserialization accepts the legacy document shapes: the owner under
/// `patientId` or `patient`, as a plain string or `{"$oid": "..."}`, and a
/// progress value that may not be a number at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryLogEntry {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(alias = "patient", deserialize_with = "deserialize_record_ref")]
    pub patient_id: Uuid,
    /// Self-reported value, read as pain level. `None` when not numeric.
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub recovery_progress_value: Option<f64>,
    #[serde(rename = "notes", alias = "notesText", default)]
    pub notes_text: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a patient recording a new entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecoveryLog {
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub recovery_progress_value: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Structured reading, folded into the notes as `Temp: <value>`.
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub temperature: Option<f64>,
}

impl NewRecoveryLog {
    /// Final notes text as stored. A structured temperature leads the
    /// notes in the `Temp: <value>` form, so it is the reading the
    /// aggregator picks up even when the free text carries its own.
    pub fn compose_notes(&self) -> String {
        let notes = self.notes.as_deref().unwrap_or("").trim();
        match self.temperature {
            Some(temp) if notes.is_empty() => format!("Temp: {temp}"),
            Some(temp) => format!("Temp: {temp}\n{notes}"),
            None => notes.to_string(),
        }
    }

    /// Reject input that would store nothing, or a structured temperature
    /// that could not be read back from the notes.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Provide a recovery value, a temperature or notes".into());
        }
        match self.temperature {
            Some(temp) if !temp.is_finite() || temp <= 0.0 => {
                Err(format!("Temperature must be a positive number, got {temp}"))
            }
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recovery_progress_value.is_none()
            && self.temperature.is_none()
            && self.notes.as_deref().map_or(true, |n| n.trim().is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordRef {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

fn deserialize_record_ref<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match RecordRef::deserialize(deserializer)? {
        RecordRef::Plain(s) => s,
        RecordRef::Extended { oid } => oid,
    };
    Uuid::parse_str(raw.trim()).map_err(D::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Other(IgnoredAny),
}

/// Numbers pass through; anything else (strings, booleans, objects) is
/// absent rather than an error.
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(LenientNumber::Number(n)) if n.is_finite() => Some(n),
        _ => None,
    })
}
