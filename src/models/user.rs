use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// Account record. Password material lives in the repository layer and
/// never reaches this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub date_of_birth: Option<NaiveDate>,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Patient-facing projection handed to the metrics aggregator and merged
/// with its output for the dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
}

impl From<User> for PatientProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            date_of_birth: user.date_of_birth,
            created_at: user.created_at,
            surgery_type: user.surgery_type,
            surgery_date: user.surgery_date,
        }
    }
}

/// Input for admin account creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub surgery_type: Option<String>,
    #[serde(default)]
    pub surgery_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_profile_uses_wire_field_names() {
        let profile = PatientProfile {
            id: Uuid::nil(),
            name: "Ada".into(),
            username: "ada".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 1),
            created_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            surgery_type: Some("Knee replacement".into()),
            surgery_date: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["_id"], Uuid::nil().to_string());
        assert_eq!(json["dateOfBirth"], "1980-05-01");
        assert_eq!(json["surgeryType"], "Knee replacement");
        assert!(json["surgeryDate"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn new_user_optional_fields_default() {
        let input: NewUser = serde_json::from_str(
            r#"{"username":"drwho","password":"pw","name":"Dr Who","role":"doctor"}"#,
        )
        .unwrap();
        assert_eq!(input.role, Role::Doctor);
        assert!(input.date_of_birth.is_none());
    }
}
