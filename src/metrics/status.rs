use crate::models::RecoveryStatus;

pub const CRITICAL_PAIN: f64 = 7.0;
pub const CRITICAL_TEMPERATURE_F: f64 = 101.0;
pub const MODERATE_PAIN: f64 = 3.0;
pub const MODERATE_TEMPERATURE_F: f64 = 99.5;

/// Coarse severity from average pain and average temperature.
///
/// Either signal alone escalates; the two are never combined. Thresholds
/// are strict (`>`), checked critical first.
pub fn classify_status(avg_pain: f64, avg_temp: f64) -> RecoveryStatus {
    if avg_pain > CRITICAL_PAIN || avg_temp > CRITICAL_TEMPERATURE_F {
        RecoveryStatus::Critical
    } else if avg_pain > MODERATE_PAIN || avg_temp > MODERATE_TEMPERATURE_F {
        RecoveryStatus::Moderate
    } else {
        RecoveryStatus::Stable
    }
}
