use std::sync::LazyLock;

use regex::Regex;

/// Temperature assumed when notes carry no parseable reading (°F).
pub const DEFAULT_TEMPERATURE_F: f64 = 98.6;

/// Activity keywords and their mobility weights.
pub const MOBILITY_ACTIVITIES: &[(&str, u32)] = &[
    ("dress", 15),
    ("bath", 15),
    ("walk", 20),
    ("stairs", 25),
    ("exercise", 25),
];

pub const MOBILITY_CAP: u32 = 100;

/// `Temp: 99.1`, any case. The capture is digits and dots only.
static TEMPERATURE_READING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Temp:\s*([0-9.]+)").unwrap());

/// Looser form used for entry validity: accepts `temp=` and integers.
static TEMPERATURE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)temp[:=]\s*[0-9]+").unwrap());

/// First `Temp:` reading in the notes, if it parses as a number.
pub fn extract_temperature(notes: &str) -> Option<f64> {
    TEMPERATURE_READING
        .captures(notes)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_leading_float(m.as_str()))
}

/// Whether the notes mention a temperature in the loose `temp:`/`temp=` form.
pub fn mentions_temperature(notes: &str) -> bool {
    TEMPERATURE_MENTION.is_match(notes)
}

/// Sum of keyword weights found in the lower-cased notes, capped at 100.
/// Substring match: "bathroom" counts as `bath`.
pub fn mobility_score(notes: &str) -> u32 {
    let lowered = notes.to_lowercase();
    let total: u32 = MOBILITY_ACTIVITIES
        .iter()
        .filter(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, weight)| weight)
        .sum();
    total.min(MOBILITY_CAP)
}

/// Parse the longest numeric prefix of a digits-and-dots capture.
///
/// `"98.6.1"` reads as 98.6, `".5"` as 0.5; a lone `"."` is not a number.
fn parse_leading_float(raw: &str) -> Option<f64> {
    let end = raw
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .nth(1)
        .map_or(raw.len(), |(idx, _)| idx);
    raw[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_extraction_ignores_case() {
        assert_eq!(extract_temperature("temp: 103.2, feeling rough"), Some(103.2));
        assert_eq!(extract_temperature("TEMP:103.2"), Some(103.2));
        assert_eq!(extract_temperature("Morning check. Temp:   99"), Some(99.0));
    }

    #[test]
    fn temperature_requires_colon_form() {
        assert_eq!(extract_temperature("temp=99.1"), None);
        assert_eq!(extract_temperature("temperature 99.1"), None);
        assert_eq!(extract_temperature(""), None);
    }

    #[test]
    fn first_temperature_reading_wins() {
        assert_eq!(extract_temperature("Temp: 99.0 later Temp: 101.0"), Some(99.0));
    }

    #[test]
    fn unparseable_capture_is_absent() {
        assert_eq!(extract_temperature("Temp: ."), None);
        assert_eq!(extract_temperature("Temp: 98.6.1"), Some(98.6));
        assert_eq!(extract_temperature("Temp: .5"), Some(0.5));
    }

    #[test]
    fn loose_mention_accepts_equals_and_integers() {
        assert!(mentions_temperature("Temp=98"));
        assert!(mentions_temperature("temp:98"));
        assert!(mentions_temperature("TEMP: 100"));
        assert!(!mentions_temperature("Temp: .5"));
        assert!(!mentions_temperature("no reading"));
    }

    #[test]
    fn mobility_sums_keyword_weights() {
        assert_eq!(mobility_score("Walked to the kitchen"), 20);
        assert_eq!(mobility_score("got dressed, took a bath"), 30);
        assert_eq!(mobility_score("nothing much today"), 0);
    }

    #[test]
    fn mobility_with_every_keyword_hits_cap() {
        let notes = "Dressed, bathed, walked, climbed stairs and did exercise";
        assert_eq!(mobility_score(notes), 100);
    }

    #[test]
    fn mobility_keyword_counts_once() {
        assert_eq!(mobility_score("walk walk walk"), 20);
    }
}
