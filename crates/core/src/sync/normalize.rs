//! Provider field normalization.
//!
//! Pure conversions from provider-native representations into catalog types.
//! Bad upstream values never reject a record. Dates follow an explicit
//! [`OnParseFailure`] policy; an unusable rating leaves the stored one alone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Genre substituted when the provider supplies none.
pub const PLACEHOLDER_GENRE: &str = "Uncategorized";

/// Description used when the show detail could not be fetched.
pub const PLACEHOLDER_DESCRIPTION: &str = "No description available.";

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// What to do when a provider value cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnParseFailure {
    /// Substitute the processing timestamp.
    UseNow,
    /// Leave the target field at its current/default value.
    KeepDefault,
}

/// Policy applied to start dates. Masks bad upstream dates as "now".
pub const START_DATE_POLICY: OnParseFailure = OnParseFailure::UseNow;

/// Parse a provider date.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` (midnight UTC).
/// On failure returns `Some(now)` under [`OnParseFailure::UseNow`] and `None`
/// under [`OnParseFailure::KeepDefault`].
pub fn parse_start_date(
    raw: Option<&str>,
    now: DateTime<Utc>,
    policy: OnParseFailure,
) -> Option<DateTime<Utc>> {
    match raw.and_then(parse_date) {
        Some(date) => Some(date),
        None => match policy {
            OnParseFailure::UseNow => Some(now),
            OnParseFailure::KeepDefault => None,
        },
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse a provider rating string into a clamped rating.
///
/// Returns `None` for absent, blank, non-numeric or non-finite input.
pub fn parse_rating(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .map(clamp_rating)
}

/// Clamp a rating into [0.0, 10.0].
pub fn clamp_rating(rating: f64) -> f64 {
    rating.clamp(MIN_RATING, MAX_RATING)
}

/// Apply a provider rating onto `target`.
///
/// An unusable rating leaves `target` as it is. Returns whether the field
/// changed.
pub fn apply_rating(target: &mut f64, raw: Option<&str>) -> bool {
    match parse_rating(raw) {
        Some(rating) => {
            *target = rating;
            true
        }
        None => false,
    }
}

/// Clean a provider genre list, substituting the placeholder when empty so
/// every show carries at least one genre.
pub fn default_genres(raw: Option<&[String]>) -> Vec<String> {
    let genres: Vec<String> = raw
        .unwrap_or_default()
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    if genres.is_empty() {
        vec![PLACEHOLDER_GENRE.to_string()]
    } else {
        genres
    }
}

/// Trimmed non-empty text, or `fallback`.
pub fn text_or(raw: Option<&str>, fallback: &str) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn test_parse_start_date_plain_date() {
        let parsed = parse_start_date(Some("2013-06-24"), fixed_now(), START_DATE_POLICY);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2013, 6, 24, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_start_date_datetime_forms() {
        let parsed = parse_start_date(Some("2014-10-08 01:30:00"), fixed_now(), START_DATE_POLICY);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2014, 10, 8, 1, 30, 0).unwrap()));

        let parsed = parse_start_date(
            Some("2014-10-07T20:00:00-05:00"),
            fixed_now(),
            START_DATE_POLICY,
        );
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2014, 10, 8, 1, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_start_date_garbage_uses_now() {
        let now = fixed_now();
        assert_eq!(
            parse_start_date(Some("not-a-date"), now, OnParseFailure::UseNow),
            Some(now)
        );
        assert_eq!(parse_start_date(Some("2014"), now, OnParseFailure::UseNow), Some(now));
        assert_eq!(parse_start_date(Some("   "), now, OnParseFailure::UseNow), Some(now));
        assert_eq!(parse_start_date(None, now, OnParseFailure::UseNow), Some(now));
    }

    #[test]
    fn test_parse_start_date_garbage_keep_default() {
        assert_eq!(
            parse_start_date(Some("not-a-date"), fixed_now(), OnParseFailure::KeepDefault),
            None
        );
    }

    #[test]
    fn test_parse_rating_clamps() {
        assert_eq!(parse_rating(Some("11.2")), Some(10.0));
        assert_eq!(parse_rating(Some("-3")), Some(0.0));
        assert_eq!(parse_rating(Some(" 8.75 ")), Some(8.75));
        assert_eq!(parse_rating(Some("10")), Some(10.0));
    }

    #[test]
    fn test_parse_rating_rejects_non_numeric() {
        assert_eq!(parse_rating(Some("excellent")), None);
        assert_eq!(parse_rating(Some("")), None);
        assert_eq!(parse_rating(Some("NaN")), None);
        assert_eq!(parse_rating(Some("inf")), None);
        assert_eq!(parse_rating(None), None);
    }

    #[test]
    fn test_apply_rating_unusable_value_leaves_target() {
        let mut rating = 0.0;
        assert!(!apply_rating(&mut rating, Some("n/a")));
        assert_eq!(rating, 0.0);

        let mut rating = 7.4;
        assert!(!apply_rating(&mut rating, Some("n/a")));
        assert_eq!(rating, 7.4);
        assert!(!apply_rating(&mut rating, None));
        assert_eq!(rating, 7.4);

        assert!(apply_rating(&mut rating, Some("11.2")));
        assert_eq!(rating, 10.0);
    }

    #[test]
    fn test_default_genres() {
        assert_eq!(default_genres(None), vec![PLACEHOLDER_GENRE]);
        assert_eq!(default_genres(Some(&[])), vec![PLACEHOLDER_GENRE]);

        let blanks = vec![" ".to_string(), "".to_string()];
        assert_eq!(default_genres(Some(&blanks)), vec![PLACEHOLDER_GENRE]);

        let genres = vec!["Drama".to_string(), " Crime ".to_string()];
        assert_eq!(default_genres(Some(&genres)), vec!["Drama", "Crime"]);
    }

    #[test]
    fn test_text_or() {
        assert_eq!(text_or(Some(" HBO "), ""), "HBO");
        assert_eq!(text_or(Some(""), "Unknown"), "Unknown");
        assert_eq!(text_or(None, PLACEHOLDER_DESCRIPTION), PLACEHOLDER_DESCRIPTION);
    }
}
