//! Reference instant construction and local wall-clock resolution.
//!
//! The core never reads the system clock. Callers turn their notion of "now"
//! into a `DateTime<Tz>` with [`parse_reference_instant`] (or build one
//! directly with chrono) and pass it explicitly to every computation.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] if the name is not a known IANA zone.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse an RFC 3339 datetime and express it in the given IANA timezone.
///
/// # Examples
///
/// ```
/// use visibility_engine::reference::parse_reference_instant;
///
/// let now = parse_reference_instant("2025-01-01T12:00:00Z", "America/New_York").unwrap();
/// assert_eq!(now.to_rfc3339(), "2025-01-01T07:00:00-05:00");
/// ```
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] if the datetime cannot be parsed,
/// or [`EngineError::InvalidTimezone`] if the timezone is not valid.
pub fn parse_reference_instant(datetime: &str, timezone: &str) -> Result<DateTime<Tz>> {
    let tz = parse_timezone(timezone)?;
    let dt = DateTime::parse_from_rfc3339(datetime.trim())
        .map_err(|e| EngineError::InvalidDatetime(format!("'{}': {}", datetime, e)))?;
    Ok(dt.with_timezone(&tz))
}

/// The current system time in `tz`. Only the orchestration layer and the CLI
/// call this; the evaluator always receives its reference instant.
pub fn system_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Resolve a wall-clock datetime in `tz` to a single instant.
///
/// An ambiguous time (fall-back overlap) resolves to the earlier instant.
/// A time inside a spring-forward gap is moved forward by one hour.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wall(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_timezone_valid() {
        assert_eq!(parse_timezone("Europe/Berlin").unwrap(), Tz::Europe__Berlin);
    }

    #[test]
    fn test_parse_timezone_invalid() {
        let err = parse_timezone("Mars/Olympus").unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_parse_reference_instant_keeps_instant() {
        let now = parse_reference_instant("2026-03-15T14:00:00Z", "Asia/Tokyo").unwrap();
        assert_eq!(now.timestamp(), 1773583200);
        assert_eq!(now.to_rfc3339(), "2026-03-15T23:00:00+09:00");
    }

    #[test]
    fn test_parse_reference_instant_rejects_naive() {
        let err = parse_reference_instant("2026-03-15 14:00:00", "UTC").unwrap_err();
        assert!(matches!(err, EngineError::InvalidDatetime(_)));
    }

    #[test]
    fn test_localize_plain() {
        let dt = localize(&Tz::UTC, wall(2025, 1, 1, 17, 0)).unwrap();
        assert_eq!(dt.timestamp(), 1735750800);
    }

    #[test]
    fn test_localize_gap_shifts_forward() {
        // 2026-03-08 02:30 does not exist in New York; 03:30 EDT is 07:30Z.
        let dt = localize(&Tz::America__New_York, wall(2026, 3, 8, 2, 30)).unwrap();
        assert_eq!(dt.with_timezone(&Utc).to_rfc3339(), "2026-03-08T07:30:00+00:00");
    }

    #[test]
    fn test_localize_overlap_takes_earlier() {
        // 2026-11-01 01:30 happens twice in New York; the EDT one is 05:30Z.
        let dt = localize(&Tz::America__New_York, wall(2026, 11, 1, 1, 30)).unwrap();
        assert_eq!(dt.with_timezone(&Utc).to_rfc3339(), "2026-11-01T05:30:00+00:00");
    }
}
