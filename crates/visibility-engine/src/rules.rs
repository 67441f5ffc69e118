//! Typed visibility rule records.
//!
//! Block attributes carry rules as loosely typed JSON:
//!
//! ```json
//! { "blockVisibility": { "controlSets": [ {
//!     "enable": true,
//!     "controls": { "dateTime": { "schedules": [ {
//!         "enable": true,
//!         "start": "2025-12-01T10:00:00",
//!         "end": "2025-12-24T18:00:00",
//!         "isSeasonal": false,
//!         "dayOfWeek": { "enable": true, "days": ["Mon", "Wed"] },
//!         "timeOfDay": { "enable": true, "intervals": [ { "start": "09:00", "end": "17:00" } ] }
//!     } ] } }
//! } ] } }
//! ```
//!
//! They are decoded once into the strict types below. Every decoder yields
//! `None` (or an empty collection) on a shape mismatch instead of failing, and
//! every literal is parsed here so the transition calculator only ever sees
//! typed values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use crate::reference::localize;

// ── Rule types ──────────────────────────────────────────────────────────────

/// All control sets attached to one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub control_sets: Vec<ControlSet>,
}

/// An independently enabled group of visibility controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlSet {
    pub enabled: bool,
    /// The date/time schedules of this set, enabled or not.
    pub schedules: Vec<ScheduleRecord>,
}

/// One date/time visibility rule, the unit of transition computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleRecord {
    pub enabled: bool,
    pub date_range: Option<DateRangeRule>,
    pub weekday: Option<WeekdayRule>,
    pub time_of_day: Option<TimeOfDayRule>,
}

/// Start/end boundaries, optionally recurring every year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRangeRule {
    pub start: Option<DateBoundary>,
    pub end: Option<DateBoundary>,
    /// Ignore the year and recur on the same month/day/time annually.
    pub seasonal: bool,
}

impl DateRangeRule {
    /// The boundaries that parsed, start first.
    pub fn boundaries(&self) -> impl Iterator<Item = &DateBoundary> {
        self.start.iter().chain(self.end.iter())
    }
}

/// A parsed date-time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBoundary {
    /// No offset in the literal; read as wall-clock time in the reference timezone.
    Floating(NaiveDateTime),
    /// Carries an explicit UTC offset.
    Absolute(DateTime<FixedOffset>),
}

impl DateBoundary {
    /// Month/day/time as written, in the boundary's own offset when it has one.
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            DateBoundary::Floating(naive) => *naive,
            DateBoundary::Absolute(dt) => dt.naive_local(),
        }
    }

    /// The instant this boundary denotes when read in `tz`.
    pub fn resolve(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            DateBoundary::Floating(naive) => localize(tz, *naive),
            DateBoundary::Absolute(dt) => Some(dt.with_timezone(tz)),
        }
    }
}

/// Visible on a set of weekdays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeekdayRule {
    pub enabled: bool,
    /// Enabled days in the order first configured, without duplicates.
    pub days: Vec<Weekday>,
}

impl WeekdayRule {
    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

/// Visible during daily clock-time intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeOfDayRule {
    pub enabled: bool,
    pub intervals: Vec<TimeInterval>,
}

/// One daily interval. A boundary that failed to parse is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeInterval {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl TimeInterval {
    pub fn boundaries(&self) -> impl Iterator<Item = NaiveTime> {
        self.start.into_iter().chain(self.end)
    }
}

// ── Decoding ────────────────────────────────────────────────────────────────

impl RuleSet {
    /// Read `blockVisibility.controlSets` from a block's attributes.
    pub fn from_attrs(attrs: &Value) -> Option<Self> {
        let control_sets = attrs
            .get("blockVisibility")?
            .get("controlSets")?
            .as_array()?
            .iter()
            .filter_map(ControlSet::from_json)
            .collect();
        Some(Self { control_sets })
    }
}

impl ControlSet {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let schedules = obj
            .get("controls")
            .and_then(|c| c.get("dateTime"))
            .and_then(|d| d.get("schedules"))
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(ScheduleRecord::from_json).collect())
            .unwrap_or_default();

        Some(Self {
            enabled: obj.get("enable").is_some_and(is_truthy),
            schedules,
        })
    }
}

impl ScheduleRecord {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let start = obj.get("start").and_then(non_empty_str);
        let end = obj.get("end").and_then(non_empty_str);
        let date_range = if start.is_some() || end.is_some() {
            Some(DateRangeRule {
                start: start.and_then(parse_date_boundary),
                end: end.and_then(parse_date_boundary),
                seasonal: obj.get("isSeasonal").is_some_and(is_truthy),
            })
        } else {
            None
        };

        Some(Self {
            enabled: obj.get("enable").is_some_and(is_truthy),
            date_range,
            weekday: obj.get("dayOfWeek").and_then(WeekdayRule::from_json),
            time_of_day: obj.get("timeOfDay").and_then(TimeOfDayRule::from_json),
        })
    }
}

impl WeekdayRule {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut days = Vec::new();
        for day in obj
            .get("days")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter_map(parse_weekday)
        {
            if !days.contains(&day) {
                days.push(day);
            }
        }

        Some(Self {
            enabled: obj.get("enable").is_some_and(is_truthy),
            days,
        })
    }
}

impl TimeOfDayRule {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let intervals = obj
            .get("intervals")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(TimeInterval::from_json).collect())
            .unwrap_or_default();

        Some(Self {
            enabled: obj.get("enable").is_some_and(is_truthy),
            intervals,
        })
    }
}

impl TimeInterval {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            start: obj.get("start").and_then(Value::as_str).and_then(parse_clock_time),
            end: obj.get("end").and_then(Value::as_str).and_then(parse_clock_time),
        })
    }
}

// ── Literal parsing ─────────────────────────────────────────────────────────

/// Loose truthiness of a flag value, as the host format writes flags.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a weekday name (case-insensitive, abbreviated or full).
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Floating formats tried after RFC 3339, most specific first.
const FLOATING_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-time literal: RFC 3339, a floating date-time, or a bare date
/// (floating midnight).
pub fn parse_date_boundary(s: &str) -> Option<DateBoundary> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(DateBoundary::Absolute(dt));
    }
    if let Some(naive) = FLOATING_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(DateBoundary::Floating(naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(DateBoundary::Floating)
}

/// Parse a clock time: `"HH:MM"` or `"HH:MM:SS"`.
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let mut fields = [0u32; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        let part = part.trim();
        if part.is_empty() || part.len() > 2 {
            return None;
        }
        *field = part.parse().ok()?;
    }
    NaiveTime::from_hms_opt(fields[0], fields[1], fields[2])
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    // ── literal parsing ─────────────────────────────────────────────────

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!([0])));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!({})));
    }

    #[test]
    fn test_parse_weekday_forms() {
        assert_eq!(parse_weekday("Mon"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("THU"), Some(Weekday::Thu));
        assert_eq!(parse_weekday("sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("Funday"), None);
    }

    #[test]
    fn test_parse_date_boundary_floating() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            parse_date_boundary("2025-12-01T10:00:00"),
            Some(DateBoundary::Floating(expected))
        );
        assert_eq!(
            parse_date_boundary("2025-12-01 10:00:00"),
            Some(DateBoundary::Floating(expected))
        );
        assert_eq!(
            parse_date_boundary("2025-12-01T10:00"),
            Some(DateBoundary::Floating(expected))
        );
    }

    #[test]
    fn test_parse_date_boundary_bare_date_is_midnight() {
        let b = parse_date_boundary("2025-12-01").unwrap();
        assert_eq!(b.wall_clock().time(), hms(0, 0, 0));
    }

    #[test]
    fn test_parse_date_boundary_absolute() {
        let b = parse_date_boundary("2025-12-01T10:00:00+02:00").unwrap();
        assert!(matches!(b, DateBoundary::Absolute(_)));
        assert_eq!(b.wall_clock().time(), hms(10, 0, 0));
        assert_eq!(b.resolve(&Tz::UTC).unwrap().timestamp(), 1764576000);
    }

    #[test]
    fn test_parse_date_boundary_garbage() {
        assert_eq!(parse_date_boundary("next tuesday-ish"), None);
        assert_eq!(parse_date_boundary("2025-13-01T10:00:00"), None);
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("09:00"), Some(hms(9, 0, 0)));
        assert_eq!(parse_clock_time("17:30:15"), Some(hms(17, 30, 15)));
        assert_eq!(parse_clock_time("7:05"), Some(hms(7, 5, 0)));
        assert_eq!(parse_clock_time("25:00"), None);
        assert_eq!(parse_clock_time("noon"), None);
        assert_eq!(parse_clock_time("09"), None);
        assert_eq!(parse_clock_time("09:00:00:00"), None);
    }

    // ── record decoding ─────────────────────────────────────────────────

    #[test]
    fn test_schedule_record_full() {
        let record = ScheduleRecord::from_json(&json!({
            "enable": true,
            "start": "2025-12-01T10:00:00",
            "end": "bogus",
            "isSeasonal": true,
            "dayOfWeek": { "enable": true, "days": ["Mon", "Wed", "Mon", "Xyz"] },
            "timeOfDay": {
                "enable": false,
                "intervals": [ { "start": "09:00", "end": "late" }, "junk" ]
            }
        }))
        .unwrap();

        assert!(record.enabled);
        let range = record.date_range.unwrap();
        assert!(range.seasonal);
        assert!(range.start.is_some());
        assert!(range.end.is_none());
        assert_eq!(range.boundaries().count(), 1);

        let weekday = record.weekday.unwrap();
        assert!(weekday.enabled);
        assert_eq!(weekday.days, vec![Weekday::Mon, Weekday::Wed]);

        let tod = record.time_of_day.unwrap();
        assert!(!tod.enabled);
        assert_eq!(tod.intervals.len(), 1);
        assert_eq!(tod.intervals[0].start, Some(hms(9, 0, 0)));
        assert_eq!(tod.intervals[0].end, None);
    }

    #[test]
    fn test_schedule_record_without_dates_has_no_range() {
        let record = ScheduleRecord::from_json(&json!({ "enable": true, "start": "" })).unwrap();
        assert!(record.date_range.is_none());
    }

    #[test]
    fn test_schedule_record_wrong_shapes() {
        let record = ScheduleRecord::from_json(&json!({
            "enable": "1",
            "start": 20251201,
            "dayOfWeek": ["Mon"],
            "timeOfDay": { "enable": true, "intervals": "09:00-17:00" }
        }))
        .unwrap();
        assert!(record.enabled);
        assert!(record.date_range.is_none());
        assert!(record.weekday.is_none());
        assert!(record.time_of_day.unwrap().intervals.is_empty());

        assert!(ScheduleRecord::from_json(&json!("schedule")).is_none());
    }

    #[test]
    fn test_rule_set_from_attrs() {
        let attrs = json!({
            "blockVisibility": {
                "controlSets": [
                    {
                        "enable": true,
                        "controls": { "dateTime": { "schedules": [ { "enable": true } ] } }
                    },
                    { "enable": false },
                    "not a control set"
                ]
            }
        });
        let rules = RuleSet::from_attrs(&attrs).unwrap();
        assert_eq!(rules.control_sets.len(), 2);
        assert!(rules.control_sets[0].enabled);
        assert_eq!(rules.control_sets[0].schedules.len(), 1);
        assert!(!rules.control_sets[1].enabled);
        assert!(rules.control_sets[1].schedules.is_empty());
    }

    #[test]
    fn test_rule_set_absent() {
        assert!(RuleSet::from_attrs(&json!({ "className": "x" })).is_none());
        assert!(RuleSet::from_attrs(&json!({ "blockVisibility": { "controlSets": {} } })).is_none());
        assert!(RuleSet::from_attrs(&Value::Null).is_none());
    }
}
