//! Candidate transition instants for a single schedule record.
//!
//! A transition is an instant at which a rule's visible/hidden state flips.
//! Each enabled sub-rule of a [`ScheduleRecord`] proposes its own candidates
//! independently; they are unioned, never intersected:
//!
//! - **Date boundary**: `start` and `end` are two one-off events.
//! - **Seasonal boundary**: `start`/`end` with the year replaced by the
//!   reference year, advanced one year once that has passed.
//! - **Weekday**: local midnight of the first upcoming day whose membership
//!   in the enabled set differs from today's.
//! - **Time of day**: every interval boundary, today and tomorrow.
//!
//! Every candidate is strictly after `now`. All functions take `now`
//! explicitly and resolve wall-clock times in `now`'s timezone.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use crate::reference::localize;
use crate::rules::{DateBoundary, DateRangeRule, ScheduleRecord, TimeInterval, WeekdayRule};

/// All candidate transitions of `record` after `now`, as Unix timestamps.
///
/// A disabled record yields nothing. Sub-rules with their own `enabled` flag
/// (weekday, time of day) contribute only when that flag is set too.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use visibility_engine::reference::parse_reference_instant;
/// use visibility_engine::rules::ScheduleRecord;
/// use visibility_engine::transition::candidates;
///
/// let record = ScheduleRecord::from_json(&json!({
///     "enable": true,
///     "timeOfDay": { "enable": true, "intervals": [ { "start": "09:00", "end": "17:00" } ] }
/// }))
/// .unwrap();
/// let now = parse_reference_instant("2025-01-01T10:00:00Z", "UTC").unwrap();
///
/// // 17:00 today, then 09:00 and 17:00 tomorrow.
/// let found: Vec<i64> = candidates(&record, &now).into_iter().collect();
/// assert_eq!(found, vec![1735750800, 1735808400, 1735837200]);
/// ```
pub fn candidates(record: &ScheduleRecord, now: &DateTime<Tz>) -> BTreeSet<i64> {
    let mut found = BTreeSet::new();
    if !record.enabled {
        return found;
    }

    if let Some(tod) = record.time_of_day.as_ref().filter(|t| t.enabled) {
        found.extend(time_of_day_transitions(&tod.intervals, now));
    }
    if let Some(weekday) = record.weekday.as_ref().filter(|w| w.enabled) {
        found.extend(weekday_transition(weekday, now));
    }
    if let Some(range) = &record.date_range {
        found.extend(date_range_transitions(range, now));
    }

    found
}

// ── Date ranges ─────────────────────────────────────────────────────────────

/// Candidates from a range's start and end, each treated as a lone event.
pub fn date_range_transitions(range: &DateRangeRule, now: &DateTime<Tz>) -> Vec<i64> {
    range
        .boundaries()
        .filter_map(|boundary| {
            if range.seasonal {
                seasonal_transition(boundary, now)
            } else {
                boundary_transition(boundary, now)
            }
        })
        .collect()
}

/// The boundary itself, if it lies strictly after `now`.
pub fn boundary_transition(boundary: &DateBoundary, now: &DateTime<Tz>) -> Option<i64> {
    boundary
        .resolve(&now.timezone())
        .filter(|dt| dt > now)
        .map(|dt| dt.timestamp())
}

/// The next yearly occurrence of the boundary's month, day and time of day.
///
/// Projected onto `now`'s year first; if that is not strictly later than
/// `now`, that projection advanced by one year. February 29 becomes March 1
/// in common years, so a leap-day anchor that rolled over keeps March 1 in
/// the following year.
pub fn seasonal_transition(boundary: &DateBoundary, now: &DateTime<Tz>) -> Option<i64> {
    let tz = now.timezone();
    let projected = project_onto_year(boundary.wall_clock(), now.year())?;

    let this_year = localize(&tz, projected);
    if let Some(dt) = this_year.filter(|dt| dt > now) {
        return Some(dt.timestamp());
    }

    // Advance the resolved wall clock, including any gap shift.
    let base = this_year.map_or(projected, |dt| dt.naive_local());
    project_onto_year(base, base.year() + 1)
        .and_then(|naive| localize(&tz, naive))
        .filter(|dt| dt > now)
        .map(|dt| dt.timestamp())
}

fn project_onto_year(wall: NaiveDateTime, year: i32) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, wall.month(), wall.day()).or_else(|| {
        // Day past the end of the month (Feb 29): overflow into the next month.
        NaiveDate::from_ymd_opt(year, wall.month(), 1)?
            .checked_add_days(Days::new(u64::from(wall.day() - 1)))
    })?;
    Some(date.and_time(wall.time()))
}

// ── Weekdays ────────────────────────────────────────────────────────────────

/// Midnight of the first day, from tomorrow through a week ahead, whose
/// membership in `rule.days` differs from today's.
///
/// `None` when the enabled set is empty or covers the whole week: the state
/// never flips.
pub fn weekday_transition(rule: &WeekdayRule, now: &DateTime<Tz>) -> Option<i64> {
    if rule.days.is_empty() {
        return None;
    }

    let today = now.date_naive();
    let shown_today = rule.contains(now.weekday());

    let flip_day = (1..=7u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .find(|day| rule.contains(day.weekday()) != shown_today)?;

    localize(&now.timezone(), flip_day.and_hms_opt(0, 0, 0)?)
        .filter(|dt| dt > now)
        .map(|dt| dt.timestamp())
}

// ── Time of day ─────────────────────────────────────────────────────────────

/// Every interval boundary, on today's and tomorrow's date, strictly after
/// `now`. Intervals may overlap or come in any order.
pub fn time_of_day_transitions(intervals: &[TimeInterval], now: &DateTime<Tz>) -> Vec<i64> {
    let tz = now.timezone();
    let today = now.date_naive();

    [today, today.succ_opt().unwrap_or(today)]
        .into_iter()
        .flat_map(|day| {
            intervals
                .iter()
                .flat_map(TimeInterval::boundaries)
                .map(move |time| day.and_time(time))
        })
        .filter_map(|naive| localize(&tz, naive))
        .filter(|dt| dt > now)
        .map(|dt| dt.timestamp())
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────
