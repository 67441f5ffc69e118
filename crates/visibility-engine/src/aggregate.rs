//! Merge candidates across records into the next transition.

use std::collections::BTreeSet;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::content::ContentNode;
use crate::extract::extract_schedules;
use crate::rules::ScheduleRecord;
use crate::transition::candidates;

/// Every future transition implied by `records`, deduplicated and ascending.
pub fn future_transitions(records: &[ScheduleRecord], now: &DateTime<Tz>) -> Vec<i64> {
    records
        .iter()
        .flat_map(|record| candidates(record, now))
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect()
}

/// The earliest future transition implied by any of `records`, or `None`
/// when no rule predicts a change.
///
/// The result, when present, is strictly greater than `now.timestamp()`.
pub fn next_transition(records: &[ScheduleRecord], now: &DateTime<Tz>) -> Option<i64> {
    records
        .iter()
        .filter_map(|record| candidates(record, now).first().copied())
        .min()
}

/// The earliest future transition of a content tree: extraction followed by
/// [`next_transition`].
///
/// # Examples
///
/// ```
/// use visibility_engine::content::parse_blocks;
/// use visibility_engine::next_content_transition;
/// use visibility_engine::reference::parse_reference_instant;
///
/// let blocks = parse_blocks(r#"[{
///     "blockName": "core/group",
///     "attrs": { "blockVisibility": { "controlSets": [ {
///         "enable": true,
///         "controls": { "dateTime": { "schedules": [
///             { "enable": true, "start": "2025-01-02 12:00:00", "end": "2025-01-01 10:00:00" }
///         ] } }
///     } ] } },
///     "innerBlocks": []
/// }]"#)
/// .unwrap();
/// let now = parse_reference_instant("2025-01-01T12:00:00Z", "UTC").unwrap();
///
/// assert_eq!(next_content_transition(&blocks, &now), Some(1735819200));
/// ```
pub fn next_content_transition(blocks: &[ContentNode], now: &DateTime<Tz>) -> Option<i64> {
    next_transition(&extract_schedules(blocks), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn record(value: serde_json::Value) -> ScheduleRecord {
        ScheduleRecord::from_json(&value).unwrap()
    }

    #[test]
    fn test_no_records() {
        assert_eq!(next_transition(&[], &utc(2025, 1, 1, 0)), None);
        assert!(future_transitions(&[], &utc(2025, 1, 1, 0)).is_empty());
    }

    #[test]
    fn test_only_past_boundaries() {
        let records = vec![record(json!({ "enable": true, "start": "2020-01-01", "end": "2021-01-01" }))];
        assert_eq!(next_transition(&records, &utc(2025, 1, 1, 0)), None);
    }

    #[test]
    fn test_union_picks_smallest_across_records() {
        // Monday 2025-01-06 noon: the weekday rule flips at Tuesday midnight,
        // before the date boundary on Thursday.
        let now = utc(2025, 1, 6, 12);
        let records = vec![
            record(json!({ "enable": true, "start": "2025-01-09 00:00:00" })),
            record(json!({
                "enable": true,
                "dayOfWeek": { "enable": true, "days": ["Mon", "Wed"] }
            })),
        ];
        assert_eq!(next_transition(&records, &now), Some(utc(2025, 1, 7, 0).timestamp()));

        // Swapping the order changes nothing.
        let reversed: Vec<ScheduleRecord> = records.into_iter().rev().collect();
        assert_eq!(next_transition(&reversed, &now), Some(utc(2025, 1, 7, 0).timestamp()));
    }

    #[test]
    fn test_future_transitions_deduplicated_sorted() {
        let now = utc(2025, 1, 1, 0);
        let records = vec![
            record(json!({ "enable": true, "start": "2025-03-01", "end": "2025-02-01" })),
            record(json!({ "enable": true, "start": "2025-02-01" })),
        ];
        assert_eq!(
            future_transitions(&records, &now),
            vec![utc(2025, 2, 1, 0).timestamp(), utc(2025, 3, 1, 0).timestamp()]
        );
    }

    #[test]
    fn test_next_matches_first_of_future() {
        let now = utc(2025, 1, 1, 10);
        let records = vec![
            record(json!({
                "enable": true,
                "timeOfDay": { "enable": true, "intervals": [ { "start": "09:00:00", "end": "17:00:00" } ] }
            })),
            record(json!({ "enable": true, "isSeasonal": true, "start": "2019-06-01 00:00:00" })),
        ];
        let all = future_transitions(&records, &now);
        assert_eq!(next_transition(&records, &now), all.first().copied());
        assert_eq!(all[0], utc(2025, 1, 1, 17).timestamp());
    }

    #[test]
    fn test_next_content_transition_nested() {
        let now = utc(2025, 1, 1, 12);
        let schedule_attrs = json!({ "blockVisibility": { "controlSets": [ {
            "enable": true,
            "controls": { "dateTime": { "schedules": [ { "enable": true, "end": "2025-01-01 18:00:00" } ] } }
        } ] } });
        let tree = ContentNode::new("core/group").with_child(
            ContentNode::new("core/column")
                .with_child(ContentNode::new("core/paragraph").with_attrs(schedule_attrs)),
        );
        assert_eq!(
            next_content_transition(&[tree], &now),
            Some(utc(2025, 1, 1, 18).timestamp())
        );
    }
}
