//! # visibility-engine
//!
//! Deterministic next-transition computation for time-based block visibility.
//!
//! Content blocks may carry date/time visibility rules: absolute start/end
//! dates, seasonal dates that recur every year, weekday sets and daily time
//! intervals. A page cached at the edge does not change by itself when one of
//! those rules flips, so the host needs to know *when* to purge it. This crate
//! computes that instant: the earliest moment, strictly after a caller-supplied
//! "now", at which any enabled rule anywhere in the content changes state.
//!
//! The evaluator is a pure function of its inputs. It never reads the system
//! clock and never fails: malformed rules simply contribute nothing.
//!
//! ## Modules
//!
//! - [`content`]: host block trees (`blockName` / `attrs` / `innerBlocks`)
//! - [`rules`]: typed rule records decoded defensively from block attributes
//! - [`extract`]: collect enabled schedules from a tree in document order
//! - [`transition`]: candidate transitions of one schedule
//! - [`aggregate`]: earliest transition across all schedules
//! - [`reference`]: reference instant and timezone parsing
//! - [`invalidation`]: chained one-shot purge scheduling against a host
//! - [`controls`]: restrict the visibility plugin's settings to date/time controls
//! - [`error`]: error types

pub mod aggregate;
pub mod content;
pub mod controls;
pub mod error;
pub mod extract;
pub mod invalidation;
pub mod reference;
pub mod rules;
pub mod transition;

pub use aggregate::{future_transitions, next_content_transition, next_transition};
pub use content::{parse_blocks, ContentNode};
pub use controls::{restrict_visibility_controls, DISABLED_CONTROLS};
pub use error::EngineError;
pub use extract::extract_schedules;
pub use invalidation::{
    CachePurger, Clock, ContentId, ContentItem, ContentSource, ContentStatus,
    EdgeCacheInvalidator, FixedClock, InMemoryScheduler, SystemClock, WakeupScheduler,
};
pub use reference::{parse_reference_instant, parse_timezone};
pub use rules::{
    ControlSet, DateBoundary, DateRangeRule, RuleSet, ScheduleRecord, TimeInterval,
    TimeOfDayRule, WeekdayRule,
};
pub use transition::candidates;
