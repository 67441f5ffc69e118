//! Chained edge-cache purges driven by visibility transitions.
//!
//! The evaluator answers one question: when does this content next change?
//! This module turns the answer into a chain of one-shot wake-ups against a
//! host's job scheduler:
//!
//! - content becomes published: cancel its wake-ups, schedule the next one;
//! - content leaves the published state: cancel its wake-ups;
//! - a wake-up fires: purge the cached copy, then schedule the next one;
//! - content is deleted: cancel its wake-ups.
//!
//! The host plugs in through four small traits: [`ContentSource`],
//! [`WakeupScheduler`], [`CachePurger`] and [`Clock`].

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::str::FromStr;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::aggregate::next_transition;
use crate::content::ContentNode;
use crate::extract::extract_schedules;
use crate::reference::system_now;

/// Host identifier of a content item.
pub type ContentId = u64;

/// Publication status of a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentStatus {
    Published,
    Draft,
    Pending,
    Private,
    /// Publication scheduled for a later date.
    Scheduled,
    Trash,
    Other(String),
}

impl ContentStatus {
    /// Whether cached copies of the content are served to visitors.
    pub fn is_live(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

impl FromStr for ContentStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "publish" => ContentStatus::Published,
            "draft" | "auto-draft" => ContentStatus::Draft,
            "pending" => ContentStatus::Pending,
            "private" => ContentStatus::Private,
            "future" => ContentStatus::Scheduled,
            "trash" => ContentStatus::Trash,
            other => ContentStatus::Other(other.to_string()),
        })
    }
}

/// A content item as loaded from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub id: ContentId,
    pub status: ContentStatus,
    pub blocks: Vec<ContentNode>,
}

// ── Host collaborators ──────────────────────────────────────────────────────

/// Loads the current snapshot of a content item.
pub trait ContentSource {
    fn load(&self, id: ContentId) -> Option<ContentItem>;
}

/// A keyed single-shot timer.
pub trait WakeupScheduler {
    /// Arrange one wake-up for `id` at Unix timestamp `at`.
    fn schedule_once(&mut self, at: i64, id: ContentId);

    /// Cancel every pending wake-up for `id`, returning how many there were.
    fn cancel_all(&mut self, id: ContentId) -> usize;
}

/// Drops cached copies of a content item.
pub trait CachePurger {
    fn purge(&mut self, id: ContentId);

    /// Called once a scheduled purge of `id` has completed, so listeners
    /// can react. Does nothing by default.
    fn purged(&mut self, _id: ContentId) {}
}

/// Source of the reference instant for re-evaluation.
pub trait Clock {
    fn now(&self) -> DateTime<Tz>;
}

/// The system clock, expressed in a configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    pub timezone: Tz,
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        system_now(self.timezone)
    }
}

/// A clock pinned to one instant; move it with [`FixedClock::set`].
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Tz>) -> Self {
        Self { instant }
    }

    pub fn set(&mut self, instant: DateTime<Tz>) {
        self.instant = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.instant
    }
}

// ── In-memory scheduler ─────────────────────────────────────────────────────

/// A [`WakeupScheduler`] that keeps pending wake-ups in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduler {
    pending: BTreeMap<ContentId, BTreeSet<i64>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending wake-ups for `id`, ascending.
    pub fn pending(&self, id: ContentId) -> Vec<i64> {
        self.pending
            .get(&id)
            .map(|times| times.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of pending wake-ups.
    pub fn len(&self) -> usize {
        self.pending.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every wake-up due at or before `until`, in firing
    /// order (by time, then content id).
    pub fn take_due(&mut self, until: i64) -> Vec<(i64, ContentId)> {
        let mut due = Vec::new();
        for (&id, times) in self.pending.iter_mut() {
            let later = match until.checked_add(1) {
                Some(after) => times.split_off(&after),
                None => BTreeSet::new(),
            };
            due.extend(times.iter().map(|&at| (at, id)));
            *times = later;
        }
        self.pending.retain(|_, times| !times.is_empty());
        due.sort_unstable();
        due
    }
}

impl WakeupScheduler for InMemoryScheduler {
    fn schedule_once(&mut self, at: i64, id: ContentId) {
        self.pending.entry(id).or_default().insert(at);
    }

    fn cancel_all(&mut self, id: ContentId) -> usize {
        self.pending.remove(&id).map_or(0, |times| times.len())
    }
}

// ── Orchestration ───────────────────────────────────────────────────────────

/// Keeps exactly one pending wake-up per published content item that has
/// active date/time rules, and re-arms it every time it fires.
#[derive(Debug)]
pub struct EdgeCacheInvalidator<S, W, P, C> {
    source: S,
    scheduler: W,
    purger: P,
    clock: C,
}

impl<S, W, P, C> EdgeCacheInvalidator<S, W, P, C>
where
    S: ContentSource,
    W: WakeupScheduler,
    P: CachePurger,
    C: Clock,
{
    pub fn new(source: S, scheduler: W, purger: P, clock: C) -> Self {
        Self {
            source,
            scheduler,
            purger,
            clock,
        }
    }

    /// React to a status change of content `id`.
    ///
    /// Stale wake-ups are always cancelled. A new one is scheduled only when
    /// the new status is published. Returns the scheduled instant, if any.
    pub fn on_status_transition(&mut self, new_status: &ContentStatus, id: ContentId) -> Option<i64> {
        let cancelled = self.scheduler.cancel_all(id);
        debug!(content_id = id, cancelled, status = ?new_status, "cleared pending wake-ups");

        if !new_status.is_live() {
            return None;
        }
        self.schedule_next(id)
    }

    /// A wake-up for `id` fired: purge, then chain to the next transition.
    pub fn on_wakeup(&mut self, id: ContentId) -> Option<i64> {
        self.purger.purge(id);
        info!(content_id = id, "purged edge cache");
        self.purger.purged(id);
        self.schedule_next(id)
    }

    /// Content `id` was permanently deleted.
    pub fn on_delete(&mut self, id: ContentId) {
        let cancelled = self.scheduler.cancel_all(id);
        debug!(content_id = id, cancelled, "content deleted, cleared pending wake-ups");
    }

    /// Schedule the next wake-up for `id` from a fresh snapshot and a fresh
    /// "now". Nothing is scheduled for unpublished content, content without
    /// enabled date/time rules, or rules that predict no further change.
    pub fn schedule_next(&mut self, id: ContentId) -> Option<i64> {
        let item = self.source.load(id)?;
        if !item.status.is_live() {
            return None;
        }

        let schedules = extract_schedules(&item.blocks);
        if schedules.is_empty() {
            return None;
        }

        let now = self.clock.now();
        let at = next_transition(&schedules, &now)?;
        self.scheduler.schedule_once(at, id);
        info!(content_id = id, at, schedules = schedules.len(), "scheduled wake-up");
        Some(at)
    }

    pub fn scheduler(&self) -> &W {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut W {
        &mut self.scheduler
    }

    pub fn purger(&self) -> &P {
        &self.purger
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
