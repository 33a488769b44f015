//! Event projection and chronological merging.
//!
//! Fans out to the recurrence and range projectors for every active schedule
//! and returns one stable-sorted stream of start/end events for a window.
//! A single broken schedule (bad stored zone, degenerate expression) is
//! skipped with a warning — it must never abort resolution for the rest.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::model::{Schedule, ScheduleKind};
use crate::{ranges, recurrence, zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    End,
}

/// A transient activation boundary, computed on demand and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    pub at: DateTime<Utc>,
    pub kind: EventKind,
    pub schedule: &'a Schedule,
}

/// Project and merge all events relevant to `[window.0, window.1)` into one
/// chronological stream.
///
/// Inactive schedules are filtered out. Events at the same instant keep the
/// input's relative schedule order; callers must not depend on tie order,
/// only on time ordering.
pub fn merge<'a>(schedules: &'a [Schedule], window: (DateTime<Utc>, DateTime<Utc>)) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    for schedule in schedules.iter().filter(|s| s.active) {
        if let Err(e) = project_into(schedule, window, &mut events) {
            warn!(schedule = %schedule.id, error = %e, "skipping schedule during event merge");
        }
    }
    events.sort_by_key(|e| e.at);
    debug!(count = events.len(), "merged schedule events");
    events
}

fn project_into<'a>(
    schedule: &'a Schedule,
    window: (DateTime<Utc>, DateTime<Utc>),
    events: &mut Vec<Event<'a>>,
) -> crate::error::Result<()> {
    let tz = zone::canonicalize(&schedule.zone)?;
    match &schedule.kind {
        ScheduleKind::Recurring { expr } => {
            for at in recurrence::project(expr, tz, window)? {
                events.push(Event {
                    at,
                    kind: EventKind::Start,
                    schedule,
                });
            }
        }
        ScheduleKind::Ranged {
            start,
            end,
            weekdays,
        } => {
            for (start_at, end_at) in ranges::project(*start, *end, weekdays, tz, window) {
                events.push(Event {
                    at: start_at,
                    kind: EventKind::Start,
                    schedule,
                });
                if let Some(end_at) = end_at {
                    events.push(Event {
                        at: end_at,
                        kind: EventKind::End,
                        schedule,
                    });
                }
            }
        }
    }
    Ok(())
}
