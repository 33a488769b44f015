//! Active-set simulation: replaying merged events to answer "who is on call".
//!
//! Two activation models coexist, keyed off the owning schedule's kind:
//!
//! - **Exclusive** (recurring): a start replaces the entire active set with
//!   the firing schedule and resets the composition start to the fire
//!   instant. Whoever fired last is on call until somebody else fires.
//! - **Additive** (ranged): a start inserts into the set, an end removes;
//!   ranges from different schedules overlap and coexist. The composition
//!   start moves only when membership actually changes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::events::{self, Event, EventKind};
use crate::model::{OnCallEntry, Roster, Schedule, ScheduleKind};
use crate::{recurrence, zone};

/// Base lookback for state replay. Wide enough that any weekly day-of-week
/// pattern has at least one boundary inside the window; sparse recurrences
/// extend it further via [`recurrence::last_fire_at_or_before`].
pub const SIM_LOOKBACK_DAYS: i64 = 8;

/// Forward horizon for [`next_start_after`]. Nothing firing within it is a
/// valid terminal state, not an error.
pub const NEXT_START_HORIZON_DAYS: i64 = 7;

/// The state-transition policy a schedule's events follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Exclusive,
    Additive,
}

impl Activation {
    pub fn for_kind(kind: &ScheduleKind) -> Self {
        match kind {
            ScheduleKind::Recurring { .. } => Activation::Exclusive,
            ScheduleKind::Ranged { .. } => Activation::Additive,
        }
    }
}

/// The set of schedules currently on, plus the instant its exact composition
/// last changed.
#[derive(Debug, Clone, Default)]
pub struct ActiveState<'a> {
    active: BTreeMap<&'a str, &'a Schedule>,
    pub composition_started: Option<DateTime<Utc>>,
}

impl<'a> ActiveState<'a> {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn contains(&self, schedule_id: &str) -> bool {
        self.active.contains_key(schedule_id)
    }

    pub fn schedules(&self) -> impl Iterator<Item = &'a Schedule> + '_ {
        self.active.values().copied()
    }

    /// Sorted schedule identifiers, the basis of the rotation group key.
    pub fn schedule_ids(&self) -> Vec<&'a str> {
        self.active.keys().copied().collect()
    }

    /// Active entries with member names resolved, in the stable
    /// `(member, schedule_id)` output order.
    pub fn entries(&self, roster: &Roster) -> Vec<OnCallEntry> {
        let mut entries: Vec<OnCallEntry> = self
            .schedules()
            .map(|s| OnCallEntry {
                member: roster.member_name(&s.member_id),
                member_id: s.member_id.clone(),
                schedule_id: s.id.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.member.as_str(), a.schedule_id.as_str()).cmp(&(b.member.as_str(), b.schedule_id.as_str()))
        });
        entries
    }

    /// Apply one event under its schedule's activation model.
    pub fn apply(&mut self, event: &Event<'a>) {
        let id = event.schedule.id.as_str();
        match (Activation::for_kind(&event.schedule.kind), event.kind) {
            (Activation::Exclusive, EventKind::Start) => {
                self.active.clear();
                self.active.insert(id, event.schedule);
                self.composition_started = Some(event.at);
            }
            // Recurring schedules never emit end events.
            (Activation::Exclusive, EventKind::End) => {}
            (Activation::Additive, EventKind::Start) => {
                if self.active.insert(id, event.schedule).is_none() {
                    self.composition_started = Some(event.at);
                }
            }
            (Activation::Additive, EventKind::End) => {
                if self.active.remove(id).is_some() {
                    self.composition_started = Some(event.at);
                }
            }
        }
    }
}

/// Replay all events at or before `at` and return the resulting state.
///
/// The replay window reaches back [`SIM_LOOKBACK_DAYS`], extended per sparse
/// recurring schedule so that a recurrence active at `at` whose last fire
/// predates the base window is still discovered.
pub fn active_at<'a>(schedules: &'a [Schedule], at: DateTime<Utc>) -> ActiveState<'a> {
    let mut window_start = at - Duration::days(SIM_LOOKBACK_DAYS);
    for schedule in schedules.iter().filter(|s| s.active) {
        if let ScheduleKind::Recurring { expr } = &schedule.kind {
            match last_recurring_fire(schedule, expr, at) {
                Ok(Some(fire)) => window_start = window_start.min(fire),
                Ok(None) => {}
                Err(e) => {
                    // The merge pass will skip (and re-log) this schedule.
                    warn!(schedule = %schedule.id, error = %e, "skipping schedule during replay");
                }
            }
        }
    }

    let events = events::merge(schedules, (window_start, at + Duration::seconds(1)));
    let mut state = ActiveState::default();
    for event in events.iter().filter(|e| e.at <= at) {
        state.apply(event);
    }
    debug!(at = %at, active = state.len(), "replayed active set");
    state
}

fn last_recurring_fire(
    schedule: &Schedule,
    expr: &str,
    at: DateTime<Utc>,
) -> crate::error::Result<Option<DateTime<Utc>>> {
    let tz = zone::canonicalize(&schedule.zone)?;
    recurrence::last_fire_at_or_before(expr, tz, at)
}

/// The first start event strictly after `at` within
/// [`NEXT_START_HORIZON_DAYS`], with its owning schedule.
pub fn next_start_after<'a>(
    schedules: &'a [Schedule],
    at: DateTime<Utc>,
) -> Option<(&'a Schedule, DateTime<Utc>)> {
    let window = (
        at + Duration::seconds(1),
        at + Duration::days(NEXT_START_HORIZON_DAYS),
    );
    events::merge(schedules, window)
        .into_iter()
        .find(|e| e.kind == EventKind::Start && e.at > at)
        .map(|e| (e.schedule, e.at))
}
