//! Roster data model: members, schedules, and the snapshot handed to the engine.
//!
//! The engine is a pure computation over an immutable [`Roster`] snapshot.
//! Loading and persisting that snapshot (and the rotation counters from
//! [`crate::rotation`]) is the collaborating store's job; everything here is
//! `serde`-round-trippable so the store can pick its own format.

use std::collections::BTreeSet;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A person who can be on call. Schedules reference members by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Display name, also the primary sort key for deterministic output.
    pub name: String,
}

/// How a schedule activates, with one of two state-transition policies.
///
/// - `Recurring` is **exclusive**: each fire replaces the whole active set
///   with this schedule ("whoever fired last is on call").
/// - `Ranged` is **additive**: the schedule is active inside its local
///   day-of-week/time-of-day ranges, and ranges from different schedules may
///   overlap and coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleKind {
    /// A cron-style recurrence expression, interpreted in the schedule's zone.
    Recurring { expr: String },
    /// A local time-of-day range on a set of weekdays (0 = Monday .. 6 = Sunday).
    ///
    /// `end == None` means momentary: a start event only, never ends on its own.
    /// `end <= start` means the range rolls over to the next calendar day
    /// (overnight ranges such as 22:00-06:00).
    Ranged {
        start: NaiveTime,
        end: Option<NaiveTime>,
        weekdays: BTreeSet<u8>,
    },
}

/// One on-call schedule owned by a member, anchored to a named time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub member_id: String,
    /// Canonical IANA zone identifier (see [`crate::zone::canonicalize`]).
    pub zone: String,
    #[serde(flatten)]
    pub kind: ScheduleKind,
    /// Inactive schedules produce no events.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Immutable snapshot of members and schedules for one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub members: Vec<Member>,
    pub schedules: Vec<Schedule>,
}

impl Roster {
    pub fn new(members: Vec<Member>, schedules: Vec<Schedule>) -> Self {
        Self { members, schedules }
    }

    /// Look up a member by identifier.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Remove a member and every schedule referencing it (owned relationship:
    /// schedules must not outlive a dangling member reference).
    pub fn remove_member(&mut self, id: &str) {
        self.members.retain(|m| m.id != id);
        self.schedules.retain(|s| s.member_id != id);
    }

    /// Display name for a schedule's owner, falling back to the raw member id
    /// if the roster invariant was violated by the caller.
    pub(crate) fn member_name(&self, member_id: &str) -> String {
        self.member(member_id)
            .map_or_else(|| member_id.to_string(), |m| m.name.clone())
    }
}

/// One entry of an active set as reported to callers: the owning member plus
/// the schedule that put them on call. Sorted by `(member, schedule_id)` for
/// deterministic, reproducible output; the ordering has no semantic effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallEntry {
    pub member: String,
    pub member_id: String,
    pub schedule_id: String,
}

/// Weekday index used by `ScheduleKind::Ranged` (0 = Monday .. 6 = Sunday).
pub(crate) fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}
