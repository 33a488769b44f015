//! Top-level engine operations for the surrounding service.
//!
//! Pure functions over an immutable [`Roster`] snapshot plus a point in time
//! or a window; no I/O, no clock access — the caller supplies `now`. Every
//! operation is total: a broken schedule degrades to a partial result and an
//! empty roster resolves to "nobody on call", never an error.
//!
//! Result types serialize with UTC ISO-8601 instants; the out-of-scope
//! presentation layer can emit them as JSON directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{OnCallEntry, Roster};
use crate::rotation::{self, RotationState};
use crate::simulate;
use crate::timeline::{self, Segment};

/// An upcoming activation: who starts next, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingStart {
    pub on_call: OnCallEntry,
    pub start: DateTime<Utc>,
}

/// Result of [`current_and_next`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentNext {
    /// Currently active entries; empty means nobody is on call.
    pub current: Vec<OnCallEntry>,
    pub composition_started: Option<DateTime<Utc>>,
    /// The next start within the simulator's forward horizon, if any.
    pub next: Option<UpcomingStart>,
}

/// Result of [`current_overlaps`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlaps {
    pub active: Vec<OnCallEntry>,
    pub composition_started: Option<DateTime<Utc>>,
}

/// Result of [`pick_on_call`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallPick {
    /// The selected entry, or `None` when nobody is on call.
    pub on_call: Option<OnCallEntry>,
    pub composition_started: Option<DateTime<Utc>>,
    /// Whether the pick had to rotate among two or more simultaneously
    /// active schedules.
    pub round_robin: bool,
}

/// Who is on call at `now`, and who starts next.
pub fn current_and_next(roster: &Roster, now: DateTime<Utc>) -> CurrentNext {
    let state = simulate::active_at(&roster.schedules, now);
    let next = simulate::next_start_after(&roster.schedules, now).map(|(schedule, start)| {
        UpcomingStart {
            on_call: OnCallEntry {
                member: roster.member_name(&schedule.member_id),
                member_id: schedule.member_id.clone(),
                schedule_id: schedule.id.clone(),
            },
            start,
        }
    });
    CurrentNext {
        current: state.entries(roster),
        composition_started: state.composition_started,
        next,
    }
}

/// The full set of simultaneously active schedules at `now`.
pub fn current_overlaps(roster: &Roster, now: DateTime<Utc>) -> Overlaps {
    let state = simulate::active_at(&roster.schedules, now);
    Overlaps {
        active: state.entries(roster),
        composition_started: state.composition_started,
    }
}

/// The active-set trajectory over `[window_start, window_end)` as contiguous
/// segments.
pub fn timeline(roster: &Roster, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<Segment> {
    timeline::segments(roster, window_start, window_end)
}

/// Resolve who is on call at `now`, rotating deterministically when several
/// schedules are active at once. Mutates `rotation`; the caller persists it.
pub fn pick_on_call(roster: &Roster, rotation: &mut RotationState, now: DateTime<Utc>) -> OnCallPick {
    let state = simulate::active_at(&roster.schedules, now);
    let entries = state.entries(roster);
    match rotation::select(&entries, state.composition_started, rotation) {
        Some((picked, round_robin)) => OnCallPick {
            on_call: Some(picked.clone()),
            composition_started: state.composition_started,
            round_robin,
        },
        // An empty set still carries the instant it emptied (the last end
        // event), mirroring `current_overlaps`.
        None => OnCallPick {
            on_call: None,
            composition_started: state.composition_started,
            round_robin: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, Schedule, ScheduleKind};
    use chrono::{NaiveTime, TimeZone};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn member(id: &str, name: &str) -> Member {
        Member {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn recurring(id: &str, member_id: &str, zone: &str, expr: &str) -> Schedule {
        Schedule {
            id: id.to_string(),
            member_id: member_id.to_string(),
            zone: zone.to_string(),
            kind: ScheduleKind::Recurring {
                expr: expr.to_string(),
            },
            active: true,
            description: None,
        }
    }

    fn ranged(id: &str, member_id: &str, start: (u32, u32), end: (u32, u32), days: &[u8]) -> Schedule {
        Schedule {
            id: id.to_string(),
            member_id: member_id.to_string(),
            zone: "UTC".to_string(),
            kind: ScheduleKind::Ranged {
                start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
                end: NaiveTime::from_hms_opt(end.0, end.1, 0),
                weekdays: days.iter().copied().collect(),
            },
            active: true,
            description: None,
        }
    }

    #[test]
    fn test_current_and_next_for_daily_handoffs() {
        let roster = Roster::new(
            vec![member("m1", "Alice"), member("m2", "Bob")],
            vec![
                recurring("a", "m1", "UTC", "0 9 * * *"),
                recurring("b", "m2", "UTC", "0 21 * * *"),
            ],
        );
        // 10:00: Alice's 09:00 fire owns the shift; Bob is next at 21:00.
        let result = current_and_next(&roster, utc(2026, 3, 16, 10, 0));
        assert_eq!(result.current.len(), 1);
        assert_eq!(result.current[0].member, "Alice");
        assert_eq!(result.composition_started, Some(utc(2026, 3, 16, 9, 0)));

        let next = result.next.unwrap();
        assert_eq!(next.on_call.member, "Bob");
        assert_eq!(next.start, utc(2026, 3, 16, 21, 0));
    }

    #[test]
    fn test_empty_roster_reports_nobody() {
        let roster = Roster::default();
        let result = current_and_next(&roster, utc(2026, 3, 16, 10, 0));
        assert!(result.current.is_empty());
        assert!(result.composition_started.is_none());
        assert!(result.next.is_none());

        let mut rotation = RotationState::new();
        let pick = pick_on_call(&roster, &mut rotation, utc(2026, 3, 16, 10, 0));
        assert!(pick.on_call.is_none());
        assert!(!pick.round_robin);
    }

    #[test]
    fn test_pick_alternates_between_overlapping_members() {
        let roster = Roster::new(
            vec![member("m1", "Alice"), member("m2", "Bob")],
            vec![
                ranged("a", "m1", (9, 0), (17, 0), &[0, 1, 2, 3, 4]),
                ranged("b", "m2", (9, 0), (17, 0), &[0, 1, 2, 3, 4]),
            ],
        );
        let mut rotation = RotationState::new();
        let now = utc(2026, 3, 16, 13, 0);

        let first = pick_on_call(&roster, &mut rotation, now);
        let second = pick_on_call(&roster, &mut rotation, now);
        assert!(first.round_robin);
        assert!(second.round_robin);
        assert_eq!(first.on_call.unwrap().member, "Alice");
        assert_eq!(second.on_call.unwrap().member, "Bob");
    }

    #[test]
    fn test_pick_after_set_empties_reports_composition_start() {
        let roster = Roster::new(
            vec![member("m1", "Alice")],
            vec![ranged("a", "m1", (9, 0), (17, 0), &[0, 1, 2, 3, 4])],
        );
        let mut rotation = RotationState::new();
        // 18:00 Monday: the range ended at 17:00 and nobody is on call, but
        // the composition start records when the set emptied.
        let pick = pick_on_call(&roster, &mut rotation, utc(2026, 3, 16, 18, 0));
        assert!(pick.on_call.is_none());
        assert!(!pick.round_robin);
        assert_eq!(pick.composition_started, Some(utc(2026, 3, 16, 17, 0)));
    }

    #[test]
    fn test_single_active_schedule_skips_rotation() {
        let roster = Roster::new(
            vec![member("m1", "Alice")],
            vec![ranged("a", "m1", (9, 0), (17, 0), &[0, 1, 2, 3, 4])],
        );
        let mut rotation = RotationState::new();
        let pick = pick_on_call(&roster, &mut rotation, utc(2026, 3, 16, 13, 0));
        assert_eq!(pick.on_call.unwrap().member, "Alice");
        assert!(!pick.round_robin);
        assert_eq!(rotation, RotationState::new());
    }

    #[test]
    fn test_member_deletion_cascades_into_resolution() {
        let mut roster = Roster::new(
            vec![member("m1", "Alice"), member("m2", "Bob")],
            vec![
                ranged("a", "m1", (9, 0), (17, 0), &[0, 1, 2, 3, 4]),
                ranged("b", "m2", (10, 0), (11, 0), &[0, 1, 2, 3, 4]),
            ],
        );
        roster.remove_member("m2");

        let result = current_and_next(&roster, utc(2026, 3, 16, 10, 30));
        assert_eq!(result.current.len(), 1);
        assert_eq!(result.current[0].member, "Alice");

        // next_start_after no longer sees Bob's 10:00 start the next day.
        let next = simulate::next_start_after(&roster.schedules, utc(2026, 3, 16, 18, 0)).unwrap();
        assert_eq!(next.0.id, "a");
    }

    #[test]
    fn test_malformed_zone_degrades_to_partial_result() {
        // An invalid zone stored out-of-band must not abort resolution for
        // the healthy schedule.
        let roster = Roster::new(
            vec![member("m1", "Alice"), member("m2", "Bob")],
            vec![
                recurring("bad", "m1", "Mars/OlympusMons", "0 9 * * *"),
                ranged("good", "m2", (9, 0), (17, 0), &[0, 1, 2, 3, 4]),
            ],
        );
        let result = current_and_next(&roster, utc(2026, 3, 16, 10, 0));
        assert_eq!(result.current.len(), 1);
        assert_eq!(result.current[0].member, "Bob");
    }

    #[test]
    fn test_timeline_delegates_with_window_semantics() {
        let roster = Roster::new(
            vec![member("m1", "Alice")],
            vec![ranged("a", "m1", (9, 0), (17, 0), &[0, 1, 2, 3, 4])],
        );
        let segs = timeline(&roster, utc(2026, 3, 16, 8, 0), utc(2026, 3, 16, 18, 0));
        assert_eq!(segs.len(), 3);
        assert!(timeline(&roster, utc(2026, 3, 16, 8, 0), utc(2026, 3, 16, 8, 0)).is_empty());
    }

    #[test]
    fn test_results_serialize_with_iso8601_utc() {
        let roster = Roster::new(
            vec![member("m1", "Alice")],
            vec![recurring("a", "m1", "UTC", "0 9 * * *")],
        );
        let result = current_and_next(&roster, utc(2026, 3, 16, 10, 0));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json["composition_started"],
            serde_json::json!("2026-03-16T09:00:00Z")
        );
        assert_eq!(json["current"][0]["member"], "Alice");
    }
}
