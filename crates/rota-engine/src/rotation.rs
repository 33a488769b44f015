//! Round-robin selection among simultaneously active schedules.
//!
//! Rotation state is an explicit object threaded through selection and
//! persisted by the caller between requests — no process-wide singleton.
//! Counters are scoped by a *group key* derived from the sorted active
//! schedule identifiers plus the composition start instant, so rotation
//! restarts fresh whenever the overlapping set's membership or start time
//! changes, and a stale index can never leak across unrelated overlap
//! periods.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::OnCallEntry;

/// Persistent rotation counters, keyed by overlap group. Serde
/// round-trippable; the collaborating store must save it atomically between
/// requests (read-modify-write).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    counters: BTreeMap<String, usize>,
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Pick one entry from an active set, rotating on each invocation.
///
/// `entries` must be in the stable `(member, schedule_id)` order shared with
/// segment output; the rotation index points into that order.
///
/// - Empty set: `None` (nobody on call — a valid state, not an error).
/// - Exactly one entry: returned directly, no state mutation, no rotation.
/// - Two or more: advance `(last + 1) % n` under the group key, persist the
///   new index, and report that rotation engaged.
///
/// Counters for other (dead) group keys are dropped on the way: state lives
/// exactly as long as its composition persists.
pub fn select<'a>(
    entries: &'a [OnCallEntry],
    composition_started: Option<DateTime<Utc>>,
    state: &mut RotationState,
) -> Option<(&'a OnCallEntry, bool)> {
    match entries {
        [] => None,
        [only] => Some((only, false)),
        _ => {
            let key = group_key(entries, composition_started);
            let index = state
                .counters
                .get(&key)
                .map_or(0, |last| (last + 1) % entries.len());
            state.counters.retain(|k, _| *k == key);
            state.counters.insert(key, index);
            Some((&entries[index], true))
        }
    }
}

fn group_key(entries: &[OnCallEntry], composition_started: Option<DateTime<Utc>>) -> String {
    let mut ids: Vec<&str> = entries.iter().map(|e| e.schedule_id.as_str()).collect();
    ids.sort_unstable();
    let started = composition_started.map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
    format!("{}@{}", ids.join("+"), started)
}
