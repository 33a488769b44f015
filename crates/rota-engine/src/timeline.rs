//! Timeline segmentation: an active-set trajectory as contiguous segments.
//!
//! A window `[start, end)` is tiled by half-open segments, each carrying the
//! active set valid throughout it. Segments are exhaustive and
//! non-overlapping: the first starts at the window start, the last ends at
//! the window end, and adjacent segments share a boundary. Boundaries at
//! identical instants collapse, so zero-width segments are never emitted.
//!
//! Adjacent segments with identical active sets are *not* merged across a
//! sub-window boundary: splitting a window in two and concatenating the
//! results yields the same segments as the combined window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events;
use crate::model::{OnCallEntry, Roster};
use crate::simulate;

/// A half-open UTC interval `[start, end)` with the set active throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Active entries in stable `(member, schedule_id)` order.
    pub active: Vec<OnCallEntry>,
}

/// Segment the window `[start, end)`. Degenerate windows yield no segments.
pub fn segments(roster: &Roster, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Segment> {
    if end <= start {
        return Vec::new();
    }

    // Events at exactly `start` fold into the initial state rather than
    // opening a boundary (the `e.at > start` filter below). The merge window
    // itself must open at `start`, not after it: the range projector drops an
    // occurrence whose end falls at or before the merge window's start, and
    // an end just after `start` is a real boundary.
    let mut state = simulate::active_at(&roster.schedules, start);
    let boundary_events: Vec<_> = events::merge(&roster.schedules, (start, end))
        .into_iter()
        .filter(|e| e.at > start && e.at < end)
        .collect();

    let mut segments = Vec::new();
    let mut cursor = start;
    let mut i = 0;
    while i < boundary_events.len() {
        let at = boundary_events[i].at;
        if at > cursor {
            segments.push(Segment {
                start: cursor,
                end: at,
                active: state.entries(roster),
            });
            cursor = at;
        }
        // Apply every event at this instant before the next segment opens.
        while i < boundary_events.len() && boundary_events[i].at == at {
            state.apply(&boundary_events[i]);
            i += 1;
        }
    }
    segments.push(Segment {
        start: cursor,
        end,
        active: state.entries(roster),
    });
    segments
}
