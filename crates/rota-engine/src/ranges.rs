//! Day-of-week / time-of-day range projection.
//!
//! A ranged schedule is active between a local start time and an optional
//! local end time on a set of weekdays. Projection walks local calendar days
//! and emits paired `(start, end)` UTC instants; when the end time is at or
//! before the start time the range rolls over to the next calendar day
//! (overnight ranges such as 22:00-06:00). A range with no end time is
//! momentary: it produces a start instant only and never ends on its own.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, RotaError};
use crate::model::weekday_index;

/// Days walked before the window start so that a range which began shortly
/// before the window but is still open at the window start is discovered.
pub const RANGE_LOOKBACK_DAYS: i64 = 2;

/// Parse an `HH:MM` (or `HH:MM:SS`) local time of day.
///
/// A schedule-creation-time validation helper; stored schedules are assumed
/// pre-validated.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| RotaError::InvalidTimeOfDay(format!("'{s}': {e}")))
}

/// A projected occurrence of a range: the UTC start, and the UTC end unless
/// the range is momentary or its end falls outside the admitted window.
pub type RangeOccurrence = (DateTime<Utc>, Option<DateTime<Utc>>);

/// Project range occurrences relevant to `[window.0, window.1)`.
///
/// For every local calendar day with a matching weekday from
/// [`RANGE_LOOKBACK_DAYS`] before the window through its end:
///
/// - occurrences that completed at or before the window start are dropped
///   entirely (a lookback start without its end would otherwise read as
///   still active);
/// - a start is emitted when it falls before the window end (starts inside
///   the lookback are kept so simulation can observe ranges already open);
/// - an end is emitted when it falls within `(window.0, window.1]`.
///
/// Local times erased by a DST gap shift forward one hour; a day with no
/// valid mapping at all is skipped.
pub fn project(
    start: NaiveTime,
    end: Option<NaiveTime>,
    weekdays: &BTreeSet<u8>,
    tz: Tz,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> Vec<RangeOccurrence> {
    let first_day = (window.0 - Duration::days(RANGE_LOOKBACK_DAYS))
        .with_timezone(&tz)
        .date_naive();
    let last_day = window.1.with_timezone(&tz).date_naive();

    let mut occurrences = Vec::new();
    let mut day = first_day;
    while day <= last_day {
        if weekdays.contains(&weekday_index(day.weekday())) {
            if let Some(occ) = occurrence_for_day(day, start, end, tz, window) {
                occurrences.push(occ);
            }
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    occurrences
}

fn occurrence_for_day(
    day: NaiveDate,
    start: NaiveTime,
    end: Option<NaiveTime>,
    tz: Tz,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> Option<RangeOccurrence> {
    let start_utc = resolve_local(tz, day, start)?;
    if start_utc >= window.1 {
        return None;
    }

    let Some(end_tod) = end else {
        // Momentary: start only.
        return Some((start_utc, None));
    };

    // Overnight rollover: an end at or before the start belongs to the next
    // calendar day.
    let end_day = if end_tod <= start { day.succ_opt()? } else { day };
    let end_utc = resolve_local(tz, end_day, end_tod)?;

    if end_utc <= window.0 {
        // Completed before the window opened.
        return None;
    }
    let admitted_end = (end_utc <= window.1).then_some(end_utc);
    Some((start_utc, admitted_end))
}

/// Map a local wall-clock time to UTC. Ambiguous times (DST fall-back)
/// resolve to the earliest instant; times erased by a DST gap shift forward
/// one hour to the first valid wall-clock time.
fn resolve_local(tz: Tz, day: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = day.and_time(time);
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    tz.from_local_datetime(&(naive + Duration::hours(1)))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
