//! Cron recurrence projection.
//!
//! A recurring schedule carries a cron-style expression interpreted against
//! local time in its zone; every fire converts to one UTC `start` instant.
//! Activation end is implicit (exclusive model: the set changes when someone
//! else fires), so only start instants are produced here.
//!
//! The single-instant queries ([`last_fire_at_or_before`],
//! [`next_fire_after`]) are expressed on top of the windowed projection with
//! a doubling probe window, so there is exactly one recurrence-walking code
//! path and every query terminates in bounded work.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;

use crate::error::{Result, RotaError};

/// Hard cap on fires produced by one projection call. Pathological
/// expressions truncate here rather than erroring; availability is favored
/// over completeness for degenerate inputs.
pub const MAX_FIRES_PER_PROJECTION: usize = 1000;

/// How far the single-instant queries will search from their anchor before
/// giving up. Covers yearly expressions.
pub const FIRE_SEARCH_HORIZON_DAYS: i64 = 366;

/// Parse a cron expression, accepting the legacy 5-field form
/// (minute hour day-of-month month day-of-week) by prefixing a zero
/// seconds field and translating the day-of-week numbering.
fn parse_expr(expr: &str) -> Result<CronSchedule> {
    let expr = expr.trim();
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let normalized = if fields.len() == 5 {
        let dow = translate_posix_dow(fields[4]);
        format!("0 {} {} {} {} {dow}", fields[0], fields[1], fields[2], fields[3])
    } else {
        expr.to_string()
    };
    CronSchedule::from_str(&normalized)
        .map_err(|e| RotaError::InvalidRecurrence(format!("'{expr}': {e}")))
}

/// Translate a legacy numeric day-of-week field (0-7, both 0 and 7 are
/// Sunday, 1 is Monday) into the parser's Sunday=1..Saturday=7 ordinals.
///
/// Values, ranges, steps and lists expand to an explicit day list so that
/// ranges wrapping through Sunday stay expressible. Fields without digits
/// (`*`, named days) pass through untouched, as does anything that fails to
/// parse — the cron parser then reports the error with full context.
fn translate_posix_dow(field: &str) -> String {
    if !field.chars().any(|c| c.is_ascii_digit()) {
        return field.to_string();
    }

    let mut days = std::collections::BTreeSet::new();
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => match step.parse::<u32>() {
                Ok(step) if step > 0 => (range, step),
                _ => return field.to_string(),
            },
            None => (part, 1),
        };
        let bounds = if range == "*" {
            Some((0, 6))
        } else if let Some((lo, hi)) = range.split_once('-') {
            lo.parse::<u32>().ok().zip(hi.parse::<u32>().ok())
        } else {
            range.parse::<u32>().ok().map(|v| (v, v))
        };
        let Some((lo, hi)) = bounds.filter(|&(lo, hi)| lo <= hi && hi <= 7) else {
            return field.to_string();
        };
        let mut day = lo;
        while day <= hi {
            days.insert(day % 7 + 1);
            day += step;
        }
    }

    days.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Validate an expression at schedule-creation time: it must parse, and it
/// must produce at least one fire after `now` within
/// [`FIRE_SEARCH_HORIZON_DAYS`]. A parseable expression that never fires
/// (`0 0 30 2 *`) would otherwise be stored and silently project nothing.
///
/// Stored schedules are assumed pre-validated; resolution never re-raises
/// [`RotaError::InvalidRecurrence`] as a fatal error.
pub fn validate(expr: &str, tz: Tz, now: DateTime<Utc>) -> Result<()> {
    parse_expr(expr)?;
    match next_fire_after(expr, tz, now)? {
        Some(_) => Ok(()),
        None => Err(RotaError::InvalidRecurrence(format!(
            "'{expr}' never fires within the search horizon"
        ))),
    }
}

/// Project all fire instants within `[window.0, window.1)`, in UTC,
/// ascending, truncated at [`MAX_FIRES_PER_PROJECTION`].
pub fn project(expr: &str, tz: Tz, window: (DateTime<Utc>, DateTime<Utc>)) -> Result<Vec<DateTime<Utc>>> {
    let schedule = parse_expr(expr)?;
    // `after` is exclusive; back up one second so a fire exactly at the
    // window start is included.
    let probe = (window.0 - Duration::seconds(1)).with_timezone(&tz);

    let mut fires = Vec::new();
    for fire in schedule.after(&probe).take(MAX_FIRES_PER_PROJECTION) {
        let utc = fire.with_timezone(&Utc);
        if utc >= window.1 {
            break;
        }
        fires.push(utc);
    }
    Ok(fires)
}

/// The most recent fire at or before `instant`, if any within
/// [`FIRE_SEARCH_HORIZON_DAYS`].
///
/// Probes backwards with a doubling window starting at ten minutes; a probe
/// only grows after coming back empty, so dense expressions resolve in the
/// first probe. When a wide probe window truncates at the projection cap,
/// the search resweeps forward from the last fire found until the window is
/// exhausted.
pub fn last_fire_at_or_before(
    expr: &str,
    tz: Tz,
    instant: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let horizon = Duration::days(FIRE_SEARCH_HORIZON_DAYS);
    let mut lookback = Duration::minutes(10);
    loop {
        let clamped = lookback.min(horizon);
        let window = (instant - clamped, instant + Duration::seconds(1));
        let mut batch = project(expr, tz, window)?;
        if let Some(&found) = batch.last() {
            // A truncated batch holds the window's *first* thousand fires;
            // resweep forward from the last one found until the batch is no
            // longer truncated, so an expression dense only in the past
            // still reports its true latest fire.
            let mut latest = found;
            while batch.len() == MAX_FIRES_PER_PROJECTION {
                batch = project(
                    expr,
                    tz,
                    (latest + Duration::seconds(1), instant + Duration::seconds(1)),
                )?;
                if let Some(&next) = batch.last() {
                    latest = next;
                }
            }
            return Ok(Some(latest));
        }
        if clamped == horizon {
            return Ok(None);
        }
        lookback = lookback * 2;
    }
}

/// The first fire strictly after `instant`, if any within
/// [`FIRE_SEARCH_HORIZON_DAYS`].
pub fn next_fire_after(
    expr: &str,
    tz: Tz,
    instant: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let horizon = Duration::days(FIRE_SEARCH_HORIZON_DAYS);
    let mut lookahead = Duration::minutes(10);
    loop {
        let clamped = lookahead.min(horizon);
        let window = (instant + Duration::seconds(1), instant + clamped);
        let fires = project(expr, tz, window)?;
        if let Some(&first) = fires.first() {
            return Ok(Some(first));
        }
        if clamped == horizon {
            return Ok(None);
        }
        lookahead = lookahead * 2;
    }
}
