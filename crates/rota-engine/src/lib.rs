//! # rota-engine
//!
//! Deterministic on-call resolution. Given a roster of members and
//! schedules — cron-style recurrences with exclusive activation, or
//! day-of-week/time-of-day ranges with additive activation, each anchored to
//! a named time zone — the engine answers who is on call at any instant,
//! tiles arbitrary windows into active-set segments, and rotates fairly
//! among simultaneously active schedules.
//!
//! The engine is a pure, synchronous computation over an immutable snapshot:
//! no I/O, no clock access (the caller supplies `now`), and every operation
//! bounded by construction. The only mutable artifact crossing requests is
//! [`RotationState`], threaded explicitly and persisted by the caller.
//!
//! ## Modules
//!
//! - [`zone`] — timezone names and abbreviations to canonical IANA zones
//! - [`recurrence`] — cron expression projection and fire queries
//! - [`ranges`] — day-of-week/time-of-day range projection
//! - [`events`] — chronological start/end event merging
//! - [`simulate`] — active-set replay under two activation models
//! - [`timeline`] — window segmentation
//! - [`rotation`] — deterministic round-robin selection
//! - [`engine`] — top-level operations for the surrounding service
//! - [`model`] — members, schedules, roster snapshots
//! - [`error`] — error types

pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod ranges;
pub mod recurrence;
pub mod rotation;
pub mod simulate;
pub mod timeline;
pub mod zone;

pub use engine::{current_and_next, current_overlaps, pick_on_call, timeline as resolve_timeline};
pub use engine::{CurrentNext, OnCallPick, Overlaps, UpcomingStart};
pub use error::RotaError;
pub use model::{Member, OnCallEntry, Roster, Schedule, ScheduleKind};
pub use rotation::RotationState;
pub use simulate::{active_at, next_start_after, ActiveState};
pub use timeline::Segment;
pub use zone::canonicalize;
