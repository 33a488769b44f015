//! Error types for rota-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotaError {
    #[error("Unknown timezone: {0}")]
    UnknownZone(String),

    #[error("Invalid recurrence expression: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),
}

pub type Result<T> = std::result::Result<T, RotaError>;
