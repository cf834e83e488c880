//! Error types for health analytics

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while generating, loading, deriving or rendering
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),

    #[error("Invalid generator parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid date window: {0}")]
    InvalidWindow(String),

    #[error("Derived view does not exist: {0}")]
    MissingView(String),

    #[error("Derived view is empty: {0}")]
    EmptyView(String),

    #[error("Unrecognized stored value: {0}")]
    InvalidValue(String),

    #[error("No personal record for metric: {0}")]
    MissingRecord(String),
}

/// Row-level validation failures for raw daily records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} on {date} is outside [{min}, {max}]")]
    OutOfRange {
        date: NaiveDate,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Duplicate record for {0}")]
    DuplicateDate(NaiveDate),

    #[error("Workout type on {date} does not match workout_minutes = {minutes}")]
    WorkoutTypeMismatch { date: NaiveDate, minutes: u32 },

    #[error("day_of_week on {date} is {actual}, expected {expected}")]
    WeekdayMismatch {
        date: NaiveDate,
        expected: String,
        actual: String,
    },
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, AnalyticsError>;
