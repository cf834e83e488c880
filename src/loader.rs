//! Flat-file loader
//!
//! Reads the generated CSV, validates every row, then replaces the raw table
//! in one transaction. A file that fails to parse or validate never reaches
//! the store, so the previous raw table survives a bad load.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::{Result, ValidationError};
use crate::store::{HealthStore, RawStats};
use crate::types::DailyRecord;

/// Rows echoed back after a load
pub const SAMPLE_ROWS: u32 = 3;

/// Parse records from any CSV source with a header row
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<DailyRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records = reader
        .deserialize::<DailyRecord>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(records)
}

pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<DailyRecord>> {
    let file = std::fs::File::open(path)?;
    read_records_from(file)
}

/// Check every record and that no date repeats
pub fn validate_records(records: &[DailyRecord]) -> std::result::Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.date) {
            return Err(ValidationError::DuplicateDate(record.date));
        }
    }
    Ok(())
}

/// What a load left in the raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub row_count: u32,
    pub sample: Vec<DailyRecord>,
    pub stats: RawStats,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Loaded {} records", self.row_count)?;
        writeln!(f)?;
        writeln!(f, "Sample data:")?;
        writeln!(
            f,
            "  {:<10}  {:>6}  {:>5}  {:>7}  {:<8}  {:>4}  {:<9}",
            "date", "steps", "sleep", "workout", "type", "mood", "day"
        )?;
        for r in &self.sample {
            writeln!(
                f,
                "  {:<10}  {:>6}  {:>5.1}  {:>7}  {:<8}  {:>4.1}  {:<9}",
                r.date.to_string(),
                r.steps,
                r.sleep_hours,
                r.workout_minutes,
                r.workout_type.map(|t| t.as_str()).unwrap_or("-"),
                r.mood_score,
                r.day_of_week.as_str(),
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Summary statistics:")?;
        let fmt_avg = |value: Option<f64>, decimals: usize| {
            value
                .map(|v| format!("{v:.decimals$}"))
                .unwrap_or_else(|| "n/a".to_string())
        };
        writeln!(f, "  avg_steps     {}", fmt_avg(self.stats.avg_steps, 0))?;
        writeln!(f, "  avg_sleep     {}", fmt_avg(self.stats.avg_sleep, 2))?;
        writeln!(f, "  avg_mood      {}", fmt_avg(self.stats.avg_mood, 2))?;
        write!(f, "  workout_days  {}", self.stats.workout_days)
    }
}

/// Validate `records` and make them the entire raw table
pub fn load_records(store: &mut HealthStore, records: &[DailyRecord]) -> Result<LoadReport> {
    validate_records(records)?;
    store.replace_raw_records(records)?;

    let stats = store.raw_stats()?;
    let sample = store.sample_records(SAMPLE_ROWS)?;
    info!(
        rows = stats.row_count,
        workout_days = stats.workout_days,
        "loaded raw health metrics"
    );

    Ok(LoadReport {
        row_count: stats.row_count,
        sample,
        stats,
    })
}

/// Read, validate and load a CSV file
pub fn load_file<P: AsRef<Path>>(store: &mut HealthStore, path: P) -> Result<LoadReport> {
    let path = path.as_ref();
    let records = read_records(path)?;
    info!(path = %path.display(), records = records.len(), "read health data");
    load_records(store, &records)
}
