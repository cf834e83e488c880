//! Synthetic daily health data
//!
//! Produces one [`DailyRecord`] per calendar day over a fixed window ending on
//! a given date. All randomness comes from a `ChaCha8Rng` owned by the
//! generator, so a seed and end date fully determine the output.

use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::derive::rolling::mean;
use crate::derive::round_to;
use crate::error::{AnalyticsError, Result};
use crate::types::{DailyRecord, DayOfWeek, WorkoutType};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 180;
pub const BASE_STEPS: f64 = 8_000.0;
pub const BASE_SLEEP_HOURS: f64 = 7.5;
pub const BASE_WORKOUT_MINUTES: f64 = 30.0;

const MIN_STEPS: f64 = 1_000.0;
const MIN_WORKOUT_MINUTES: f64 = 5.0;
const MIN_WATER_GLASSES: f64 = 2.0;
const BASE_WEIGHT_LBS: f64 = 170.0;
/// Pounds lost per elapsed day
const WEIGHT_TREND_PER_DAY: f64 = 0.02;
/// The downward trend stops here, so long windows keep a positive weight
const MIN_WEIGHT_LBS: f64 = 120.0;
const MILES_PER_STEP: f64 = 0.0004;

/// Inputs that fully determine a generated series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Days before `end_date` covered by the window; the window holds
    /// `lookback_days + 1` records
    pub lookback_days: u32,
    /// Last day of the window, inclusive
    pub end_date: NaiveDate,
    pub base_steps: f64,
    pub base_sleep_hours: f64,
    pub base_workout_minutes: f64,
}

impl GeneratorConfig {
    /// Default seed, window and baselines, ending on `end_date`
    pub fn ending(end_date: NaiveDate) -> Self {
        Self {
            seed: DEFAULT_SEED,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            end_date,
            base_steps: BASE_STEPS,
            base_sleep_hours: BASE_SLEEP_HOURS,
            base_workout_minutes: BASE_WORKOUT_MINUTES,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    /// First day of the window
    pub fn start_date(&self) -> Result<NaiveDate> {
        self.end_date
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .ok_or_else(|| {
                AnalyticsError::InvalidWindow(format!(
                    "{} days before {} is out of range",
                    self.lookback_days, self.end_date
                ))
            })
    }
}

/// Seeded generator of daily records
pub struct HealthDataGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
}

impl HealthDataGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.start_date()?;
        for (name, value) in [
            ("base_steps", config.base_steps),
            ("base_sleep_hours", config.base_sleep_hours),
            ("base_workout_minutes", config.base_workout_minutes),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalyticsError::InvalidParameter(format!("{name} = {value}")));
            }
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the whole window in date order
    pub fn generate(&mut self) -> Result<Vec<DailyRecord>> {
        let start = self.config.start_date()?;
        let records = start
            .iter_days()
            .take(self.config.lookback_days as usize + 1)
            .enumerate()
            .map(|(elapsed, date)| self.generate_day(date, elapsed as f64))
            .collect::<Result<Vec<_>>>()?;

        info!(
            seed = self.config.seed,
            records = records.len(),
            start = %start,
            end = %self.config.end_date,
            "generated synthetic health data"
        );
        Ok(records)
    }

    fn generate_day(&mut self, date: NaiveDate, days_elapsed: f64) -> Result<DailyRecord> {
        let day_of_week = DayOfWeek::of(date);
        let base_steps = self.config.base_steps;
        let base_sleep_hours = self.config.base_sleep_hours;
        let base_workout_minutes = self.config.base_workout_minutes;

        // Steps: busier on weekdays
        let step_noise = if day_of_week.is_weekend() {
            self.normal(-1_000.0, 1_000.0)?
        } else {
            self.normal(2_000.0, 1_500.0)?
        };
        let steps = (base_steps + step_noise).trunc().max(MIN_STEPS) as u32;

        // Sleep: long on Sunday, short on Friday
        let sleep_noise = match day_of_week {
            DayOfWeek::Sunday => self.normal(1.0, 0.5)?,
            DayOfWeek::Friday => self.normal(-0.5, 0.5)?,
            _ => self.normal(0.0, 0.7)?,
        };
        let sleep_hours = round_to((base_sleep_hours + sleep_noise).clamp(4.0, 10.0), 1);

        let workout_probability = match day_of_week {
            DayOfWeek::Tuesday | DayOfWeek::Thursday | DayOfWeek::Saturday => 0.7,
            _ => 0.3,
        };
        let did_workout = self.rng.gen::<f64>() < workout_probability;

        let (workout_minutes, workout_type, calories_burned) = if did_workout {
            let minutes = (base_workout_minutes + self.normal(15.0, 10.0)?)
                .trunc()
                .max(MIN_WORKOUT_MINUTES) as u32;
            let kind = WorkoutType::ALL[self.rng.gen_range(0..WorkoutType::ALL.len())];
            let calories = (f64::from(minutes) * self.rng.gen_range(8.0..12.0)).trunc() as u32;
            (minutes, Some(kind), calories)
        } else {
            (0, None, 0)
        };

        let mut mood_base = 7.0;
        if sleep_hours >= 7.5 {
            mood_base += 1.0;
        }
        if sleep_hours < 6.0 {
            mood_base -= 1.5;
        }
        if did_workout {
            mood_base += 0.5;
        }
        let mood_score = round_to((mood_base + self.normal(0.0, 1.0)?).clamp(1.0, 10.0), 1);
        let energy_level = round_to((mood_score + self.normal(0.0, 0.5)?).clamp(1.0, 10.0), 1);

        let water_glasses = (6.0 + self.normal(2.0, 2.0)?).max(MIN_WATER_GLASSES).trunc() as u32;

        let trend = (BASE_WEIGHT_LBS - WEIGHT_TREND_PER_DAY * days_elapsed).max(MIN_WEIGHT_LBS);
        let weight_lbs = round_to((trend + self.normal(0.0, 0.5)?).max(MIN_WEIGHT_LBS), 1);

        let hrv = (50.0 + (sleep_hours - 7.0) * 5.0 + self.normal(0.0, 10.0)?)
            .trunc()
            .clamp(20.0, 100.0) as u32;
        let resting_heart_rate = (60.0 + self.normal(0.0, 5.0)?).trunc().max(0.0) as u32;

        Ok(DailyRecord {
            date,
            steps,
            distance_miles: round_to(f64::from(steps) * MILES_PER_STEP, 2),
            active_minutes: workout_minutes + steps / 100,
            sleep_hours,
            sleep_quality: round_to((sleep_hours / 8.0 * 10.0).min(10.0), 1),
            workout_minutes,
            workout_type,
            calories_burned,
            mood_score,
            energy_level,
            water_glasses,
            weight_lbs,
            resting_heart_rate,
            hrv,
            day_of_week,
        })
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> Result<f64> {
        let dist = Normal::new(mean, std_dev)
            .map_err(|e| AnalyticsError::InvalidParameter(format!("N({mean}, {std_dev}): {e}")))?;
        Ok(dist.sample(&mut self.rng))
    }
}

/// Headline numbers reported after generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub record_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub avg_steps: Option<f64>,
    pub avg_mood: Option<f64>,
    pub workout_days: usize,
}

impl GenerationSummary {
    pub fn from_records(records: &[DailyRecord]) -> Self {
        Self {
            record_count: records.len(),
            first_date: records.iter().map(|r| r.date).min(),
            last_date: records.iter().map(|r| r.date).max(),
            avg_steps: mean(records.iter().map(|r| f64::from(r.steps))),
            avg_mood: mean(records.iter().map(|r| r.mood_score)),
            workout_days: records.iter().filter(|r| r.workout_completed()).count(),
        }
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated {} days of health data", self.record_count)?;
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(f, "Date range: {first} to {last}")?;
        }
        writeln!(f, "Average metrics:")?;
        if let Some(steps) = self.avg_steps {
            writeln!(f, "  Steps: {steps:.0}")?;
        }
        if let Some(mood) = self.avg_mood {
            writeln!(f, "  Mood: {mood:.1}/10")?;
        }
        write!(f, "  Workouts: {} days", self.workout_days)
    }
}

/// Write records as CSV with a header row
pub fn write_csv_to<W: Write>(records: &[DailyRecord], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to `path`, replacing it only once the whole file is written
pub fn write_csv<P: AsRef<Path>>(records: &[DailyRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let partial = path.with_extension("csv.partial");
    let written = fs::File::create(&partial)
        .map_err(AnalyticsError::from)
        .and_then(|file| write_csv_to(records, file))
        .and_then(|()| fs::rename(&partial, path).map_err(AnalyticsError::from));
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    info!(path = %path.display(), records = records.len(), "wrote health data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn generate(config: GeneratorConfig) -> Vec<DailyRecord> {
        HealthDataGenerator::new(config).unwrap().generate().unwrap()
    }

    #[test]
    fn test_one_record_per_day() {
        let records = generate(GeneratorConfig::ending(end()));

        assert_eq!(records.len(), 181);
        assert_eq!(records[0].date, end() - Duration::days(180));
        assert_eq!(records.last().unwrap().date, end());
        for pair in records.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn test_fields_respect_bounds() {
        for seed in [1, 7, 42, 1234] {
            let records = generate(GeneratorConfig::ending(end()).with_seed(seed));
            for r in &records {
                r.validate().unwrap();
                assert!(r.steps >= 1_000);
                assert!(r.water_glasses >= 2);
                assert!((4.0..=10.0).contains(&r.sleep_hours));
                assert!((1.0..=10.0).contains(&r.mood_score));
                assert!((20..=100).contains(&r.hrv));
                assert_eq!(r.day_of_week, DayOfWeek::of(r.date));
                assert_eq!(r.workout_type.is_some(), r.workout_minutes > 0);
                if r.workout_minutes == 0 {
                    assert_eq!(r.calories_burned, 0);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_is_byte_identical() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_csv_to(&generate(GeneratorConfig::ending(end())), &mut first).unwrap();
        write_csv_to(&generate(GeneratorConfig::ending(end())), &mut second).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(GeneratorConfig::ending(end()).with_seed(1));
        let b = generate(GeneratorConfig::ending(end()).with_seed(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_header_uses_field_names() {
        let mut out = Vec::new();
        let records = generate(GeneratorConfig::ending(end()).with_lookback_days(0));
        write_csv_to(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "date,steps,distance_miles,active_minutes,sleep_hours,sleep_quality,\
             workout_minutes,workout_type,calories_burned,mood_score,energy_level,\
             water_glasses,weight_lbs,resting_heart_rate,hrv,day_of_week"
        );
        assert!(text.lines().nth(1).unwrap().starts_with("2024-06-30,"));
    }

    #[test]
    fn test_invalid_window() {
        let config = GeneratorConfig::ending(NaiveDate::MIN).with_lookback_days(10);
        assert!(matches!(
            HealthDataGenerator::new(config),
            Err(AnalyticsError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_invalid_baseline() {
        let mut config = GeneratorConfig::ending(end());
        config.base_steps = f64::NAN;
        assert!(matches!(
            HealthDataGenerator::new(config),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_summary() {
        let records = generate(GeneratorConfig::ending(end()).with_lookback_days(13));
        let summary = GenerationSummary::from_records(&records);

        assert_eq!(summary.record_count, 14);
        assert_eq!(summary.last_date, Some(end()));
        assert_eq!(
            summary.workout_days,
            records.iter().filter(|r| r.workout_minutes > 0).count()
        );
        assert!(summary.to_string().starts_with("Generated 14 days"));
    }

    #[test]
    fn test_write_csv_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("health_metrics.csv");
        let records = generate(GeneratorConfig::ending(end()).with_lookback_days(6));

        write_csv(&records, &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("csv.partial").exists());
    }

    #[test]
    fn test_long_window_keeps_weight_positive() {
        let records = generate(GeneratorConfig::ending(end()).with_lookback_days(9_000));

        assert_eq!(records.len(), 9_001);
        assert!(records.iter().all(|r| r.weight_lbs >= MIN_WEIGHT_LBS));
        assert!(crate::loader::validate_records(&records).is_ok());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health_metrics.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"occupied").unwrap();
        let records = generate(GeneratorConfig::ending(end()).with_lookback_days(6));

        assert!(write_csv(&records, &path).is_err());

        assert!(path.is_dir());
        assert!(!path.with_extension("csv.partial").exists());
    }
}
