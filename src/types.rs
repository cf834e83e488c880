//! Core types for the health analytics pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw daily records, the daily summary, correlation buckets, weekday
//! workout recommendations and personal records.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, ValidationError};

/// Day of week, serialized with its full English name ("Monday")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All weekdays, Monday first
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Days since Monday (Monday = 0, Sunday = 6)
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        DayOfWeek::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| AnalyticsError::InvalidValue(format!("day_of_week '{s}'")))
    }
}

/// Workout category recorded on workout days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkoutType {
    Running,
    Gym,
    Yoga,
    Cycling,
    Swimming,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 5] = [
        WorkoutType::Running,
        WorkoutType::Gym,
        WorkoutType::Yoga,
        WorkoutType::Cycling,
        WorkoutType::Swimming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Gym => "Gym",
            WorkoutType::Yoga => "Yoga",
            WorkoutType::Cycling => "Cycling",
            WorkoutType::Swimming => "Swimming",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkoutType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AnalyticsError::InvalidValue(format!("workout_type '{s}'")))
    }
}

/// One raw row of `raw_health_metrics`.
///
/// Field order is the column order of the generated CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar day (unique key)
    pub date: NaiveDate,
    pub steps: u32,
    /// Derived from steps
    pub distance_miles: f64,
    /// Workout minutes plus one minute per 100 steps
    pub active_minutes: u32,
    /// Hours slept, within [4, 10]
    pub sleep_hours: f64,
    /// Sleep hours scaled to [0, 10]
    pub sleep_quality: f64,
    /// 0 means no workout that day
    pub workout_minutes: u32,
    pub workout_type: Option<WorkoutType>,
    pub calories_burned: u32,
    /// Within [1, 10]
    pub mood_score: f64,
    /// Within [1, 10]
    pub energy_level: f64,
    pub water_glasses: u32,
    pub weight_lbs: f64,
    pub resting_heart_rate: u32,
    /// Heart rate variability, within [20, 100]
    pub hrv: u32,
    pub day_of_week: DayOfWeek,
}

impl DailyRecord {
    pub fn workout_completed(&self) -> bool {
        self.workout_minutes > 0
    }

    /// Check the bounds and internal consistency of a single record
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(self.date, "sleep_hours", self.sleep_hours, 4.0, 10.0)?;
        check_range(self.date, "sleep_quality", self.sleep_quality, 0.0, 10.0)?;
        check_range(self.date, "mood_score", self.mood_score, 1.0, 10.0)?;
        check_range(self.date, "energy_level", self.energy_level, 1.0, 10.0)?;
        check_range(self.date, "hrv", f64::from(self.hrv), 20.0, 100.0)?;
        check_range(
            self.date,
            "water_glasses",
            f64::from(self.water_glasses),
            2.0,
            f64::INFINITY,
        )?;
        if self.weight_lbs.is_nan() || self.weight_lbs <= 0.0 {
            return Err(ValidationError::OutOfRange {
                date: self.date,
                field: "weight_lbs",
                value: self.weight_lbs,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        if self.workout_completed() != self.workout_type.is_some() {
            return Err(ValidationError::WorkoutTypeMismatch {
                date: self.date,
                minutes: self.workout_minutes,
            });
        }

        let expected = DayOfWeek::of(self.date);
        if expected != self.day_of_week {
            return Err(ValidationError::WeekdayMismatch {
                date: self.date,
                expected: expected.to_string(),
                actual: self.day_of_week.to_string(),
            });
        }

        Ok(())
    }
}

fn check_range(
    date: NaiveDate,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            date,
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// One row of `daily_health_summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub metric_date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub steps: u32,
    pub sleep_hours: f64,
    pub workout_minutes: u32,
    pub workout_type: Option<WorkoutType>,
    pub mood_score: f64,
    pub energy_level: f64,
    pub weight_lbs: f64,
    pub hrv: u32,
    /// Mean steps over the trailing 7 records, current day included
    pub steps_7day_avg: f64,
    /// Mean weight over the trailing 7 records, current day included
    pub weight_7day_avg: f64,
    /// Percent change against the record dated 7 days earlier
    pub steps_wow_change_pct: Option<f64>,
    pub workout_completed: bool,
    /// Composite score in [0, 10]
    pub daily_health_score: f64,
}

/// Average outcome for one category of a behavior/outcome pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationBucket {
    /// Pair name, e.g. "Sleep vs Mood"
    pub correlation_pair: String,
    /// Bucket label, e.g. "7-8 hrs"
    pub category: String,
    /// Display position of the bucket within its pair
    pub category_order: u32,
    pub avg_outcome: f64,
    pub sample_size: u32,
}

/// Ordered recommendation scale, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLabel {
    RestDay,
    Optional,
    Recommended,
    HighlyRecommended,
}

impl RecommendationLabel {
    /// Minimum score for HIGHLY_RECOMMENDED
    pub const HIGHLY_RECOMMENDED_MIN: f64 = 7.0;
    /// Minimum score for RECOMMENDED
    pub const RECOMMENDED_MIN: f64 = 5.5;
    /// Minimum score for OPTIONAL
    pub const OPTIONAL_MIN: f64 = 4.0;

    /// Map an optimal workout score in [0, 10] onto the label scale
    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGHLY_RECOMMENDED_MIN {
            RecommendationLabel::HighlyRecommended
        } else if score >= Self::RECOMMENDED_MIN {
            RecommendationLabel::Recommended
        } else if score >= Self::OPTIONAL_MIN {
            RecommendationLabel::Optional
        } else {
            RecommendationLabel::RestDay
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationLabel::HighlyRecommended => "HIGHLY_RECOMMENDED",
            RecommendationLabel::Recommended => "RECOMMENDED",
            RecommendationLabel::Optional => "OPTIONAL",
            RecommendationLabel::RestDay => "REST_DAY",
        }
    }
}

impl fmt::Display for RecommendationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationLabel {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGHLY_RECOMMENDED" => Ok(RecommendationLabel::HighlyRecommended),
            "RECOMMENDED" => Ok(RecommendationLabel::Recommended),
            "OPTIONAL" => Ok(RecommendationLabel::Optional),
            "REST_DAY" => Ok(RecommendationLabel::RestDay),
            other => Err(AnalyticsError::InvalidValue(format!(
                "recommendation '{other}'"
            ))),
        }
    }
}

/// One row of `workout_recommendations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecommendation {
    pub day_of_week: DayOfWeek,
    /// Score in [0, 10]
    pub optimal_workout_score: f64,
    pub recommendation: RecommendationLabel,
    pub avg_sleep_by_day: f64,
    /// Percent of this weekday's instances with a workout
    pub workout_completion_rate: f64,
    pub avg_energy: f64,
    pub avg_daily_health_score: f64,
    /// Mean energy on workout instances minus mean energy on rest instances
    pub energy_boost_from_workout: f64,
    /// Mean mood on workout instances minus mean mood on rest instances
    pub mood_boost_from_workout: f64,
    /// Number of instances of this weekday in the data
    pub sample_days: u32,
}

/// Whether a larger or a smaller value counts as a personal best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordDirection {
    HigherIsBetter,
    LowerIsBetter,
}

/// Metrics tracked in `personal_records`, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    Steps,
    WorkoutMinutes,
    #[serde(rename = "weight_lbs")]
    Weight,
}

impl TrackedMetric {
    pub const ALL: [TrackedMetric; 3] = [
        TrackedMetric::Steps,
        TrackedMetric::WorkoutMinutes,
        TrackedMetric::Weight,
    ];

    /// Stable key stored in the `metric` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedMetric::Steps => "steps",
            TrackedMetric::WorkoutMinutes => "workout_minutes",
            TrackedMetric::Weight => "weight_lbs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackedMetric::Steps => "Most Steps",
            TrackedMetric::WorkoutMinutes => "Longest Workout",
            TrackedMetric::Weight => "Lowest Weight",
        }
    }

    pub fn direction(&self) -> RecordDirection {
        match self {
            TrackedMetric::Steps | TrackedMetric::WorkoutMinutes => RecordDirection::HigherIsBetter,
            TrackedMetric::Weight => RecordDirection::LowerIsBetter,
        }
    }
}

impl fmt::Display for TrackedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedMetric {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackedMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| AnalyticsError::InvalidValue(format!("metric '{s}'")))
    }
}

/// One row of `personal_records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub metric: TrackedMetric,
    pub personal_best: f64,
    /// Earliest date the best value was reached
    pub achieved_date: NaiveDate,
    /// Value on the most recent day
    pub current_value: f64,
    /// How close the current value is to the best, in percent
    pub pct_of_best: Option<f64>,
}

/// Personal records keyed by metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalRecords(Vec<PersonalRecord>);

impl PersonalRecords {
    /// Build from rows in any order; rows are kept in `TrackedMetric` order
    pub fn new(mut records: Vec<PersonalRecord>) -> Self {
        records.sort_by_key(|r| r.metric);
        records.dedup_by_key(|r| r.metric);
        Self(records)
    }

    pub fn get(&self, metric: TrackedMetric) -> Option<&PersonalRecord> {
        self.0.iter().find(|r| r.metric == metric)
    }

    /// Like `get`, but a missing metric is an error
    pub fn require(&self, metric: TrackedMetric) -> Result<&PersonalRecord, AnalyticsError> {
        self.get(metric)
            .ok_or_else(|| AnalyticsError::MissingRecord(metric.as_str().to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonalRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DailyRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        DailyRecord {
            date,
            steps: 9_500,
            distance_miles: 3.8,
            active_minutes: 140,
            sleep_hours: 7.4,
            sleep_quality: 9.3,
            workout_minutes: 45,
            workout_type: Some(WorkoutType::Running),
            calories_burned: 450,
            mood_score: 7.8,
            energy_level: 7.5,
            water_glasses: 7,
            weight_lbs: 168.2,
            resting_heart_rate: 58,
            hrv: 52,
            day_of_week: DayOfWeek::Monday,
        }
    }

    #[test]
    fn test_weekday_from_chrono() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(DayOfWeek::of(sunday), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::Sunday.index(), 6);
        assert!(DayOfWeek::Sunday.is_weekend());
        assert_eq!("Wednesday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Wednesday);
    }

    #[test]
    fn test_valid_record_passes() {
        assert_eq!(sample_record().validate(), Ok(()));
    }

    #[test]
    fn test_out_of_range_sleep_is_rejected() {
        let mut record = sample_record();
        record.sleep_hours = 11.2;
        match record.validate() {
            Err(ValidationError::OutOfRange { field, .. }) => assert_eq!(field, "sleep_hours"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_workout_type_without_minutes_is_rejected() {
        let mut record = sample_record();
        record.workout_minutes = 0;
        assert!(matches!(
            record.validate(),
            Err(ValidationError::WorkoutTypeMismatch { minutes: 0, .. })
        ));
    }

    #[test]
    fn test_wrong_weekday_is_rejected() {
        let mut record = sample_record();
        record.day_of_week = DayOfWeek::Friday;
        assert!(matches!(
            record.validate(),
            Err(ValidationError::WeekdayMismatch { .. })
        ));
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(
            RecommendationLabel::from_score(8.9),
            RecommendationLabel::HighlyRecommended
        );
        assert_eq!(
            RecommendationLabel::from_score(7.0),
            RecommendationLabel::HighlyRecommended
        );
        assert_eq!(
            RecommendationLabel::from_score(6.0),
            RecommendationLabel::Recommended
        );
        assert_eq!(
            RecommendationLabel::from_score(4.0),
            RecommendationLabel::Optional
        );
        assert_eq!(
            RecommendationLabel::from_score(1.2),
            RecommendationLabel::RestDay
        );
        assert!(RecommendationLabel::HighlyRecommended > RecommendationLabel::RestDay);
    }

    #[test]
    fn test_label_serializes_screaming_snake() {
        let json = serde_json::to_string(&RecommendationLabel::HighlyRecommended).unwrap();
        assert_eq!(json, "\"HIGHLY_RECOMMENDED\"");
    }

    #[test]
    fn test_personal_records_lookup_by_metric() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let row = |metric| PersonalRecord {
            metric,
            personal_best: 1.0,
            achieved_date: date,
            current_value: 1.0,
            pct_of_best: Some(100.0),
        };
        let records = PersonalRecords::new(vec![row(TrackedMetric::Weight), row(TrackedMetric::Steps)]);

        let order: Vec<_> = records.iter().map(|r| r.metric).collect();
        assert_eq!(order, vec![TrackedMetric::Steps, TrackedMetric::Weight]);
        assert!(records.get(TrackedMetric::Weight).is_some());
        assert!(matches!(
            records.require(TrackedMetric::WorkoutMinutes),
            Err(AnalyticsError::MissingRecord(_))
        ));
    }
}
