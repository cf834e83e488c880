//! Fixtures shared by unit tests

use chrono::{Duration, NaiveDate};

use crate::types::{DailyRecord, DayOfWeek, WorkoutType};

/// 2024-01-01 is a Monday, which keeps weekday arithmetic readable in tests
pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

/// A plausible record with the given headline values and everything else derived
pub fn record(date: NaiveDate, steps: u32, sleep_hours: f64, workout_minutes: u32, mood: f64) -> DailyRecord {
    DailyRecord {
        date,
        steps,
        distance_miles: (f64::from(steps) * 0.0004 * 100.0).round() / 100.0,
        active_minutes: workout_minutes + steps / 100,
        sleep_hours,
        sleep_quality: ((sleep_hours / 8.0 * 10.0).min(10.0) * 10.0).round() / 10.0,
        workout_minutes,
        workout_type: (workout_minutes > 0).then_some(WorkoutType::Gym),
        calories_burned: workout_minutes * 10,
        mood_score: mood,
        energy_level: mood,
        water_glasses: 8,
        weight_lbs: 170.0,
        resting_heart_rate: 60,
        hrv: 50,
        day_of_week: DayOfWeek::of(date),
    }
}

/// `days` consecutive records starting at `day(0)` with constant values
pub fn flat_series(days: i64, steps: u32) -> Vec<DailyRecord> {
    (0..days).map(|i| record(day(i), steps, 8.0, 0, 7.0)).collect()
}
