//! Daily summary
//!
//! One row per raw record with 7-day rolling averages, week-over-week step
//! change and the composite daily health score.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rolling::{percent_change, RollingWindow};
use super::round_to;
use crate::config::{DAILY_STEPS_GOAL, ROLLING_WINDOW_DAYS, SLEEP_GOAL_HOURS};
use crate::types::{DailyRecord, DailySummary};

/// Points awarded for reaching the step goal
pub const STEPS_POINTS: f64 = 3.0;
/// Points awarded for reaching the sleep goal
pub const SLEEP_POINTS: f64 = 2.5;
/// Points awarded for completing any workout
pub const WORKOUT_POINTS: f64 = 2.0;
/// Points awarded for a mood of 10
pub const MOOD_POINTS: f64 = 2.5;

/// Composite health score broken down by component.
///
/// The component maxima sum to 10, so `total()` always lies in [0, 10]. Each
/// component is monotonic in its input and saturates at its goal:
/// - steps: `min(steps / 10_000, 1) * 3.0`
/// - sleep: `min(hours / 8, 1) * 2.5`
/// - workout: `2.0` if a workout was completed, else `0`
/// - mood: `(mood - 1) / 9 * 2.5`, mood clamped to [1, 10]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub steps: f64,
    pub sleep: f64,
    pub workout: f64,
    pub mood: f64,
}

impl HealthScore {
    pub fn compute(steps: u32, sleep_hours: f64, workout_completed: bool, mood_score: f64) -> Self {
        let steps_ratio = (f64::from(steps) / f64::from(DAILY_STEPS_GOAL)).clamp(0.0, 1.0);
        let sleep_ratio = (sleep_hours / SLEEP_GOAL_HOURS).clamp(0.0, 1.0);
        let mood_ratio = ((mood_score.clamp(1.0, 10.0) - 1.0) / 9.0).clamp(0.0, 1.0);

        Self {
            steps: steps_ratio * STEPS_POINTS,
            sleep: sleep_ratio * SLEEP_POINTS,
            workout: if workout_completed { WORKOUT_POINTS } else { 0.0 },
            mood: mood_ratio * MOOD_POINTS,
        }
    }

    pub fn for_record(record: &DailyRecord) -> Self {
        Self::compute(
            record.steps,
            record.sleep_hours,
            record.workout_completed(),
            record.mood_score,
        )
    }

    /// Sum of the components, in [0, 10]
    pub fn total(&self) -> f64 {
        (self.steps + self.sleep + self.workout + self.mood).clamp(0.0, 10.0)
    }
}

/// Build the daily summary, ordered by date.
///
/// Input order does not matter. Rolling averages use the trailing
/// `ROLLING_WINDOW_DAYS` records; with less history the mean covers whatever
/// exists. Week-over-week change compares against the record dated exactly
/// seven days earlier and is absent when that record is missing.
pub fn build_daily_summary(records: &[DailyRecord]) -> Vec<DailySummary> {
    let mut ordered: Vec<&DailyRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let steps_by_date: BTreeMap<NaiveDate, u32> =
        ordered.iter().map(|r| (r.date, r.steps)).collect();

    let mut steps_window = RollingWindow::new(ROLLING_WINDOW_DAYS);
    let mut weight_window = RollingWindow::new(ROLLING_WINDOW_DAYS);

    ordered
        .into_iter()
        .map(|record| {
            let steps_7day_avg = steps_window.push(f64::from(record.steps));
            let weight_7day_avg = weight_window.push(record.weight_lbs);

            let week_ago = steps_by_date
                .get(&(record.date - Duration::days(7)))
                .map(|&steps| f64::from(steps));
            let steps_wow_change_pct =
                percent_change(f64::from(record.steps), week_ago).map(|pct| round_to(pct, 1));

            let score = HealthScore::for_record(record);

            DailySummary {
                metric_date: record.date,
                day_of_week: record.day_of_week,
                steps: record.steps,
                sleep_hours: record.sleep_hours,
                workout_minutes: record.workout_minutes,
                workout_type: record.workout_type,
                mood_score: record.mood_score,
                energy_level: record.energy_level,
                weight_lbs: record.weight_lbs,
                hrv: record.hrv,
                steps_7day_avg: round_to(steps_7day_avg, 1),
                weight_7day_avg: round_to(weight_7day_avg, 2),
                steps_wow_change_pct,
                workout_completed: record.workout_completed(),
                daily_health_score: round_to(score.total(), 2),
            }
        })
        .collect()
}
