//! Personal records
//!
//! Best-ever values for steps, workout minutes and weight.
//!
//! Steps and workout minutes are "higher is better": the best is the maximum
//! and percent-of-best is `current / best * 100`. Weight is "lower is better":
//! the best is the minimum and percent-of-best is `best / current * 100`, so it
//! reads 100 at the best and drops as weight rises above it. On ties the
//! earliest date wins.

use chrono::NaiveDate;

use super::round_to;
use crate::types::{DailyRecord, PersonalRecord, PersonalRecords, RecordDirection, TrackedMetric};

fn metric_value(metric: TrackedMetric, record: &DailyRecord) -> f64 {
    match metric {
        TrackedMetric::Steps => f64::from(record.steps),
        TrackedMetric::WorkoutMinutes => f64::from(record.workout_minutes),
        TrackedMetric::Weight => record.weight_lbs,
    }
}

/// Build personal records for every tracked metric.
///
/// Returns an empty set when there are no records.
pub fn build_personal_records(records: &[DailyRecord]) -> PersonalRecords {
    let mut ordered: Vec<&DailyRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let Some(latest) = ordered.last() else {
        return PersonalRecords::default();
    };

    let rows = TrackedMetric::ALL
        .into_iter()
        .filter_map(|metric| {
            let points = ordered.iter().map(|r| (r.date, metric_value(metric, r)));
            let (achieved_date, personal_best) = best_in(metric.direction(), points)?;
            let current_value = metric_value(metric, latest);

            Some(PersonalRecord {
                metric,
                personal_best,
                achieved_date,
                current_value,
                pct_of_best: pct_of_best(metric.direction(), personal_best, current_value),
            })
        })
        .collect();

    PersonalRecords::new(rows)
}

/// Earliest `(date, value)` holding the extremal value; points must be in date order
pub fn best_in<I>(direction: RecordDirection, points: I) -> Option<(NaiveDate, f64)>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut best: Option<(NaiveDate, f64)> = None;
    for (date, value) in points {
        let improves = match best {
            None => true,
            Some((_, held)) => match direction {
                RecordDirection::HigherIsBetter => value > held,
                RecordDirection::LowerIsBetter => value < held,
            },
        };
        if improves {
            best = Some((date, value));
        }
    }
    best
}

/// Percent of the personal best reached by the current value
pub fn pct_of_best(direction: RecordDirection, best: f64, current: f64) -> Option<f64> {
    let pct = match direction {
        RecordDirection::HigherIsBetter if best > 0.0 => current / best * 100.0,
        RecordDirection::LowerIsBetter if current > 0.0 => best / current * 100.0,
        _ => return None,
    };
    Some(round_to(pct, 1))
}
