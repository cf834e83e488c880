//! Behavior/outcome correlation buckets
//!
//! Each pair groups the daily summary by a behavioral dimension and reports the
//! mean of an outcome per bucket. Buckets with no days are left out.

use std::collections::BTreeMap;

use super::round_to;
use crate::types::{CorrelationBucket, DailySummary};

pub const SLEEP_VS_MOOD: &str = "Sleep vs Mood";
pub const STEPS_VS_MOOD: &str = "Steps vs Mood";
pub const WORKOUT_VS_ENERGY: &str = "Workout vs Energy";
pub const SLEEP_VS_HRV: &str = "Sleep vs HRV";

/// Bucket position and label for one day
type Bucket = (u32, &'static str);

fn sleep_bucket(row: &DailySummary) -> Bucket {
    match row.sleep_hours {
        h if h < 6.0 => (0, "< 6 hrs"),
        h if h < 7.0 => (1, "6-7 hrs"),
        h if h < 8.0 => (2, "7-8 hrs"),
        _ => (3, "8+ hrs"),
    }
}

fn steps_bucket(row: &DailySummary) -> Bucket {
    match row.steps {
        s if s < 5_000 => (0, "< 5k"),
        s if s < 8_000 => (1, "5k-8k"),
        s if s < 10_000 => (2, "8k-10k"),
        _ => (3, "10k+"),
    }
}

fn workout_bucket(row: &DailySummary) -> Bucket {
    if row.workout_completed {
        (0, "Workout Day")
    } else {
        (1, "Rest Day")
    }
}

/// Build all correlation pairs from the daily summary.
///
/// Pairs appear in a fixed order; buckets within a pair are ordered by their
/// position on the behavioral axis.
pub fn build_correlations(summary: &[DailySummary]) -> Vec<CorrelationBucket> {
    let mut buckets = Vec::new();
    buckets.extend(bucket_means(SLEEP_VS_MOOD, summary, sleep_bucket, |r| r.mood_score));
    buckets.extend(bucket_means(STEPS_VS_MOOD, summary, steps_bucket, |r| r.mood_score));
    buckets.extend(bucket_means(WORKOUT_VS_ENERGY, summary, workout_bucket, |r| {
        r.energy_level
    }));
    buckets.extend(bucket_means(SLEEP_VS_HRV, summary, sleep_bucket, |r| {
        f64::from(r.hrv)
    }));
    buckets
}

fn bucket_means(
    pair: &str,
    summary: &[DailySummary],
    classify: impl Fn(&DailySummary) -> Bucket,
    outcome: impl Fn(&DailySummary) -> f64,
) -> Vec<CorrelationBucket> {
    let mut groups: BTreeMap<Bucket, (f64, u32)> = BTreeMap::new();
    for row in summary {
        let entry = groups.entry(classify(row)).or_insert((0.0, 0));
        entry.0 += outcome(row);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((order, label), (sum, count))| CorrelationBucket {
            correlation_pair: pair.to_string(),
            category: label.to_string(),
            category_order: order,
            avg_outcome: round_to(sum / f64::from(count), 2),
            sample_size: count,
        })
        .collect()
}
