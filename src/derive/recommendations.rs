//! Weekday workout recommendations
//!
//! Groups the daily summary by weekday and scores how well each weekday has
//! historically suited a workout.

use super::rolling::mean;
use super::round_to;
use crate::config::SLEEP_GOAL_HOURS;
use crate::types::{DailySummary, DayOfWeek, RecommendationLabel, WorkoutRecommendation};

/// Weight of the historical completion rate
pub const COMPLETION_WEIGHT: f64 = 0.4;
/// Weight of the average energy level
pub const ENERGY_WEIGHT: f64 = 0.3;
/// Weight of sleep attainment
pub const SLEEP_WEIGHT: f64 = 0.2;
/// Weight of the energy boost attributable to working out
pub const BOOST_WEIGHT: f64 = 0.1;

/// Energy boost mapped onto [0, 1] over this span, centred on 0
const BOOST_SPAN: f64 = 4.0;

/// Build one recommendation per weekday, best score first.
///
/// Always returns seven rows. A weekday with no data scores 0 and is labelled
/// `REST_DAY`. Ties are broken Monday first.
pub fn build_workout_recommendations(summary: &[DailySummary]) -> Vec<WorkoutRecommendation> {
    let mut rows: Vec<WorkoutRecommendation> = DayOfWeek::ALL
        .into_iter()
        .map(|day| {
            let days: Vec<&DailySummary> =
                summary.iter().filter(|r| r.day_of_week == day).collect();
            recommend_for(day, &days)
        })
        .collect();

    rows.sort_by(|a, b| {
        b.optimal_workout_score
            .total_cmp(&a.optimal_workout_score)
            .then(a.day_of_week.cmp(&b.day_of_week))
    });
    rows
}

fn recommend_for(day: DayOfWeek, days: &[&DailySummary]) -> WorkoutRecommendation {
    let sample_days = days.len() as u32;
    if days.is_empty() {
        return WorkoutRecommendation {
            day_of_week: day,
            optimal_workout_score: 0.0,
            recommendation: RecommendationLabel::RestDay,
            avg_sleep_by_day: 0.0,
            workout_completion_rate: 0.0,
            avg_energy: 0.0,
            avg_daily_health_score: 0.0,
            energy_boost_from_workout: 0.0,
            mood_boost_from_workout: 0.0,
            sample_days,
        };
    }

    let completed = days.iter().filter(|r| r.workout_completed).count();
    let completion = completed as f64 / days.len() as f64;
    let avg_sleep = mean(days.iter().map(|r| r.sleep_hours)).unwrap_or(0.0);
    let avg_energy = mean(days.iter().map(|r| r.energy_level)).unwrap_or(0.0);
    let avg_score = mean(days.iter().map(|r| r.daily_health_score)).unwrap_or(0.0);
    let energy_boost = workout_delta(days, |r| r.energy_level);
    let mood_boost = workout_delta(days, |r| r.mood_score);

    let score = round_to(
        optimal_workout_score(completion, avg_energy, avg_sleep, energy_boost),
        2,
    );

    WorkoutRecommendation {
        day_of_week: day,
        optimal_workout_score: score,
        recommendation: RecommendationLabel::from_score(score),
        avg_sleep_by_day: round_to(avg_sleep, 2),
        workout_completion_rate: round_to(completion * 100.0, 1),
        avg_energy: round_to(avg_energy, 2),
        avg_daily_health_score: round_to(avg_score, 2),
        energy_boost_from_workout: round_to(energy_boost, 2),
        mood_boost_from_workout: round_to(mood_boost, 2),
        sample_days,
    }
}

/// Score in [0, 10] from the weekday aggregates.
///
/// `10 * (0.4 completion + 0.3 energy/10 + 0.2 min(sleep/8, 1) + 0.1 boost)`
/// where the boost is mapped from [-2, 2] onto [0, 1].
pub fn optimal_workout_score(completion: f64, avg_energy: f64, avg_sleep: f64, energy_boost: f64) -> f64 {
    let completion = completion.clamp(0.0, 1.0);
    let energy = (avg_energy / 10.0).clamp(0.0, 1.0);
    let sleep = (avg_sleep / SLEEP_GOAL_HOURS).clamp(0.0, 1.0);
    let boost = ((energy_boost + BOOST_SPAN / 2.0) / BOOST_SPAN).clamp(0.0, 1.0);

    10.0 * (COMPLETION_WEIGHT * completion
        + ENERGY_WEIGHT * energy
        + SLEEP_WEIGHT * sleep
        + BOOST_WEIGHT * boost)
}

/// Mean outcome on workout instances minus mean outcome on rest instances;
/// 0 when either side has no days
fn workout_delta(days: &[&DailySummary], outcome: impl Fn(&DailySummary) -> f64) -> f64 {
    let active = mean(days.iter().filter(|r| r.workout_completed).map(|r| outcome(r)));
    let rest = mean(days.iter().filter(|r| !r.workout_completed).map(|r| outcome(r)));
    match (active, rest) {
        (Some(active), Some(rest)) => active - rest,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::build_daily_summary;
    use crate::test_support::{day, record};

    #[test]
    fn test_always_seven_rows() {
        let summary = build_daily_summary(&[record(day(0), 9_000, 7.0, 30, 7.0)]);
        let recs = build_workout_recommendations(&summary);

        assert_eq!(recs.len(), 7);
        let mut days: Vec<_> = recs.iter().map(|r| r.day_of_week).collect();
        days.sort();
        assert_eq!(days, DayOfWeek::ALL.to_vec());
    }

    #[test]
    fn test_full_completion_is_highly_recommended() {
        // Four Mondays, all with workouts, good sleep and high energy
        let records: Vec<_> = (0..4)
            .map(|week| record(day(week * 7), 10_000, 8.0, 45, 8.5))
            .collect();
        let summary = build_daily_summary(&records);
        let recs = build_workout_recommendations(&summary);

        let monday = recs.iter().find(|r| r.day_of_week == DayOfWeek::Monday).unwrap();
        assert_eq!(monday.workout_completion_rate, 100.0);
        assert_eq!(monday.recommendation, RecommendationLabel::HighlyRecommended);
        assert_eq!(recs[0].day_of_week, DayOfWeek::Monday);
    }

    #[test]
    fn test_days_without_data_are_rest_days() {
        let summary = build_daily_summary(&[record(day(0), 9_000, 7.0, 30, 7.0)]);
        let recs = build_workout_recommendations(&summary);

        let sunday = recs.iter().find(|r| r.day_of_week == DayOfWeek::Sunday).unwrap();
        assert_eq!(sunday.sample_days, 0);
        assert_eq!(sunday.recommendation, RecommendationLabel::RestDay);
    }

    #[test]
    fn test_energy_boost_compares_workout_and_rest_instances() {
        // Tuesdays: workouts at energy 8, rest at energy 6
        let records = vec![
            record(day(1), 9_000, 7.0, 40, 8.0),
            record(day(8), 9_000, 7.0, 0, 6.0),
            record(day(15), 9_000, 7.0, 40, 8.0),
        ];
        let summary = build_daily_summary(&records);
        let recs = build_workout_recommendations(&summary);

        let tuesday = recs.iter().find(|r| r.day_of_week == DayOfWeek::Tuesday).unwrap();
        assert_eq!(tuesday.energy_boost_from_workout, 2.0);
        assert_eq!(tuesday.mood_boost_from_workout, 2.0);
        assert_eq!(tuesday.sample_days, 3);
        assert!((tuesday.workout_completion_rate - 66.7).abs() < 1e-9);
    }

    #[test]
    fn test_labels_follow_thresholds() {
        let summary = build_daily_summary(&[
            record(day(0), 9_000, 8.0, 40, 9.0),
            record(day(2), 4_000, 5.0, 0, 3.0),
        ]);
        for rec in build_workout_recommendations(&summary) {
            assert_eq!(
                rec.recommendation,
                RecommendationLabel::from_score(rec.optimal_workout_score)
            );
        }
    }

    #[test]
    fn test_score_bounds() {
        assert!((optimal_workout_score(1.0, 10.0, 9.0, 5.0) - 10.0).abs() < 1e-9);
        assert_eq!(optimal_workout_score(0.0, 0.0, 0.0, -5.0), 0.0);
    }
}
