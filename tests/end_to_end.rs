//! End-to-end: generate → CSV → load → refresh → dashboard

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use health_analytics::derive::summary::{HealthScore, STEPS_POINTS};
use health_analytics::generator::write_csv;
use health_analytics::{
    load_file, load_records, refresh_views, Dashboard, DailyRecord, DerivedView,
    GeneratorConfig, HealthDataGenerator, HealthStore, RecommendationLabel, TrackedMetric,
};

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn generate(lookback_days: u32) -> Vec<DailyRecord> {
    let config = GeneratorConfig::ending(end_date()).with_lookback_days(lookback_days);
    HealthDataGenerator::new(config).unwrap().generate().unwrap()
}

#[test]
fn test_full_pipeline_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("data").join("health_metrics.csv");
    let db_path = dir.path().join("health_analytics").join("health_analytics.db");

    write_csv(&generate(180), &csv_path).unwrap();

    let mut store = HealthStore::open(&db_path).unwrap();
    let report = load_file(&mut store, &csv_path).unwrap();
    assert_eq!(report.row_count, 181);
    assert_eq!(report.sample.len(), 3);

    let views = refresh_views(&mut store).unwrap();
    assert_eq!(views.daily_summary.len(), 181);
    assert_eq!(views.workout_recommendations.len(), 7);
    assert_eq!(views.personal_records.len(), 3);
    store.close().unwrap();

    let store = HealthStore::open_read_only(&db_path).unwrap();
    for view in DerivedView::ALL {
        assert!(store.view_exists(view).unwrap(), "{view} missing");
    }

    let mut dashboard = Dashboard::new(&store);
    let as_of = dashboard.latest_date().unwrap();
    assert_eq!(as_of, end_date());

    let snapshot = dashboard.snapshot(as_of).unwrap();
    assert_eq!(snapshot.today.date, end_date());
    assert_eq!(snapshot.trends.len(), 91);
    assert_eq!(snapshot.this_week.days_with_data, 7);
    assert_eq!(snapshot.personal_records.len(), 3);
    assert!(snapshot.this_week.workouts_completed <= 7);

    // Recommendations arrive best first with labels matching their scores
    for pair in snapshot.recommendations.windows(2) {
        assert!(pair[0].optimal_workout_score >= pair[1].optimal_workout_score);
    }
    for rec in &snapshot.recommendations {
        assert_eq!(
            rec.recommendation,
            RecommendationLabel::from_score(rec.optimal_workout_score)
        );
    }

    let steps = snapshot.record(TrackedMetric::Steps).unwrap();
    let raw_max = generate(180).iter().map(|r| r.steps).max().unwrap();
    assert_eq!(steps.personal_best, f64::from(raw_max));

    assert!(!snapshot.to_string().is_empty());
}

#[test]
fn test_fixed_steps_saturate_score_and_rolling_average() {
    let records: Vec<DailyRecord> = generate(13)
        .into_iter()
        .map(|mut r| {
            r.steps = 10_000;
            r.distance_miles = 4.0;
            r.active_minutes = r.workout_minutes + 100;
            r
        })
        .collect();
    assert_eq!(records.len(), 14);

    let mut store = HealthStore::open_in_memory().unwrap();
    load_records(&mut store, &records).unwrap();
    refresh_views(&mut store).unwrap();
    let summary = store.daily_summary().unwrap();

    assert_eq!(summary.len(), 14);
    for (i, row) in summary.iter().enumerate() {
        let score = HealthScore::compute(
            row.steps,
            row.sleep_hours,
            row.workout_completed,
            row.mood_score,
        );
        assert_eq!(score.steps, STEPS_POINTS, "day {i}");
        assert!((0.0..=10.0).contains(&row.daily_health_score));
        assert!((row.daily_health_score - (score.total() * 100.0).round() / 100.0).abs() < 1e-9);

        if i >= 6 {
            assert_eq!(row.steps_7day_avg, 10_000.0, "day {i}");
        }
        if i < 7 {
            assert_eq!(row.steps_wow_change_pct, None, "day {i}");
        } else {
            assert_eq!(row.steps_wow_change_pct, Some(0.0), "day {i}");
        }
    }
}

#[test]
fn test_reload_replaces_rather_than_accumulates() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("health_metrics.csv");
    write_csv(&generate(30), &csv_path).unwrap();

    let mut store = HealthStore::open(dir.path().join("health.db")).unwrap();
    let first = load_file(&mut store, &csv_path).unwrap();
    refresh_views(&mut store).unwrap();
    let second = load_file(&mut store, &csv_path).unwrap();
    let views = refresh_views(&mut store).unwrap();

    assert_eq!(first.stats, second.stats);
    assert_eq!(views.daily_summary.len(), 31);
}

#[test]
fn test_same_seed_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");

    write_csv(&generate(180), &a).unwrap();
    write_csv(&generate(180), &b).unwrap();

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}
