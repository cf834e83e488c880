//! Dashboard
//!
//! Reads the four derived views through a [`ViewCache`] and assembles a
//! [`DashboardSnapshot`] for one as-of date: today's metric cards, 90-day
//! trends, correlation panels, weekday recommendations, personal-record cards
//! and a trailing 7-day summary. The snapshot renders as text via `Display`
//! or serializes to JSON.
//!
//! Rendering needs at least one summary row on or before the as-of date and a
//! personal record for every tracked metric; both are reported as errors.
//! Record cards are recomputed from the summary rows up to the as-of date, so
//! an earlier as-of date never shows a best set after it.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{ViewCache, ViewData};
use crate::config::{
    DAILY_STEPS_GOAL, GOOD_SLEEP_HOURS, HEALTH_SCORE_TARGET, TREND_LOOKBACK_DAYS,
    WEEK_WINDOW_DAYS,
};
use crate::derive::records::{best_in, pct_of_best};
use crate::derive::rolling::mean;
use crate::derive::round_to;
use crate::error::{AnalyticsError, Result};
use crate::store::{DerivedView, HealthStore};
use crate::types::{
    CorrelationBucket, DailySummary, DayOfWeek, PersonalRecords, TrackedMetric,
    WorkoutRecommendation, WorkoutType,
};
use crate::{PRODUCER_NAME, VERSION};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: usize = 24;

/// Who produced a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStatus {
    Good,
    Low,
}

impl SleepStatus {
    pub fn from_hours(hours: f64) -> Self {
        if hours >= GOOD_SLEEP_HOURS {
            SleepStatus::Good
        } else {
            SleepStatus::Low
        }
    }
}

impl fmt::Display for SleepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepStatus::Good => f.write_str("Good"),
            SleepStatus::Low => f.write_str("Low"),
        }
    }
}

/// Metric cards for the most recent day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodaySnapshot {
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub steps: u32,
    pub steps_wow_change_pct: Option<f64>,
    pub sleep_hours: f64,
    pub sleep_status: SleepStatus,
    pub workout_completed: bool,
    pub workout_minutes: u32,
    pub workout_type: Option<WorkoutType>,
    pub mood_score: f64,
    /// Mean mood over every day up to the as-of date
    pub avg_mood: f64,
    pub daily_health_score: f64,
}

/// One day of the trend charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub steps: u32,
    pub steps_7day_avg: f64,
    pub sleep_hours: f64,
    pub mood_score: f64,
    pub weight_lbs: f64,
    pub weight_7day_avg: f64,
    pub daily_health_score: f64,
}

impl From<&DailySummary> for TrendPoint {
    fn from(row: &DailySummary) -> Self {
        Self {
            date: row.metric_date,
            steps: row.steps,
            steps_7day_avg: row.steps_7day_avg,
            sleep_hours: row.sleep_hours,
            mood_score: row.mood_score,
            weight_lbs: row.weight_lbs,
            weight_7day_avg: row.weight_7day_avg,
            daily_health_score: row.daily_health_score,
        }
    }
}

/// Buckets of one correlation pair, in axis order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPanel {
    pub pair: String,
    pub buckets: Vec<CorrelationBucket>,
}

/// Personal record with progress toward it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCard {
    pub metric: TrackedMetric,
    pub label: String,
    pub personal_best: f64,
    pub achieved_date: NaiveDate,
    pub current_value: f64,
    pub pct_of_best: Option<f64>,
    /// `current_value - personal_best`
    pub delta_from_best: f64,
}

/// Aggregates over the trailing week ending on the as-of date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days in the window that have data
    pub days_with_data: u32,
    pub avg_steps: Option<f64>,
    pub workouts_completed: u32,
    pub window_days: u32,
    pub avg_sleep: Option<f64>,
    pub avg_mood: Option<f64>,
}

/// Everything the dashboard shows for one as-of date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub producer: Producer,
    pub as_of: NaiveDate,
    pub today: TodaySnapshot,
    pub trends: Vec<TrendPoint>,
    pub correlations: Vec<CorrelationPanel>,
    pub recommendations: Vec<WorkoutRecommendation>,
    pub personal_records: Vec<RecordCard>,
    pub this_week: WeeklySummary,
}

impl DashboardSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn record(&self, metric: TrackedMetric) -> Option<&RecordCard> {
        self.personal_records.iter().find(|card| card.metric == metric)
    }
}

/// Read side of the store, with cached view access
pub struct Dashboard<'a> {
    store: &'a HealthStore,
    cache: ViewCache,
    instance_id: String,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a HealthStore) -> Self {
        Self::with_cache(store, ViewCache::default())
    }

    pub fn with_cache(store: &'a HealthStore, cache: ViewCache) -> Self {
        Self {
            store,
            cache,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Use a fixed producer instance id
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Forget cached views; call after the derived tables are rebuilt
    pub fn invalidate(&mut self) {
        self.cache.invalidate_all();
        debug!("dashboard cache invalidated");
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    fn view(&mut self, view: DerivedView) -> Result<ViewData> {
        let store = self.store;
        self.cache.get_or_load(view, || ViewData::load(store, view))
    }

    pub fn daily_summary(&mut self) -> Result<Vec<DailySummary>> {
        match self.view(DerivedView::DailySummary)? {
            ViewData::DailySummary(rows) => Ok(rows),
            other => Err(mismatch(DerivedView::DailySummary, &other)),
        }
    }

    pub fn correlations(&mut self) -> Result<Vec<CorrelationBucket>> {
        match self.view(DerivedView::Correlations)? {
            ViewData::Correlations(rows) => Ok(rows),
            other => Err(mismatch(DerivedView::Correlations, &other)),
        }
    }

    pub fn workout_recommendations(&mut self) -> Result<Vec<WorkoutRecommendation>> {
        match self.view(DerivedView::WorkoutRecommendations)? {
            ViewData::WorkoutRecommendations(rows) => Ok(rows),
            other => Err(mismatch(DerivedView::WorkoutRecommendations, &other)),
        }
    }

    pub fn personal_records(&mut self) -> Result<PersonalRecords> {
        match self.view(DerivedView::PersonalRecords)? {
            ViewData::PersonalRecords(rows) => Ok(rows),
            other => Err(mismatch(DerivedView::PersonalRecords, &other)),
        }
    }

    /// Most recent date in the daily summary
    pub fn latest_date(&mut self) -> Result<NaiveDate> {
        self.daily_summary()?
            .last()
            .map(|row| row.metric_date)
            .ok_or_else(|| empty_summary("daily_health_summary has no rows"))
    }

    /// Assemble the dashboard as seen on `as_of`
    pub fn snapshot(&mut self, as_of: NaiveDate) -> Result<DashboardSnapshot> {
        let summary = self.daily_summary()?;
        let correlations = self.correlations()?;
        let recommendations = self.workout_recommendations()?;
        let records = self.personal_records()?;

        let visible: Vec<&DailySummary> =
            summary.iter().filter(|row| row.metric_date <= as_of).collect();
        let latest = visible.last().copied().ok_or_else(|| {
            empty_summary(&format!("daily_health_summary has no rows on or before {as_of}"))
        })?;

        let today = TodaySnapshot {
            date: latest.metric_date,
            day_of_week: latest.day_of_week,
            steps: latest.steps,
            steps_wow_change_pct: latest.steps_wow_change_pct,
            sleep_hours: latest.sleep_hours,
            sleep_status: SleepStatus::from_hours(latest.sleep_hours),
            workout_completed: latest.workout_completed,
            workout_minutes: latest.workout_minutes,
            workout_type: latest.workout_type,
            mood_score: latest.mood_score,
            avg_mood: round_to(mean(visible.iter().map(|r| r.mood_score)).unwrap_or(0.0), 2),
            daily_health_score: latest.daily_health_score,
        };

        let trend_start = days_before(as_of, TREND_LOOKBACK_DAYS);
        let trends = visible
            .iter()
            .filter(|row| row.metric_date >= trend_start)
            .map(|row| TrendPoint::from(*row))
            .collect();

        let personal_records = TrackedMetric::ALL
            .into_iter()
            .map(|metric| {
                records.require(metric)?;
                let direction = metric.direction();
                let current_value = summary_value(metric, latest);
                let points = visible.iter().map(|r| (r.metric_date, summary_value(metric, r)));
                let (achieved_date, personal_best) =
                    best_in(direction, points).unwrap_or((latest.metric_date, current_value));
                Ok(RecordCard {
                    metric,
                    label: metric.label().to_string(),
                    personal_best,
                    achieved_date,
                    current_value,
                    pct_of_best: pct_of_best(direction, personal_best, current_value),
                    delta_from_best: round_to(current_value - personal_best, 2),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let this_week = weekly_summary(&visible, as_of);

        Ok(DashboardSnapshot {
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            as_of,
            today,
            trends,
            correlations: group_panels(correlations),
            recommendations,
            personal_records,
            this_week,
        })
    }
}

fn mismatch(expected: DerivedView, found: &ViewData) -> AnalyticsError {
    AnalyticsError::InvalidValue(format!("{} cached under {expected}", found.view()))
}

fn summary_value(metric: TrackedMetric, row: &DailySummary) -> f64 {
    match metric {
        TrackedMetric::Steps => f64::from(row.steps),
        TrackedMetric::WorkoutMinutes => f64::from(row.workout_minutes),
        TrackedMetric::Weight => row.weight_lbs,
    }
}

fn empty_summary(detail: &str) -> AnalyticsError {
    AnalyticsError::EmptyView(detail.to_string())
}

fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_sub_days(Days::new(days.unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

/// The trailing window `(as_of - 7 days, as_of]`
fn weekly_summary(visible: &[&DailySummary], as_of: NaiveDate) -> WeeklySummary {
    let after = days_before(as_of, WEEK_WINDOW_DAYS);
    let week: Vec<&DailySummary> = visible
        .iter()
        .copied()
        .filter(|row| row.metric_date > after)
        .collect();

    WeeklySummary {
        start: after.succ_opt().unwrap_or(after),
        end: as_of,
        days_with_data: week.len() as u32,
        avg_steps: mean(week.iter().map(|r| f64::from(r.steps))).map(|v| round_to(v, 1)),
        workouts_completed: week.iter().filter(|r| r.workout_completed).count() as u32,
        window_days: WEEK_WINDOW_DAYS as u32,
        avg_sleep: mean(week.iter().map(|r| r.sleep_hours)).map(|v| round_to(v, 2)),
        avg_mood: mean(week.iter().map(|r| r.mood_score)).map(|v| round_to(v, 2)),
    }
}

/// Group consecutive buckets by pair, keeping first-seen pair order
fn group_panels(buckets: Vec<CorrelationBucket>) -> Vec<CorrelationPanel> {
    let mut panels: Vec<CorrelationPanel> = Vec::new();
    for bucket in buckets {
        match panels.iter_mut().find(|p| p.pair == bucket.correlation_pair) {
            Some(panel) => panel.buckets.push(bucket),
            None => panels.push(CorrelationPanel {
                pair: bucket.correlation_pair.clone(),
                buckets: vec![bucket],
            }),
        }
    }
    for panel in &mut panels {
        panel.buckets.sort_by_key(|b| b.category_order);
    }
    panels
}

// Text rendering

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn sparkline(values: &[f64]) -> String {
    let (min, max) = min_max(values);
    let span = max - min;
    values
        .iter()
        .map(|&v| {
            let level = if span > 0.0 {
                ((v - min) / span * 7.0).round() as usize
            } else {
                3
            };
            SPARK_LEVELS[level.min(7)]
        })
        .collect()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

fn or_na(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "n/a".to_string())
}

impl DashboardSnapshot {
    fn fmt_today(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.today;
        writeln!(f, "Today's Snapshot ({} {})", t.day_of_week, t.date)?;

        let wow = t
            .steps_wow_change_pct
            .map(|pct| format!("  ({pct:+.1}% vs last week)"))
            .unwrap_or_default();
        writeln!(f, "  {:<14}{}{wow}", "Steps", thousands(u64::from(t.steps)))?;
        writeln!(f, "  {:<14}{:.1} hrs  {}", "Sleep", t.sleep_hours, t.sleep_status)?;
        if t.workout_completed {
            let kind = t.workout_type.map(|k| format!(", {k}")).unwrap_or_default();
            writeln!(f, "  {:<14}Done ({} min{kind})", "Workout", t.workout_minutes)?;
        } else {
            writeln!(f, "  {:<14}Skipped", "Workout")?;
        }
        writeln!(f, "  {:<14}{:.1}/10  (avg {:.1})", "Mood", t.mood_score, t.avg_mood)?;
        writeln!(f, "  {:<14}{:.1}/10", "Health Score", t.daily_health_score)
    }

    fn fmt_trends(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trends (last {TREND_LOOKBACK_DAYS} days, {} points)", self.trends.len())?;
        if self.trends.is_empty() {
            return writeln!(f, "  no data in window");
        }

        let steps: Vec<f64> = self.trends.iter().map(|p| f64::from(p.steps)).collect();
        let sleep: Vec<f64> = self.trends.iter().map(|p| p.sleep_hours).collect();
        let mood: Vec<f64> = self.trends.iter().map(|p| p.mood_score).collect();
        let weight: Vec<f64> = self.trends.iter().map(|p| p.weight_lbs).collect();
        let score: Vec<f64> = self.trends.iter().map(|p| p.daily_health_score).collect();
        let last = &self.trends[self.trends.len() - 1];

        let goal_days = steps.iter().filter(|&&s| s >= f64::from(DAILY_STEPS_GOAL)).count();
        writeln!(f, "  {:<14}{}", "Steps", sparkline(&steps))?;
        writeln!(
            f,
            "  {:<14}7-day avg {}, {goal_days} days at the {} goal",
            "",
            thousands(last.steps_7day_avg.round() as u64),
            thousands(u64::from(DAILY_STEPS_GOAL)),
        )?;

        let (sleep_lo, sleep_hi) = min_max(&sleep);
        writeln!(f, "  {:<14}{}", "Sleep", sparkline(&sleep))?;
        writeln!(f, "  {:<14}{sleep_lo:.1} to {sleep_hi:.1} hrs", "")?;

        let (mood_lo, mood_hi) = min_max(&mood);
        writeln!(f, "  {:<14}{}", "Mood", sparkline(&mood))?;
        writeln!(f, "  {:<14}{mood_lo:.1} to {mood_hi:.1}", "")?;

        writeln!(f, "  {:<14}{}", "Weight", sparkline(&weight))?;
        writeln!(f, "  {:<14}7-day trend {:.1} lbs", "", last.weight_7day_avg)?;

        let on_target = score.iter().filter(|&&s| s >= HEALTH_SCORE_TARGET).count();
        writeln!(f, "  {:<14}{}", "Health Score", sparkline(&score))?;
        writeln!(
            f,
            "  {:<14}{on_target} days at or above the {HEALTH_SCORE_TARGET:.1} target",
            ""
        )
    }

    fn fmt_correlations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Health Correlations")?;
        for panel in &self.correlations {
            writeln!(f, "  {}", panel.pair)?;
            let (_, max) = min_max(
                &panel
                    .buckets
                    .iter()
                    .map(|b| b.avg_outcome)
                    .collect::<Vec<_>>(),
            );
            for b in &panel.buckets {
                writeln!(
                    f,
                    "    {:<12}{} {:>5.1}  (n={})",
                    b.category,
                    bar(b.avg_outcome, max),
                    b.avg_outcome,
                    b.sample_size
                )?;
            }
        }
        Ok(())
    }

    fn fmt_recommendations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best Days to Workout")?;
        for r in &self.recommendations {
            writeln!(
                f,
                "  {:<10}{} {:>5.2}  {:>3.0}%",
                r.day_of_week.as_str(),
                bar(r.optimal_workout_score, 10.0),
                r.optimal_workout_score,
                r.workout_completion_rate
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  {:<10}{:<20}{:>10}{:>14}",
            "Day", "Recommendation", "Avg Sleep", "Energy Boost"
        )?;
        for r in &self.recommendations {
            writeln!(
                f,
                "  {:<10}{:<20}{:>10.2}{:>+14.2}",
                r.day_of_week.as_str(),
                r.recommendation.as_str(),
                r.avg_sleep_by_day,
                r.energy_boost_from_workout
            )?;
        }
        Ok(())
    }

    fn fmt_records(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Personal Records")?;
        for card in &self.personal_records {
            let best = match card.metric {
                TrackedMetric::Steps => format!("{} steps", thousands(card.personal_best as u64)),
                TrackedMetric::WorkoutMinutes => format!("{:.0} min", card.personal_best),
                TrackedMetric::Weight => format!("{:.1} lbs", card.personal_best),
            };
            writeln!(f, "  {:<16}{best}, achieved {}", card.label, card.achieved_date)?;

            let progress = or_na(card.pct_of_best, |pct| {
                format!("{} {pct:.0}% of best", bar(pct, 100.0))
            });
            match card.metric {
                TrackedMetric::Weight => writeln!(
                    f,
                    "  {:<16}currently {:.1} lbs ({:+.1}), {progress}",
                    "", card.current_value, card.delta_from_best
                )?,
                _ => writeln!(f, "  {:<16}{progress}", "")?,
            }
        }
        Ok(())
    }

    fn fmt_week(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = &self.this_week;
        writeln!(f, "This Week's Summary ({} to {})", w.start, w.end)?;
        writeln!(
            f,
            "  {:<20}{}",
            "Avg Daily Steps",
            or_na(w.avg_steps, |v| thousands(v.round() as u64))
        )?;
        writeln!(
            f,
            "  {:<20}{}/{}",
            "Workouts Completed", w.workouts_completed, w.window_days
        )?;
        writeln!(
            f,
            "  {:<20}{}",
            "Avg Sleep",
            or_na(w.avg_sleep, |v| format!("{v:.1} hrs"))
        )?;
        write!(
            f,
            "  {:<20}{}",
            "Avg Mood",
            or_na(w.avg_mood, |v| format!("{v:.1}/10"))
        )
    }
}

impl fmt::Display for DashboardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(72);
        writeln!(f, "Personal Health Analytics Dashboard")?;
        writeln!(
            f,
            "{} {} | as of {}",
            self.producer.name, self.producer.version, self.as_of
        )?;
        writeln!(f, "{}", "=".repeat(72))?;
        self.fmt_today(f)?;
        writeln!(f, "{rule}")?;
        self.fmt_trends(f)?;
        writeln!(f, "{rule}")?;
        self.fmt_correlations(f)?;
        writeln!(f, "{rule}")?;
        self.fmt_recommendations(f)?;
        writeln!(f, "{rule}")?;
        self.fmt_records(f)?;
        writeln!(f, "{rule}")?;
        self.fmt_week(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::refresh_views;
    use crate::test_support::{day, flat_series, record};
    use pretty_assertions::assert_eq;

    fn store_with(records: &[crate::types::DailyRecord]) -> HealthStore {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.replace_raw_records(records).unwrap();
        refresh_views(&mut store).unwrap();
        store
    }

    #[test]
    fn test_snapshot_today_and_week() {
        let mut records = flat_series(20, 9_000);
        records[19] = record(day(19), 12_000, 7.0, 40, 9.0);
        records[16] = record(day(16), 9_000, 8.0, 30, 7.0);
        let store = store_with(&records);
        let mut dashboard = Dashboard::new(&store);

        let snapshot = dashboard.snapshot(day(19)).unwrap();

        assert_eq!(snapshot.as_of, day(19));
        assert_eq!(snapshot.today.date, day(19));
        assert_eq!(snapshot.today.steps, 12_000);
        assert_eq!(snapshot.today.sleep_status, SleepStatus::Low);
        assert!(snapshot.today.workout_completed);
        assert_eq!(snapshot.today.workout_minutes, 40);

        let week = &snapshot.this_week;
        assert_eq!(week.start, day(13));
        assert_eq!(week.end, day(19));
        assert_eq!(week.days_with_data, 7);
        assert_eq!(week.workouts_completed, 2);
        assert_eq!(week.window_days, 7);
    }

    #[test]
    fn test_as_of_limits_visible_rows() {
        let store = store_with(&flat_series(20, 9_000));
        let mut dashboard = Dashboard::new(&store);

        let snapshot = dashboard.snapshot(day(9)).unwrap();

        assert_eq!(snapshot.today.date, day(9));
        assert_eq!(snapshot.trends.len(), 10);
        assert_eq!(snapshot.trends.last().unwrap().date, day(9));
    }

    #[test]
    fn test_trends_cover_lookback() {
        let store = store_with(&flat_series(120, 9_000));
        let mut dashboard = Dashboard::new(&store);

        let snapshot = dashboard.snapshot(day(119)).unwrap();

        assert_eq!(snapshot.trends.len(), TREND_LOOKBACK_DAYS as usize + 1);
        assert_eq!(snapshot.trends[0].date, day(119 - TREND_LOOKBACK_DAYS));
    }

    #[test]
    fn test_record_cards_by_metric() {
        let mut records = flat_series(10, 9_000);
        records[3] = record(day(3), 20_000, 8.0, 0, 7.0);
        let store = store_with(&records);
        let mut dashboard = Dashboard::new(&store);

        let snapshot = dashboard.snapshot(day(9)).unwrap();
        let steps = snapshot.record(TrackedMetric::Steps).unwrap();

        assert_eq!(snapshot.personal_records.len(), 3);
        assert_eq!(steps.personal_best, 20_000.0);
        assert_eq!(steps.achieved_date, day(3));
        assert_eq!(steps.pct_of_best, Some(45.0));
        assert_eq!(steps.delta_from_best, -11_000.0);
    }

    #[test]
    fn test_record_cards_follow_as_of() {
        let mut records = flat_series(10, 9_000);
        records[2] = record(day(2), 12_000, 8.0, 0, 7.0);
        records[8] = record(day(8), 20_000, 8.0, 0, 7.0);
        let store = store_with(&records);
        let mut dashboard = Dashboard::new(&store);

        let earlier = dashboard.snapshot(day(5)).unwrap();
        let steps = earlier.record(TrackedMetric::Steps).unwrap();
        assert_eq!(steps.personal_best, 12_000.0);
        assert_eq!(steps.achieved_date, day(2));
        assert_eq!(steps.current_value, 9_000.0);
        assert_eq!(steps.pct_of_best, Some(75.0));
        assert_eq!(steps.delta_from_best, -3_000.0);

        let later = dashboard.snapshot(day(9)).unwrap();
        let steps = later.record(TrackedMetric::Steps).unwrap();
        assert_eq!(steps.personal_best, 20_000.0);
        assert_eq!(steps.achieved_date, day(8));
        assert_eq!(steps.pct_of_best, Some(45.0));
    }

    #[test]
    fn test_correlations_grouped_by_pair() {
        let store = store_with(&flat_series(10, 9_000));
        let mut dashboard = Dashboard::new(&store);

        let snapshot = dashboard.snapshot(day(9)).unwrap();
        let pairs: Vec<&str> = snapshot.correlations.iter().map(|p| p.pair.as_str()).collect();

        assert_eq!(
            pairs,
            vec!["Sleep vs Mood", "Steps vs Mood", "Workout vs Energy", "Sleep vs HRV"]
        );
    }

    #[test]
    fn test_empty_summary_is_an_error() {
        let store = store_with(&[]);
        let mut dashboard = Dashboard::new(&store);

        assert!(matches!(
            dashboard.snapshot(day(0)),
            Err(AnalyticsError::EmptyView(_))
        ));
        assert!(matches!(
            dashboard.latest_date(),
            Err(AnalyticsError::EmptyView(_))
        ));
    }

    #[test]
    fn test_as_of_before_data_is_an_error() {
        let store = store_with(&flat_series(5, 9_000));
        let mut dashboard = Dashboard::new(&store);

        assert!(matches!(
            dashboard.snapshot(day(-1)),
            Err(AnalyticsError::EmptyView(_))
        ));
    }

    #[test]
    fn test_missing_views_are_an_error() {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.replace_raw_records(&flat_series(5, 9_000)).unwrap();
        let mut dashboard = Dashboard::new(&store);

        assert!(matches!(
            dashboard.snapshot(day(4)),
            Err(AnalyticsError::MissingView(_))
        ));
    }

    #[test]
    fn test_views_are_cached() {
        let store = store_with(&flat_series(10, 9_000));
        let mut dashboard = Dashboard::new(&store);

        dashboard.snapshot(day(9)).unwrap();
        assert_eq!(dashboard.cache().len(), 4);

        dashboard.invalidate();
        assert!(dashboard.cache().is_empty());
    }

    #[test]
    fn test_render_text_and_json() {
        let store = store_with(&flat_series(21, 10_500));
        let mut dashboard = Dashboard::new(&store).with_instance_id("test-instance".to_string());
        let snapshot = dashboard.snapshot(day(20)).unwrap();

        let text = snapshot.to_string();
        for heading in [
            "Today's Snapshot",
            "Trends (last 90 days",
            "Health Correlations",
            "Best Days to Workout",
            "Personal Records",
            "This Week's Summary",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("10,500"));

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["producer"]["name"], PRODUCER_NAME);
        assert_eq!(json["producer"]["instance_id"], "test-instance");
        assert_eq!(json["as_of"], "2024-01-21");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(10_000), "10,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(sparkline(&[0.0, 7.0]), "▁█");
        assert_eq!(sparkline(&[5.0, 5.0, 5.0]), "▄▄▄");
        assert_eq!(sparkline(&[]), "");
    }
}
