//! Analytical store
//!
//! A single-file SQLite database holding the raw table and the four derived
//! tables. `HealthStore` owns the connection; dropping it (or calling
//! [`HealthStore::close`]) releases the file.
//!
//! Every replacement is drop-and-recreate inside one transaction, so a table
//! is either fully old or fully new.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OpenFlags, Row, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::pipeline::DerivedViews;
use crate::types::{
    CorrelationBucket, DailyRecord, DailySummary, DayOfWeek, PersonalRecord, PersonalRecords,
    RecommendationLabel, TrackedMetric, WorkoutRecommendation, WorkoutType,
};

/// Table holding the ingested daily records
pub const RAW_TABLE: &str = "raw_health_metrics";

const RAW_COLUMNS: &str = "date, steps, distance_miles, active_minutes, sleep_hours, \
     sleep_quality, workout_minutes, workout_type, calories_burned, mood_score, energy_level, \
     water_glasses, weight_lbs, resting_heart_rate, hrv, day_of_week";

const SQL_CREATE_RAW: &str = "CREATE TABLE raw_health_metrics (
    date               TEXT PRIMARY KEY,
    steps              INTEGER NOT NULL,
    distance_miles     REAL NOT NULL,
    active_minutes     INTEGER NOT NULL,
    sleep_hours        REAL NOT NULL,
    sleep_quality      REAL NOT NULL,
    workout_minutes    INTEGER NOT NULL,
    workout_type       TEXT,
    calories_burned    INTEGER NOT NULL,
    mood_score         REAL NOT NULL,
    energy_level       REAL NOT NULL,
    water_glasses      INTEGER NOT NULL,
    weight_lbs         REAL NOT NULL,
    resting_heart_rate INTEGER NOT NULL,
    hrv                INTEGER NOT NULL,
    day_of_week        TEXT NOT NULL
)";

const SQL_CREATE_SUMMARY: &str = "CREATE TABLE daily_health_summary (
    metric_date          TEXT PRIMARY KEY,
    day_of_week          TEXT NOT NULL,
    steps                INTEGER NOT NULL,
    sleep_hours          REAL NOT NULL,
    workout_minutes      INTEGER NOT NULL,
    workout_type         TEXT,
    mood_score           REAL NOT NULL,
    energy_level         REAL NOT NULL,
    weight_lbs           REAL NOT NULL,
    hrv                  INTEGER NOT NULL,
    steps_7day_avg       REAL NOT NULL,
    weight_7day_avg      REAL NOT NULL,
    steps_wow_change_pct REAL,
    workout_completed    INTEGER NOT NULL,
    daily_health_score   REAL NOT NULL
)";

const SQL_CREATE_CORRELATIONS: &str = "CREATE TABLE health_correlations (
    correlation_pair TEXT NOT NULL,
    category         TEXT NOT NULL,
    category_order   INTEGER NOT NULL,
    avg_outcome      REAL NOT NULL,
    sample_size      INTEGER NOT NULL,
    PRIMARY KEY (correlation_pair, category)
)";

const SQL_CREATE_RECOMMENDATIONS: &str = "CREATE TABLE workout_recommendations (
    day_of_week               TEXT PRIMARY KEY,
    optimal_workout_score     REAL NOT NULL,
    recommendation            TEXT NOT NULL,
    avg_sleep_by_day          REAL NOT NULL,
    workout_completion_rate   REAL NOT NULL,
    avg_energy                REAL NOT NULL,
    avg_daily_health_score    REAL NOT NULL,
    energy_boost_from_workout REAL NOT NULL,
    mood_boost_from_workout   REAL NOT NULL,
    sample_days               INTEGER NOT NULL
)";

const SQL_CREATE_RECORDS: &str = "CREATE TABLE personal_records (
    metric        TEXT PRIMARY KEY,
    personal_best REAL NOT NULL,
    achieved_date TEXT NOT NULL,
    current_value REAL NOT NULL,
    pct_of_best   REAL
)";

/// Named derived result sets the dashboard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedView {
    DailySummary,
    Correlations,
    WorkoutRecommendations,
    PersonalRecords,
}

impl DerivedView {
    pub const ALL: [DerivedView; 4] = [
        DerivedView::DailySummary,
        DerivedView::Correlations,
        DerivedView::WorkoutRecommendations,
        DerivedView::PersonalRecords,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            DerivedView::DailySummary => "daily_health_summary",
            DerivedView::Correlations => "health_correlations",
            DerivedView::WorkoutRecommendations => "workout_recommendations",
            DerivedView::PersonalRecords => "personal_records",
        }
    }

    fn create_sql(&self) -> &'static str {
        match self {
            DerivedView::DailySummary => SQL_CREATE_SUMMARY,
            DerivedView::Correlations => SQL_CREATE_CORRELATIONS,
            DerivedView::WorkoutRecommendations => SQL_CREATE_RECOMMENDATIONS,
            DerivedView::PersonalRecords => SQL_CREATE_RECORDS,
        }
    }
}

impl fmt::Display for DerivedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Aggregate statistics over the raw table, used to sanity-check a load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    pub row_count: u32,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub avg_steps: Option<f64>,
    pub avg_sleep: Option<f64>,
    pub avg_mood: Option<f64>,
    /// Days with `workout_minutes > 0`
    pub workout_days: u32,
}

/// Handle over the analytical store
pub struct HealthStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl HealthStore {
    /// Open or create a database file, creating its parent directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened health store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing database without write access
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// File backing this store, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error the implicit drop would hide
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| AnalyticsError::Database(e))
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn view_exists(&self, view: DerivedView) -> Result<bool> {
        self.table_exists(view.table_name())
    }

    /// Row count of the raw table or a derived table
    pub fn row_count(&self, table: &str) -> Result<u32> {
        let known = table == RAW_TABLE || DerivedView::ALL.iter().any(|v| v.table_name() == table);
        if !known {
            return Err(AnalyticsError::MissingView(table.to_string()));
        }
        if !self.table_exists(table)? {
            return Err(AnalyticsError::MissingView(table.to_string()));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Drop and recreate the raw table with exactly `records`
    pub fn replace_raw_records(&mut self, records: &[DailyRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {RAW_TABLE}; {SQL_CREATE_RAW};"))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {RAW_TABLE} ({RAW_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ))?;
            for r in records {
                stmt.execute(params![
                    r.date,
                    r.steps,
                    r.distance_miles,
                    r.active_minutes,
                    r.sleep_hours,
                    r.sleep_quality,
                    r.workout_minutes,
                    r.workout_type,
                    r.calories_burned,
                    r.mood_score,
                    r.energy_level,
                    r.water_glasses,
                    r.weight_lbs,
                    r.resting_heart_rate,
                    r.hrv,
                    r.day_of_week,
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = records.len(), table = RAW_TABLE, "replaced table");
        Ok(records.len())
    }

    /// All raw records in date order
    pub fn raw_records(&self) -> Result<Vec<DailyRecord>> {
        self.query_raw(None)
    }

    /// The first `limit` raw records in date order
    pub fn sample_records(&self, limit: u32) -> Result<Vec<DailyRecord>> {
        self.query_raw(Some(limit))
    }

    fn query_raw(&self, limit: Option<u32>) -> Result<Vec<DailyRecord>> {
        if !self.table_exists(RAW_TABLE)? {
            return Err(AnalyticsError::MissingView(RAW_TABLE.to_string()));
        }
        let limit_clause = limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RAW_COLUMNS} FROM {RAW_TABLE} ORDER BY date{limit_clause}"
        ))?;
        let rows = stmt
            .query_map([], raw_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Row count and averages of the raw table
    pub fn raw_stats(&self) -> Result<RawStats> {
        if !self.table_exists(RAW_TABLE)? {
            return Err(AnalyticsError::MissingView(RAW_TABLE.to_string()));
        }
        let stats = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), MIN(date), MAX(date), AVG(steps), AVG(sleep_hours), \
                 AVG(mood_score), COUNT(CASE WHEN workout_minutes > 0 THEN 1 END) \
                 FROM {RAW_TABLE}"
            ),
            [],
            |row| {
                Ok(RawStats {
                    row_count: row.get(0)?,
                    first_date: row.get(1)?,
                    last_date: row.get(2)?,
                    avg_steps: row.get(3)?,
                    avg_sleep: row.get(4)?,
                    avg_mood: row.get(5)?,
                    workout_days: row.get(6)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Drop and recreate all four derived tables from `views` in one transaction
    pub fn replace_views(&mut self, views: &DerivedViews) -> Result<()> {
        let tx = self.conn.transaction()?;
        for view in DerivedView::ALL {
            recreate(&tx, view)?;
        }
        write_summary(&tx, &views.daily_summary)?;
        write_correlations(&tx, &views.correlations)?;
        write_recommendations(&tx, &views.workout_recommendations)?;
        write_personal_records(&tx, &views.personal_records)?;
        tx.commit()?;
        Ok(())
    }

    fn require_view(&self, view: DerivedView) -> Result<()> {
        if self.view_exists(view)? {
            Ok(())
        } else {
            Err(AnalyticsError::MissingView(view.table_name().to_string()))
        }
    }

    /// `daily_health_summary`, oldest first
    pub fn daily_summary(&self) -> Result<Vec<DailySummary>> {
        self.require_view(DerivedView::DailySummary)?;
        let mut stmt = self.conn.prepare(
            "SELECT metric_date, day_of_week, steps, sleep_hours, workout_minutes, workout_type, \
             mood_score, energy_level, weight_lbs, hrv, steps_7day_avg, weight_7day_avg, \
             steps_wow_change_pct, workout_completed, daily_health_score \
             FROM daily_health_summary ORDER BY metric_date",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DailySummary {
                    metric_date: row.get("metric_date")?,
                    day_of_week: row.get("day_of_week")?,
                    steps: row.get("steps")?,
                    sleep_hours: row.get("sleep_hours")?,
                    workout_minutes: row.get("workout_minutes")?,
                    workout_type: row.get("workout_type")?,
                    mood_score: row.get("mood_score")?,
                    energy_level: row.get("energy_level")?,
                    weight_lbs: row.get("weight_lbs")?,
                    hrv: row.get("hrv")?,
                    steps_7day_avg: row.get("steps_7day_avg")?,
                    weight_7day_avg: row.get("weight_7day_avg")?,
                    steps_wow_change_pct: row.get("steps_wow_change_pct")?,
                    workout_completed: row.get("workout_completed")?,
                    daily_health_score: row.get("daily_health_score")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `health_correlations` in pair order, buckets in axis order
    pub fn correlations(&self) -> Result<Vec<CorrelationBucket>> {
        self.require_view(DerivedView::Correlations)?;
        let mut stmt = self.conn.prepare(
            "SELECT correlation_pair, category, category_order, avg_outcome, sample_size \
             FROM health_correlations ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CorrelationBucket {
                    correlation_pair: row.get(0)?,
                    category: row.get(1)?,
                    category_order: row.get(2)?,
                    avg_outcome: row.get(3)?,
                    sample_size: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `workout_recommendations`, best score first
    pub fn workout_recommendations(&self) -> Result<Vec<WorkoutRecommendation>> {
        self.require_view(DerivedView::WorkoutRecommendations)?;
        let mut stmt = self.conn.prepare(
            "SELECT day_of_week, optimal_workout_score, recommendation, avg_sleep_by_day, \
             workout_completion_rate, avg_energy, avg_daily_health_score, \
             energy_boost_from_workout, mood_boost_from_workout, sample_days \
             FROM workout_recommendations ORDER BY optimal_workout_score DESC, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WorkoutRecommendation {
                    day_of_week: row.get(0)?,
                    optimal_workout_score: row.get(1)?,
                    recommendation: row.get(2)?,
                    avg_sleep_by_day: row.get(3)?,
                    workout_completion_rate: row.get(4)?,
                    avg_energy: row.get(5)?,
                    avg_daily_health_score: row.get(6)?,
                    energy_boost_from_workout: row.get(7)?,
                    mood_boost_from_workout: row.get(8)?,
                    sample_days: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `personal_records`, keyed by metric
    pub fn personal_records(&self) -> Result<PersonalRecords> {
        self.require_view(DerivedView::PersonalRecords)?;
        let mut stmt = self.conn.prepare(
            "SELECT metric, personal_best, achieved_date, current_value, pct_of_best \
             FROM personal_records",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PersonalRecord {
                    metric: row.get(0)?,
                    personal_best: row.get(1)?,
                    achieved_date: row.get(2)?,
                    current_value: row.get(3)?,
                    pct_of_best: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(PersonalRecords::new(rows))
    }
}

fn raw_from_row(row: &Row<'_>) -> rusqlite::Result<DailyRecord> {
    Ok(DailyRecord {
        date: row.get("date")?,
        steps: row.get("steps")?,
        distance_miles: row.get("distance_miles")?,
        active_minutes: row.get("active_minutes")?,
        sleep_hours: row.get("sleep_hours")?,
        sleep_quality: row.get("sleep_quality")?,
        workout_minutes: row.get("workout_minutes")?,
        workout_type: row.get("workout_type")?,
        calories_burned: row.get("calories_burned")?,
        mood_score: row.get("mood_score")?,
        energy_level: row.get("energy_level")?,
        water_glasses: row.get("water_glasses")?,
        weight_lbs: row.get("weight_lbs")?,
        resting_heart_rate: row.get("resting_heart_rate")?,
        hrv: row.get("hrv")?,
        day_of_week: row.get("day_of_week")?,
    })
}

fn recreate(tx: &Transaction<'_>, view: DerivedView) -> Result<()> {
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {}; {};",
        view.table_name(),
        view.create_sql()
    ))?;
    debug!(table = view.table_name(), "recreated derived table");
    Ok(())
}

fn write_summary(tx: &Transaction<'_>, rows: &[DailySummary]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO daily_health_summary (metric_date, day_of_week, steps, sleep_hours, \
         workout_minutes, workout_type, mood_score, energy_level, weight_lbs, hrv, \
         steps_7day_avg, weight_7day_avg, steps_wow_change_pct, workout_completed, \
         daily_health_score) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.metric_date,
            r.day_of_week,
            r.steps,
            r.sleep_hours,
            r.workout_minutes,
            r.workout_type,
            r.mood_score,
            r.energy_level,
            r.weight_lbs,
            r.hrv,
            r.steps_7day_avg,
            r.weight_7day_avg,
            r.steps_wow_change_pct,
            r.workout_completed,
            r.daily_health_score,
        ])?;
    }
    Ok(())
}

fn write_correlations(tx: &Transaction<'_>, rows: &[CorrelationBucket]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO health_correlations \
         (correlation_pair, category, category_order, avg_outcome, sample_size) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.correlation_pair,
            r.category,
            r.category_order,
            r.avg_outcome,
            r.sample_size,
        ])?;
    }
    Ok(())
}

fn write_recommendations(tx: &Transaction<'_>, rows: &[WorkoutRecommendation]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO workout_recommendations (day_of_week, optimal_workout_score, \
         recommendation, avg_sleep_by_day, workout_completion_rate, avg_energy, \
         avg_daily_health_score, energy_boost_from_workout, mood_boost_from_workout, \
         sample_days) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.day_of_week,
            r.optimal_workout_score,
            r.recommendation,
            r.avg_sleep_by_day,
            r.workout_completion_rate,
            r.avg_energy,
            r.avg_daily_health_score,
            r.energy_boost_from_workout,
            r.mood_boost_from_workout,
            r.sample_days,
        ])?;
    }
    Ok(())
}

fn write_personal_records(tx: &Transaction<'_>, records: &PersonalRecords) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO personal_records \
         (metric, personal_best, achieved_date, current_value, pct_of_best) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for r in records.iter() {
        stmt.execute(params![
            r.metric,
            r.personal_best,
            r.achieved_date,
            r.current_value,
            r.pct_of_best,
        ])?;
    }
    Ok(())
}

// Enumerations are stored by their display name
macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: AnalyticsError| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

text_column!(DayOfWeek, WorkoutType, RecommendationLabel, TrackedMetric);
