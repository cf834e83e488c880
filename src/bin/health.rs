//! Health CLI - Command-line interface for health analytics
//!
//! Commands:
//! - generate: Write seeded synthetic daily data to CSV
//! - load: Replace the raw table with a CSV file
//! - refresh: Rebuild the derived views from the raw table
//! - dashboard: Render the dashboard (text or JSON)
//! - run: generate, load, refresh and render in one go
//! - doctor: Diagnose the data file, store and derived views

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use health_analytics::config::{DEFAULT_DATA_PATH, DEFAULT_DB_PATH};
use health_analytics::generator::{write_csv, DEFAULT_LOOKBACK_DAYS, DEFAULT_SEED};
use health_analytics::store::RAW_TABLE;
use health_analytics::{
    load_file, refresh_views, AnalyticsError, Dashboard, DerivedView, GenerationSummary,
    GeneratorConfig, HealthDataGenerator, HealthStore, PRODUCER_NAME, VERSION,
};

/// Health - personal health-metrics analytics
#[derive(Parser)]
#[command(name = "health")]
#[command(version = VERSION)]
#[command(about = "Generate, load, derive and dashboard daily health metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write seeded synthetic daily data to CSV
    Generate {
        /// Output CSV path
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        output: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Replace the raw table with the contents of a CSV file
    Load {
        /// Input CSV path
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,

        /// Database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },

    /// Rebuild the derived views from the raw table
    Refresh {
        /// Database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },

    /// Render the dashboard from the derived views
    Dashboard {
        /// Database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Date to render as "today" (defaults to the latest day with data)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate, load, refresh and render in sequence
    Run {
        /// CSV path written and then loaded
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose the data file, store and derived views
    Doctor {
        /// CSV path
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct GeneratorArgs {
    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Days of history before the end date
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback_days: u32,

    /// Last day of the window (defaults to today)
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl GeneratorArgs {
    fn config(&self) -> GeneratorConfig {
        let end_date = self.end_date.unwrap_or_else(|| Local::now().date_naive());
        GeneratorConfig::ending(end_date)
            .with_seed(self.seed)
            .with_lookback_days(self.lookback_days)
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "health_analytics=info,health=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), HealthCliError> {
    match cli.command {
        Commands::Generate { output, generator } => cmd_generate(&output, &generator),
        Commands::Load { input, db } => cmd_load(&input, &db),
        Commands::Refresh { db } => cmd_refresh(&db),
        Commands::Dashboard { db, as_of, json } => cmd_dashboard(&db, as_of, json),
        Commands::Run {
            data,
            db,
            generator,
            json,
        } => {
            cmd_generate(&data, &generator)?;
            cmd_load(&data, &db)?;
            cmd_refresh(&db)?;
            cmd_dashboard(&db, None, json)
        }
        Commands::Doctor { data, db, json } => cmd_doctor(&data, &db, json),
    }
}

fn cmd_generate(output: &Path, args: &GeneratorArgs) -> Result<(), HealthCliError> {
    let mut generator = HealthDataGenerator::new(args.config())?;
    let records = generator.generate()?;
    write_csv(&records, output)?;

    eprintln!("{}", GenerationSummary::from_records(&records));
    eprintln!("Data saved to {}", output.display());
    Ok(())
}

fn cmd_load(input: &Path, db: &Path) -> Result<(), HealthCliError> {
    let mut store = HealthStore::open(db)?;
    let report = load_file(&mut store, input)?;
    store.close()?;

    eprintln!("{report}");
    Ok(())
}

fn cmd_refresh(db: &Path) -> Result<(), HealthCliError> {
    let mut store = HealthStore::open(db)?;
    let views = refresh_views(&mut store)?;
    store.close()?;

    eprintln!(
        "Refreshed {} summary rows, {} correlation buckets, {} weekday recommendations, {} personal records",
        views.daily_summary.len(),
        views.correlations.len(),
        views.workout_recommendations.len(),
        views.personal_records.len()
    );
    Ok(())
}

fn cmd_dashboard(db: &Path, as_of: Option<NaiveDate>, json: bool) -> Result<(), HealthCliError> {
    if !db.exists() {
        return Err(HealthCliError::MissingDatabase(db.to_path_buf()));
    }
    let store = HealthStore::open_read_only(db)?;
    let mut dashboard = Dashboard::new(&store);

    let as_of = match as_of {
        Some(date) => date,
        None => dashboard.latest_date()?,
    };
    let snapshot = dashboard.snapshot(as_of)?;
    info!(%as_of, trend_points = snapshot.trends.len(), "rendered dashboard");

    if json {
        println!("{}", snapshot.to_json()?);
    } else {
        println!("{snapshot}");
    }
    Ok(())
}

fn cmd_doctor(data: &Path, db: &Path, json: bool) -> Result<(), HealthCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{PRODUCER_NAME} {VERSION}"),
    });

    // A missing CSV only matters before the first load
    checks.push(if data.exists() {
        DoctorCheck::ok("data_file", format!("{} exists", data.display()))
    } else {
        DoctorCheck::warning("data_file", format!("{} does not exist", data.display()))
    });

    if db.exists() {
        match HealthStore::open_read_only(db) {
            Ok(store) => {
                checks.push(DoctorCheck::ok("database", format!("{} opened", db.display())));
                checks.push(table_check(&store, RAW_TABLE));
                for view in DerivedView::ALL {
                    checks.push(table_check(&store, view.table_name()));
                }
            }
            Err(e) => checks.push(DoctorCheck::error(
                "database",
                format!("Cannot open {}: {e}", db.display()),
            )),
        }
    } else {
        checks.push(DoctorCheck::error(
            "database",
            format!("{} does not exist", db.display()),
        ));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Health Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HealthCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn table_check(store: &HealthStore, table: &str) -> DoctorCheck {
    match store.row_count(table) {
        Ok(0) => DoctorCheck::warning(table, "table is empty".to_string()),
        Ok(rows) => DoctorCheck::ok(table, format!("{rows} rows")),
        Err(AnalyticsError::MissingView(_)) => {
            DoctorCheck::error(table, "table does not exist".to_string())
        }
        Err(e) => DoctorCheck::error(table, e.to_string()),
    }
}

// Error types

#[derive(Debug)]
enum HealthCliError {
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    MissingDatabase(PathBuf),
    DoctorFailed,
}

impl From<AnalyticsError> for HealthCliError {
    fn from(e: AnalyticsError) -> Self {
        HealthCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for HealthCliError {
    fn from(e: serde_json::Error) -> Self {
        HealthCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        CliError {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<HealthCliError> for CliError {
    fn from(e: HealthCliError) -> Self {
        match e {
            HealthCliError::Analytics(e) => {
                let message = e.to_string();
                match e {
                    AnalyticsError::Io(_) => {
                        CliError::new("IO_ERROR", message, "Check file paths and permissions")
                    }
                    AnalyticsError::Csv(_) => CliError::new(
                        "CSV_ERROR",
                        message,
                        "Regenerate the data file with 'health generate'",
                    ),
                    AnalyticsError::Database(_) => CliError::new(
                        "DATABASE_ERROR",
                        message,
                        "Run 'health doctor' to inspect the store",
                    ),
                    AnalyticsError::Json(_) => {
                        CliError::new("JSON_ERROR", message, "Check JSON syntax")
                    }
                    AnalyticsError::InvalidRecord(_) => CliError::new(
                        "VALIDATION_ERROR",
                        message,
                        "Fix or regenerate the offending rows and reload",
                    ),
                    AnalyticsError::InvalidParameter(_) | AnalyticsError::InvalidWindow(_) => {
                        CliError::new(
                            "INVALID_ARGUMENT",
                            message,
                            "Check --seed, --lookback-days and --end-date",
                        )
                    }
                    AnalyticsError::MissingView(_) => CliError::new(
                        "MISSING_VIEW",
                        message,
                        "Run 'health load' and 'health refresh' first",
                    ),
                    AnalyticsError::EmptyView(_) => CliError::new(
                        "EMPTY_VIEW",
                        message,
                        "Load data covering the requested date, then refresh",
                    ),
                    AnalyticsError::InvalidValue(_) | AnalyticsError::MissingRecord(_) => {
                        CliError::new(
                            "CORRUPT_VIEW",
                            message,
                            "Run 'health refresh' to rebuild the derived views",
                        )
                    }
                }
            }
            HealthCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            HealthCliError::MissingDatabase(path) => CliError::new(
                "MISSING_DATABASE",
                format!("{} does not exist", path.display()),
                "Run 'health run' to build the store",
            ),
            HealthCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message,
        }
    }

    fn warning(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message,
        }
    }

    fn error(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
