//! Render a dashboard from freshly generated data held in memory

use chrono::NaiveDate;
use health_analytics::{
    load_records, refresh_views, Dashboard, GeneratorConfig, HealthDataGenerator, HealthStore,
};

fn main() -> health_analytics::Result<()> {
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or(NaiveDate::MIN);
    let records = HealthDataGenerator::new(GeneratorConfig::ending(end))?.generate()?;

    let mut store = HealthStore::open_in_memory()?;
    let report = load_records(&mut store, &records)?;
    eprintln!("{report}\n");
    refresh_views(&mut store)?;

    let mut dashboard = Dashboard::new(&store);
    let snapshot = dashboard.snapshot(end)?;
    println!("{snapshot}");
    Ok(())
}
