//! Stage 2: table ids per benefit × year × catalog
//!
//! Appends to the table manifest, so re-running after an interruption only
//! adds rows (possibly duplicates). Duplicate table ids across years and
//! catalogs are kept as returned.

use anyhow::Context;
use nfzstat_core::{
    FetchError, ManifestWriter, PageSource, ProgressContext, Query, RateLimiter, RecordFilter,
    WriteMode, envelope, fmt_num, manifest,
};
use serde_json::Value;

use super::{StageClock, StageSummary, settle};
use crate::config::Config;
use crate::schema::{Cell, TableRow};
use crate::state::{Stage, TableType};

pub const ENDPOINT: &str = "index-of-tables";

/// Query every distinct benefit for every configured year and catalog.
pub fn run<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    let input = config.benefits_path();
    let benefits = manifest::load_unique_column(&input, "name")
        .context("Cannot load benefit list. Run the benefits stage first.")?;

    let clock = StageClock::start(Stage::TableIndex);
    let total = benefits.len() * config.years.len() * config.catalogs.len();
    log::info!(
        "{} benefits × {} years × {} catalogs = {} requests",
        fmt_num(benefits.len()),
        config.years.len(),
        config.catalogs.len(),
        fmt_num(total)
    );

    let path = config.table_index_path();
    let mut writer = ManifestWriter::<TableRow>::open(&path, WriteMode::Append)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let filter = RecordFilter::new(TableType::wanted());
    let limiter = RateLimiter::new(config.delay);
    let mut units = progress.units(Stage::TableIndex.name(), total);
    let mut failed = 0;

    for benefit in &benefits {
        for &year in &config.years {
            for catalog in &config.catalogs {
                let label = format!("{benefit} / {year} / {catalog}");
                let query = Query::new()
                    .with("catalog", catalog)
                    .with("name", benefit)
                    .with("year", year);

                let (rows, error) = match fetch_tables(source, &query, &filter) {
                    Ok(rows) => (rows, None),
                    Err(e) => (Vec::new(), Some(e)),
                };
                let settled = settle(&label, rows, error, config.failure_policy);
                failed += usize::from(settled.failed);
                writer
                    .write_rows(&settled.rows)
                    .with_context(|| format!("Cannot write {}", path.display()))?;

                units.advance(&label);
                limiter.wait();
            }
        }
    }
    units.finish();

    Ok(clock.finish(total, failed, writer.rows_written()))
}

/// One table-index request, reduced to the wanted table descriptors
fn fetch_tables<S: PageSource + ?Sized>(
    source: &S,
    query: &Query,
    filter: &RecordFilter,
) -> Result<Vec<TableRow>, FetchError> {
    let body = source.fetch(ENDPOINT, query)?;
    let tables = envelope::first_year_tables(&body)?;
    Ok(filter.apply(tables).filter_map(table_row).collect())
}

fn table_row(table: &Value) -> Option<TableRow> {
    let id = Cell::from_value(table.get("id").unwrap_or(&Value::Null));
    if id.as_str().is_empty() {
        log::debug!("table descriptor without id: {table}");
        return None;
    }
    Some(TableRow {
        table_id: id.as_str().to_string(),
        table_type: table.get("type")?.as_str()?.to_string(),
    })
}
