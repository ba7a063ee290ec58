//! Stage 1: benefit names

use anyhow::Context;
use nfzstat_core::{
    PageCount, PageSource, PageWalker, ProgressContext, Query, RateLimiter, WriteMode, envelope,
    manifest,
};
use serde_json::Value;

use super::{StageClock, StageSummary, settle, split_outcome};
use crate::config::Config;
use crate::schema::{BenefitRow, clean_benefit_name};
use crate::state::Stage;

pub const ENDPOINT: &str = "benefits";

/// Catalog the listing is requested for; the name set is catalog-independent
const LISTING_CATALOG: &str = "1a";

/// Fetch every benefit name and overwrite the benefit manifest.
pub fn run<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    let clock = StageClock::start(Stage::Benefits);
    let path = config.benefits_path();

    let walker = PageWalker::new(
        config.page_limit,
        PageCount::FloorPlusOne,
        RateLimiter::new(config.delay),
    );
    let template = Query::new()
        .with("benefit", "")
        .with("catalog", LISTING_CATALOG)
        .with("format", "json");

    let mut units = progress.units(Stage::Benefits.name(), 1);
    let (records, error) =
        split_outcome(walker.walk(source, ENDPOINT, &template, envelope::FLAT_RECORDS));
    let rows: Vec<BenefitRow> = records.iter().filter_map(benefit_row).collect();
    let settled = settle("benefit listing", rows, error, config.failure_policy);
    units.advance("benefit listing");
    units.finish();

    // A failed listing leaves an existing list in place.
    if settled.failed && settled.rows.is_empty() && path.exists() {
        log::warn!(
            "Benefit listing failed, keeping existing {}",
            path.display()
        );
        return Ok(clock.finish_unchanged(1, 1));
    }

    let written = manifest::write(&path, &settled.rows, WriteMode::Overwrite)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    log::info!("Saved {written} benefit names to {}", path.display());

    Ok(clock.finish(1, usize::from(settled.failed), written))
}

fn benefit_row(item: &Value) -> Option<BenefitRow> {
    match item.get("name").and_then(Value::as_str) {
        Some(name) => Some(BenefitRow {
            name: clean_benefit_name(name),
        }),
        None => {
            log::debug!("benefit item without name: {item}");
            None
        }
    }
}
