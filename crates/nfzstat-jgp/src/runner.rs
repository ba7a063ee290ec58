//! Pipeline orchestration for the JGP statistics stages

use std::fs;
use std::time::{Duration, Instant};

use anyhow::Context;
use nfzstat_core::{PageSource, PagedClient, ProgressContext};

use crate::config::Config;
use crate::stages::{self, StageSummary, detail};
use crate::state::Stage;

/// Outcome of a multi-stage run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stages: Vec<StageSummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.stages.iter().map(|s| s.rows).sum()
    }

    pub fn failed_units(&self) -> usize {
        self.stages.iter().map(|s| s.failed_units).sum()
    }
}

/// HTTP client for the configured API
pub fn connect(config: &Config) -> anyhow::Result<PagedClient> {
    PagedClient::new(config.base_url.as_str(), config.timeout)
        .with_context(|| format!("Cannot build HTTP client for {}", config.base_url))
}

/// Run one stage against the configured API
pub fn run(stage: Stage, config: &Config, progress: &ProgressContext) -> anyhow::Result<StageSummary> {
    let client = connect(config)?;
    run_with(&client, stage, config, progress)
}

/// Run one stage against any page source
pub fn run_with<S: PageSource + ?Sized>(
    source: &S,
    stage: Stage,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Cannot create output directory {}",
            config.output_dir.display()
        )
    })?;
    if let Some(input) = stage.input() {
        log::debug!("{stage} reads the output of {input}");
    }

    let summary = match stage {
        Stage::Benefits => stages::benefits::run(source, config, progress),
        Stage::TableIndex => stages::table_index::run(source, config, progress),
        Stage::GeneralData => detail::run_general_data(source, config, progress),
        Stage::HospitalizationByAge => detail::run_hospitalization_by_age(source, config, progress),
    }
    .with_context(|| format!("Stage {stage} failed"))?;

    summary.log();
    Ok(summary)
}

/// Run all four stages in order against the configured API
pub fn run_all(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    let client = connect(config)?;
    run_all_with(&client, config, progress)
}

/// Run all four stages in order; the first fatal error stops the run.
pub fn run_all_with<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<RunSummary> {
    let start = Instant::now();
    let mut summaries = Vec::with_capacity(Stage::all().len());
    for &stage in Stage::all() {
        summaries.push(run_with(source, stage, config, progress)?);
    }
    Ok(RunSummary {
        stages: summaries,
        elapsed: start.elapsed(),
    })
}
