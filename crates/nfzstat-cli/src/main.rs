//! nfzstat - NFZ hospital statistics extraction
//!
//! Pulls the public JGP statistics API into four CSV files: benefit names,
//! the table index, and the general-data and hospitalization-by-age records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use nfzstat_core::{ProgressContext, SharedProgress, Verbosity, fmt_num};
use nfzstat_jgp::{Stage, StageSummary};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "nfzstat")]
#[command(about = "Extract NFZ JGP hospital statistics into CSV files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./nfzstat.toml or ~/.config/nfzstat/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch benefit names into the benefit list
    Benefits,
    /// Look up table ids for every benefit, year and catalog (appends)
    IndexOfTables,
    /// Fetch general-data records for every indexed table
    GeneralData,
    /// Fetch hospitalization-by-age records for every indexed table
    HospitalizationByAge,
    /// Run all four stages in order
    All,
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress: SharedProgress = Arc::new(ProgressContext::new());
    let multi = progress.is_tty().then(|| progress.multi());
    nfzstat_core::init_logging(Verbosity::from_flags(cli.quiet, cli.debug), multi);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let pipeline = config.pipeline()?;

    let stage = match cli.command {
        Command::Benefits => Stage::Benefits,
        Command::IndexOfTables => Stage::TableIndex,
        Command::GeneralData => Stage::GeneralData,
        Command::HospitalizationByAge => Stage::HospitalizationByAge,
        Command::All => {
            let summary = nfzstat_jgp::run_all(&pipeline, &progress)?;
            print_summary(&summary.stages);
            log::info!(
                "Finished {} stages: {} rows, {} failed units in {:.1}s",
                summary.stages.len(),
                fmt_num(summary.total_rows()),
                fmt_num(summary.failed_units()),
                summary.elapsed.as_secs_f64()
            );
            return Ok(());
        }
        Command::Config => {
            print_config(&config, &pipeline);
            return Ok(());
        }
    };

    let summary = nfzstat_jgp::run(stage, &pipeline, &progress)?;
    print_summary(std::slice::from_ref(&summary));
    Ok(())
}

fn new_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn print_summary(stages: &[StageSummary]) {
    let mut table = new_table(["Stage", "Units", "Failed", "Rows", "Time"]);
    for s in stages {
        let failed = Cell::new(fmt_num(s.failed_units));
        table.add_row(vec![
            Cell::new(s.stage),
            Cell::new(fmt_num(s.units)),
            if s.failed_units > 0 {
                failed.fg(Color::Yellow)
            } else {
                failed
            },
            Cell::new(fmt_num(s.rows)),
            Cell::new(format!("{:.1}s", s.elapsed.as_secs_f64())),
        ]);
    }
    eprintln!("\n{table}");
}

fn print_config(config: &Config, pipeline: &nfzstat_jgp::Config) {
    let mut table = new_table(["Setting", "Value"]);

    table.add_row(vec!["API base URL", &pipeline.base_url]);
    table.add_row(vec!["Timeout", &format!("{}s", config.api.timeout_secs)]);
    table.add_row(vec!["Delay", &format!("{}ms", config.api.delay_ms)]);
    table.add_row(vec!["Page limit", &pipeline.page_limit.to_string()]);
    table.add_row(vec![
        "Output directory",
        &pipeline.output_dir.display().to_string(),
    ]);
    for (label, path) in [
        ("Benefits file", pipeline.benefits_path()),
        ("Table index file", pipeline.table_index_path()),
        ("General data file", pipeline.general_data_path()),
        ("Hospitalization file", pipeline.hospitalization_by_age_path()),
    ] {
        table.add_row(vec![label, &path.display().to_string()]);
    }
    let years: Vec<String> = pipeline.years.iter().map(u16::to_string).collect();
    table.add_row(vec!["Years", &years.join(", ")]);
    table.add_row(vec!["Catalogs", &pipeline.catalogs.join(", ")]);
    table.add_row(vec!["Failure policy", &config.run.failure_policy]);

    eprintln!("\n{table}");
}
