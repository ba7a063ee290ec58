//! nfzstat JGP - NFZ hospital statistics (JGP) extraction pipeline
//!
//! Four stages, each reading the previous stage's CSV output:
//! benefit names, table ids per benefit × year × catalog, then the
//! general-data and hospitalization-by-age records of every table.
//!
//! # Example
//!
//! ```no_run
//! use nfzstat_core::ProgressContext;
//! use nfzstat_jgp::{Config, Stage, run};
//!
//! let config = Config {
//!     years: vec![2020],
//!     ..Default::default()
//! };
//!
//! let summary = run(Stage::Benefits, &config, &ProgressContext::new()).expect("Stage failed");
//! println!("Wrote {} benefit names", summary.rows);
//! ```

pub mod config;
pub mod runner;
pub mod schema;
pub mod stages;
pub mod state;

// Re-exports for convenience
pub use config::{Config, FailurePolicy};
pub use runner::{RunSummary, run, run_all, run_all_with, run_with};
pub use stages::StageSummary;
pub use state::{Stage, TableType};
