//! nfzstat core - paginated extraction infrastructure
//!
//! Building blocks shared by the NFZ statistics stages: a blocking JSON
//! client, a fixed-delay rate limiter, the page walker, discriminator
//! filtering and CSV manifest I/O.

pub mod client;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod logging;
pub mod manifest;
pub mod pager;
pub mod progress;
pub mod query;
pub mod rate_limit;

// Re-exports for convenience
pub use client::{PageSource, PagedClient, SHARED_RUNTIME, path_segment};
pub use error::{FetchError, ManifestError};
pub use filter::RecordFilter;
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use manifest::{ColumnFilter, ManifestWriter, Row, WriteMode};
pub use pager::{PageCount, PageWalker, WalkOutcome};
pub use progress::{ProgressContext, SharedProgress, UnitProgress, fmt_num};
pub use query::Query;
pub use rate_limit::RateLimiter;
