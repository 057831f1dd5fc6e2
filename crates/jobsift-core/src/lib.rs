pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod keyword;
pub mod models;
pub mod pagination;
pub mod reconcile;
pub mod retry;
pub mod runner;
pub mod scan;
pub mod testutil;
pub mod traits;

pub use builder::{JobRecordBuilder, canonical_url_path, normalize_whitespace, resolve_url};
pub use classify::{Platform, classify};
pub use config::ScanConfig;
pub use error::AppError;
pub use keyword::KeywordMatcher;
pub use models::{Company, CompanyStatus, Job, RawFragment, ScanStats};
pub use pagination::{AdvanceOutcome, ExtractionStrategy, PaginationController, TraversalOutcome};
pub use reconcile::{LedgerSnapshot, Reconciled};
pub use retry::{RetryPolicy, RetryingLedger};
pub use runner::{ScanEvent, ScanReporter, ScanRunner, TracingReporter};
pub use scan::ScanService;
pub use traits::{LedgerStore, NullLedger, PageSession, StrategyFactory};
