use std::collections::HashSet;
use std::future::Future;

use crate::classify::Platform;
use crate::error::AppError;
use crate::models::{Company, CompanyStatus, Job};
use crate::pagination::ExtractionStrategy;

/// The external tabular store of previously recorded jobs.
///
/// The concrete backend is a collaborator, not part of this engine; any
/// store that can list ids, append rows, and touch per-row markers fits.
pub trait LedgerStore: Send + Sync + Clone {
    /// All job ids currently known to the ledger. Read once per run.
    fn get_existing_ids(&self)
    -> impl Future<Output = Result<HashSet<String>, AppError>> + Send;

    /// Append new jobs. Returns the number of rows written.
    fn append_jobs(&self, jobs: &[Job]) -> impl Future<Output = Result<usize, AppError>> + Send;

    /// Refresh the last-seen marker for existing jobs.
    fn mark_last_seen(&self, ids: &[String])
    -> impl Future<Output = Result<(), AppError>> + Send;

    /// Record the outcome of a company's scrape attempt.
    fn set_company_status(
        &self,
        name: &str,
        status: CompanyStatus,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op LedgerStore for dry runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLedger;

impl LedgerStore for NullLedger {
    async fn get_existing_ids(&self) -> Result<HashSet<String>, AppError> {
        Ok(HashSet::new())
    }

    async fn append_jobs(&self, jobs: &[Job]) -> Result<usize, AppError> {
        Ok(jobs.len())
    }

    async fn mark_last_seen(&self, _ids: &[String]) -> Result<(), AppError> {
        Ok(())
    }

    async fn set_company_status(
        &self,
        _name: &str,
        _status: CompanyStatus,
    ) -> Result<(), AppError> {
        Ok(())
    }
}

/// One live rendering session against a target page.
///
/// Owns the page lifecycle: load-with-retry, post-load settle, overlay
/// dismissal, and scroll assistance. Overlay and scroll failures are
/// swallowed by implementations; they are optimizations, not correctness
/// requirements.
pub trait PageSession: Send {
    /// Navigate to a URL, retrying on transient failures.
    fn open(&mut self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Wait for network quiescence plus a fixed settle delay.
    fn await_settled(&mut self) -> impl Future<Output = ()> + Send;

    /// Best-effort dismissal of consent/cookie overlays. Never fatal.
    fn dismiss_overlays(&mut self) -> impl Future<Output = ()> + Send;

    /// Repeated scroll-and-wait to trigger lazy-loaded content.
    fn scroll_to_exhaustion(&mut self, max_iterations: u32) -> impl Future<Output = ()> + Send;

    /// The fully rendered DOM of the current page.
    fn content(&mut self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Click the first visible element matching any selector, in order.
    /// Returns whether anything was clicked.
    fn click_any(&mut self, selectors: &[&str])
    -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Scrollable content height, for infinite-scroll detection.
    fn scroll_height(&mut self) -> impl Future<Output = Result<f64, AppError>> + Send;

    fn scroll_to_bottom(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Current page URL, for resolving relative links after redirects.
    fn current_url(&mut self) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Creates the right [`ExtractionStrategy`] for a classified company.
pub trait StrategyFactory: Send + Sync {
    type Strategy: ExtractionStrategy;

    fn create(
        &self,
        company: &Company,
        platform: Platform,
    ) -> impl Future<Output = Result<Self::Strategy, AppError>> + Send;

    /// Generic rendered-DOM fallback, used when a vendor API rejects the
    /// request permanently.
    fn create_fallback(
        &self,
        company: &Company,
    ) -> impl Future<Output = Result<Self::Strategy, AppError>> + Send;
}
