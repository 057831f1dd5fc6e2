//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests, shared with
//! downstream crates. All mocks use `Arc<Mutex<_>>` interior mutability so
//! cloned handles observe the same recorded calls.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::classify::Platform;
use crate::error::AppError;
use crate::models::{Company, CompanyStatus, Job, RawFragment};
use crate::pagination::{AdvanceOutcome, ExtractionStrategy};
use crate::traits::{LedgerStore, PageSession, StrategyFactory};

// ---------------------------------------------------------------------------
// MockLedger
// ---------------------------------------------------------------------------

/// In-memory ledger recording every call, with injectable failures.
#[derive(Clone, Default)]
pub struct MockLedger {
    ids: Arc<Mutex<HashSet<String>>>,
    appended: Arc<Mutex<Vec<Job>>>,
    last_seen: Arc<Mutex<Vec<String>>>,
    statuses: Arc<Mutex<Vec<(String, CompanyStatus)>>>,
    append_call_count: Arc<Mutex<usize>>,
    ids_errors: Arc<Mutex<VecDeque<AppError>>>,
    append_errors: Arc<Mutex<VecDeque<AppError>>>,
}

impl MockLedger {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        let ledger = Self::default();
        ledger.ids.lock().unwrap().extend(ids);
        ledger
    }

    /// Queue an error for the next `get_existing_ids` call.
    pub fn push_ids_error(&self, error: AppError) {
        self.ids_errors.lock().unwrap().push_back(error);
    }

    /// Queue an error for the next `append_jobs` call.
    pub fn push_append_error(&self, error: AppError) {
        self.append_errors.lock().unwrap().push_back(error);
    }

    pub fn append_calls(&self) -> usize {
        *self.append_call_count.lock().unwrap()
    }

    pub fn appended(&self) -> Vec<Job> {
        self.appended.lock().unwrap().clone()
    }

    pub fn marked_last_seen(&self) -> Vec<String> {
        self.last_seen.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<(String, CompanyStatus)> {
        self.statuses.lock().unwrap().clone()
    }
}

impl LedgerStore for MockLedger {
    async fn get_existing_ids(&self) -> Result<HashSet<String>, AppError> {
        if let Some(error) = self.ids_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self.ids.lock().unwrap().clone())
    }

    async fn append_jobs(&self, jobs: &[Job]) -> Result<usize, AppError> {
        *self.append_call_count.lock().unwrap() += 1;
        if let Some(error) = self.append_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        let mut ids = self.ids.lock().unwrap();
        for job in jobs {
            ids.insert(job.id.clone());
        }
        self.appended.lock().unwrap().extend(jobs.iter().cloned());
        Ok(jobs.len())
    }

    async fn mark_last_seen(&self, ids: &[String]) -> Result<(), AppError> {
        self.last_seen.lock().unwrap().extend(ids.iter().cloned());
        Ok(())
    }

    async fn set_company_status(
        &self,
        name: &str,
        status: CompanyStatus,
    ) -> Result<(), AppError> {
        self.statuses.lock().unwrap().push((name.to_string(), status));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockStrategy
// ---------------------------------------------------------------------------

enum StrategyMode {
    /// Scripted page/advance queues; an exhausted queue yields an empty
    /// page or `Advanced` respectively.
    Scripted {
        pages: VecDeque<Result<Vec<RawFragment>, AppError>>,
        advances: VecDeque<Result<AdvanceOutcome, AppError>>,
    },
    /// One fresh, unique fragment per page, forever.
    Endless { counter: u32 },
}

/// Scriptable [`ExtractionStrategy`] for controller and engine tests.
#[derive(Clone)]
pub struct MockStrategy {
    mode: Arc<Mutex<StrategyMode>>,
    prepare_error: Arc<Mutex<Option<AppError>>>,
    prepare_calls: Arc<Mutex<usize>>,
}

impl MockStrategy {
    pub fn scripted(
        pages: Vec<Result<Vec<RawFragment>, AppError>>,
        advances: Vec<Result<AdvanceOutcome, AppError>>,
    ) -> Self {
        Self {
            mode: Arc::new(Mutex::new(StrategyMode::Scripted {
                pages: pages.into(),
                advances: advances.into(),
            })),
            prepare_error: Arc::new(Mutex::new(None)),
            prepare_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A strategy producing a fresh fragment on every page, forever.
    pub fn endless() -> Self {
        Self {
            mode: Arc::new(Mutex::new(StrategyMode::Endless { counter: 0 })),
            prepare_error: Arc::new(Mutex::new(None)),
            prepare_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing_prepare(error: AppError) -> Self {
        let strategy = Self::scripted(vec![], vec![]);
        *strategy.prepare_error.lock().unwrap() = Some(error);
        strategy
    }

    pub fn prepare_calls(&self) -> usize {
        *self.prepare_calls.lock().unwrap()
    }
}

impl ExtractionStrategy for MockStrategy {
    async fn prepare(&mut self) -> Result<(), AppError> {
        *self.prepare_calls.lock().unwrap() += 1;
        if let Some(error) = self.prepare_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }

    async fn extract(&mut self) -> Result<Vec<RawFragment>, AppError> {
        let mut mode = self.mode.lock().unwrap();
        match &mut *mode {
            StrategyMode::Scripted { pages, .. } => {
                pages.pop_front().unwrap_or_else(|| Ok(Vec::new()))
            }
            StrategyMode::Endless { counter } => {
                *counter += 1;
                Ok(vec![
                    RawFragment::new(
                        format!("Data Analyst {counter}"),
                        format!("https://x.io/jobs/{counter}"),
                    ),
                ])
            }
        }
    }

    async fn advance(&mut self) -> Result<AdvanceOutcome, AppError> {
        let mut mode = self.mode.lock().unwrap();
        match &mut *mode {
            StrategyMode::Scripted { advances, .. } => advances
                .pop_front()
                .unwrap_or(Ok(AdvanceOutcome::Advanced)),
            StrategyMode::Endless { .. } => Ok(AdvanceOutcome::Advanced),
        }
    }
}

// ---------------------------------------------------------------------------
// MockFactory
// ---------------------------------------------------------------------------

/// Factory handing out pre-built strategies in order, with a separate
/// queue for fallback requests.
#[derive(Clone, Default)]
pub struct MockFactory {
    strategies: Arc<Mutex<VecDeque<MockStrategy>>>,
    fallbacks: Arc<Mutex<VecDeque<MockStrategy>>>,
    /// Platforms requested from `create`, in call order.
    pub requested: Arc<Mutex<Vec<Platform>>>,
    fallback_calls: Arc<Mutex<usize>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_strategy(&self, strategy: MockStrategy) {
        self.strategies.lock().unwrap().push_back(strategy);
    }

    pub fn push_fallback(&self, strategy: MockStrategy) {
        self.fallbacks.lock().unwrap().push_back(strategy);
    }

    pub fn fallback_calls(&self) -> usize {
        *self.fallback_calls.lock().unwrap()
    }
}

impl StrategyFactory for MockFactory {
    type Strategy = MockStrategy;

    async fn create(
        &self,
        _company: &Company,
        platform: Platform,
    ) -> Result<Self::Strategy, AppError> {
        self.requested.lock().unwrap().push(platform);
        Ok(self
            .strategies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockStrategy::scripted(vec![], vec![])))
    }

    async fn create_fallback(&self, _company: &Company) -> Result<Self::Strategy, AppError> {
        *self.fallback_calls.lock().unwrap() += 1;
        Ok(self
            .fallbacks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockStrategy::scripted(vec![], vec![])))
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Scriptable [`PageSession`] for rendered-DOM strategy tests.
#[derive(Clone, Default)]
pub struct MockSession {
    /// HTML returned by successive `content` calls; the last entry repeats.
    html: Arc<Mutex<Vec<String>>>,
    content_cursor: Arc<Mutex<usize>>,
    click_results: Arc<Mutex<VecDeque<bool>>>,
    scroll_heights: Arc<Mutex<VecDeque<f64>>>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub clicked: Arc<Mutex<Vec<String>>>,
    open_errors: Arc<Mutex<VecDeque<AppError>>>,
    url: Arc<Mutex<String>>,
}

impl MockSession {
    pub fn with_html(html: &str) -> Self {
        let session = Self::default();
        session.html.lock().unwrap().push(html.to_string());
        *session.url.lock().unwrap() = "https://x.io/careers".to_string();
        session
    }

    pub fn with_pages<I: IntoIterator<Item = String>>(pages: I) -> Self {
        let session = Self::default();
        session.html.lock().unwrap().extend(pages);
        *session.url.lock().unwrap() = "https://x.io/careers".to_string();
        session
    }

    pub fn push_click_result(&self, clicked: bool) {
        self.click_results.lock().unwrap().push_back(clicked);
    }

    pub fn push_scroll_height(&self, height: f64) {
        self.scroll_heights.lock().unwrap().push_back(height);
    }

    pub fn push_open_error(&self, error: AppError) {
        self.open_errors.lock().unwrap().push_back(error);
    }
}

impl PageSession for MockSession {
    async fn open(&mut self, url: &str) -> Result<(), AppError> {
        if let Some(error) = self.open_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.opened.lock().unwrap().push(url.to_string());
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn await_settled(&mut self) {}

    async fn dismiss_overlays(&mut self) {}

    async fn scroll_to_exhaustion(&mut self, _max_iterations: u32) {}

    async fn content(&mut self) -> Result<String, AppError> {
        let html = self.html.lock().unwrap();
        if html.is_empty() {
            return Ok(String::new());
        }
        let mut cursor = self.content_cursor.lock().unwrap();
        let index = (*cursor).min(html.len() - 1);
        *cursor += 1;
        Ok(html[index].clone())
    }

    async fn click_any(&mut self, selectors: &[&str]) -> Result<bool, AppError> {
        self.clicked
            .lock()
            .unwrap()
            .extend(selectors.iter().map(|s| s.to_string()));
        Ok(self
            .click_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false))
    }

    async fn scroll_height(&mut self) -> Result<f64, AppError> {
        Ok(self
            .scroll_heights
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(1000.0))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, AppError> {
        Ok(self.url.lock().unwrap().clone())
    }
}
