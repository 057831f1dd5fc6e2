//! Rendered-DOM strategy and the factory wiring API and DOM paths together.

use std::future::Future;
use std::time::Duration;

use jobsift_core::models::{Company, RawFragment};
use jobsift_core::pagination::{AdvanceOutcome, ExtractionStrategy};
use jobsift_core::traits::{PageSession, StrategyFactory};
use jobsift_core::{AppError, Platform, ScanConfig};
use url::Url;

use crate::api::ApiStrategy;
use crate::dom;
use crate::tables::{
    DomTables, GENERIC_TABLES, LOAD_MORE_SELECTORS, NEXT_PAGE_SELECTORS, dom_tables_for,
};

/// Query parameters commonly used for page offsets, tried in order when
/// no pagination control is clickable.
const PAGE_PARAMS: &[&str] = &["page", "p", "pg", "pageNumber", "start", "offset"];

/// Opens fresh page sessions. One session serves one company traversal.
pub trait SessionFactory: Send + Sync {
    type Session: PageSession;

    fn open_session(&self) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}

/// Traverses a career page through a live rendering session.
///
/// Advancement tries, in order: an in-place load-more control, a
/// next-page control, a recognizable page parameter in the URL, and
/// finally infinite scroll detected through content-height growth.
pub struct DomStrategy<S: PageSession> {
    session: S,
    tables: DomTables,
    start_url: String,
    scroll_iterations: u32,
    last_height: f64,
}

impl<S: PageSession> DomStrategy<S> {
    pub fn new(session: S, tables: DomTables, start_url: impl Into<String>, config: &ScanConfig) -> Self {
        Self {
            session,
            tables,
            start_url: start_url.into(),
            scroll_iterations: config.scroll_iterations,
            last_height: 0.0,
        }
    }

    async fn settle(&mut self) {
        self.session.await_settled().await;
    }

    /// Increment a known page parameter in the current URL, if present.
    fn next_page_url(current: &str) -> Option<String> {
        let url = Url::parse(current).ok()?;
        for param in PAGE_PARAMS {
            let Some(value) = url.query_pairs().find(|(k, _)| k == param).map(|(_, v)| v.into_owned())
            else {
                continue;
            };
            let Ok(number) = value.parse::<u64>() else {
                continue;
            };
            let mut next = url.clone();
            next.query_pairs_mut().clear().extend_pairs(
                url.query_pairs().map(|(k, v)| {
                    if k == *param {
                        (k.into_owned(), (number + 1).to_string())
                    } else {
                        (k.into_owned(), v.into_owned())
                    }
                }),
            );
            return Some(next.to_string());
        }
        None
    }
}

impl<S: PageSession> ExtractionStrategy for DomStrategy<S> {
    async fn prepare(&mut self) -> Result<(), AppError> {
        self.session.open(&self.start_url).await?;
        self.settle().await;
        self.session.dismiss_overlays().await;
        self.session.scroll_to_exhaustion(self.scroll_iterations).await;
        self.last_height = self.session.scroll_height().await.unwrap_or(0.0);
        Ok(())
    }

    async fn extract(&mut self) -> Result<Vec<RawFragment>, AppError> {
        let html = self.session.content().await?;
        let base = self
            .session
            .current_url()
            .await
            .unwrap_or_else(|_| self.start_url.clone());
        Ok(dom::extract_fragments(&html, &base, &self.tables))
    }

    async fn advance(&mut self) -> Result<AdvanceOutcome, AppError> {
        if self.session.click_any(LOAD_MORE_SELECTORS).await? {
            self.settle().await;
            return Ok(AdvanceOutcome::Advanced);
        }
        if self.session.click_any(NEXT_PAGE_SELECTORS).await? {
            self.settle().await;
            return Ok(AdvanceOutcome::Advanced);
        }

        if let Ok(current) = self.session.current_url().await {
            if let Some(next_url) = Self::next_page_url(&current) {
                self.session.open(&next_url).await?;
                self.settle().await;
                return Ok(AdvanceOutcome::Advanced);
            }
        }

        // Infinite scroll: growth in content height means more arrived.
        self.session.scroll_to_bottom().await?;
        self.settle().await;
        let height = self.session.scroll_height().await?;
        if height > self.last_height {
            self.last_height = height;
            return Ok(AdvanceOutcome::Advanced);
        }
        // None of the advance mechanisms moved the page.
        Ok(AdvanceOutcome::Stuck)
    }
}

/// Either arm of the strategy cascade, behind one type for the factory.
pub enum PlatformStrategy<S: PageSession> {
    Api(ApiStrategy),
    Dom(DomStrategy<S>),
}

impl<S: PageSession> ExtractionStrategy for PlatformStrategy<S> {
    async fn prepare(&mut self) -> Result<(), AppError> {
        match self {
            Self::Api(s) => s.prepare().await,
            Self::Dom(s) => s.prepare().await,
        }
    }

    async fn extract(&mut self) -> Result<Vec<RawFragment>, AppError> {
        match self {
            Self::Api(s) => s.extract().await,
            Self::Dom(s) => s.extract().await,
        }
    }

    async fn advance(&mut self) -> Result<AdvanceOutcome, AppError> {
        match self {
            Self::Api(s) => s.advance().await,
            Self::Dom(s) => s.advance().await,
        }
    }
}

/// Builds the right strategy for a classified company.
///
/// API-backed platforms get an [`ApiStrategy`] when a board token can be
/// read from the career URL; everything else, including API platforms
/// with unreadable tokens, gets a [`DomStrategy`] with platform tables.
pub struct StrategyBuilder<SF: SessionFactory> {
    sessions: SF,
    config: ScanConfig,
    http_timeout: Duration,
}

impl<SF: SessionFactory> StrategyBuilder<SF> {
    pub fn new(sessions: SF, config: ScanConfig) -> Self {
        let http_timeout = config.page_load_timeout;
        Self {
            sessions,
            config,
            http_timeout,
        }
    }

    async fn dom_strategy(
        &self,
        company: &Company,
        tables: DomTables,
    ) -> Result<PlatformStrategy<SF::Session>, AppError> {
        let session = self.sessions.open_session().await?;
        Ok(PlatformStrategy::Dom(DomStrategy::new(
            session,
            tables,
            &company.career_url,
            &self.config,
        )))
    }
}

impl<SF: SessionFactory> StrategyFactory for StrategyBuilder<SF> {
    type Strategy = PlatformStrategy<SF::Session>;

    async fn create(
        &self,
        company: &Company,
        platform: Platform,
    ) -> Result<Self::Strategy, AppError> {
        if platform.is_api_backed() {
            let client = ApiStrategy::client(self.http_timeout)?;
            match ApiStrategy::for_platform(client, platform, &company.career_url) {
                Some(api) => return Ok(PlatformStrategy::Api(api)),
                None => {
                    tracing::warn!(
                        company = %company.name,
                        %platform,
                        "No board token in career URL; using rendered extraction"
                    );
                }
            }
        }
        self.dom_strategy(company, dom_tables_for(platform)).await
    }

    async fn create_fallback(&self, company: &Company) -> Result<Self::Strategy, AppError> {
        self.dom_strategy(company, GENERIC_TABLES).await
    }
}
