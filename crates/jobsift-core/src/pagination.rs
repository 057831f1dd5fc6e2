//! Traversal of paginated, load-more, and infinite-scroll job listings.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::builder::canonical_url_path;
use crate::error::AppError;
use crate::models::RawFragment;

/// Result of one advance attempt on a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the next page / loaded more content.
    Advanced,
    /// The strategy knows there is no more content (e.g. API offset past
    /// the reported total).
    End,
    /// No advance control worked and the UI did not change.
    Stuck,
}

/// One extraction strategy driven through successive pages.
///
/// Implementations are stateful: `extract` reads the current page or
/// offset, `advance` moves to the next one.
pub trait ExtractionStrategy: Send {
    /// One-time setup before the first extraction (initial navigation).
    /// Failure here is a company-level failure.
    fn prepare(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Pull raw fragments from the current page or offset.
    fn extract(&mut self) -> impl Future<Output = Result<Vec<RawFragment>, AppError>> + Send;

    /// Attempt to move to the next page, in strategy-specific priority
    /// order (load-more control, next control, infinite scroll).
    fn advance(&mut self) -> impl Future<Output = Result<AdvanceOutcome, AppError>> + Send;
}

/// Traversal phases. `Stuck` and `Exhausted` are terminal; a stuck
/// traversal is reported as exhausted with the `stuck` flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalPhase {
    Initial,
    Advancing,
    Stuck,
    Exhausted,
}

/// Per-traversal bookkeeping, owned by one controller run and discarded
/// afterwards. Never attached to long-lived scraper state.
#[derive(Debug, Default)]
pub struct PaginationState {
    pub pages_visited: u32,
    pub seen_urls: HashSet<String>,
    pub consecutive_empty_pages: u32,
}

/// What a finished traversal produced.
#[derive(Debug)]
pub struct TraversalOutcome {
    /// Fragments deduplicated by canonical URL, in discovery order.
    pub fragments: Vec<RawFragment>,
    pub pages_visited: u32,
    /// True when the traversal ended because no advance control worked,
    /// rather than by running out of new content.
    pub stuck: bool,
}

/// Drives an [`ExtractionStrategy`] page by page until exhaustion.
///
/// Termination is guaranteed three ways: an empty pass beyond page 1, a
/// failed advance, or the hard page ceiling — whichever comes first.
#[derive(Debug, Clone)]
pub struct PaginationController {
    max_pages: u32,
    page_delay: Duration,
}

/// Empty passes beyond page 1 tolerated before giving up.
const EMPTY_PAGE_THRESHOLD: u32 = 1;

impl PaginationController {
    pub fn new(max_pages: u32, page_delay: Duration) -> Self {
        Self {
            max_pages: max_pages.max(1),
            page_delay,
        }
    }

    pub async fn run<S: ExtractionStrategy>(
        &self,
        strategy: &mut S,
    ) -> Result<TraversalOutcome, AppError> {
        strategy.prepare().await?;

        let mut state = PaginationState::default();
        let mut phase = TraversalPhase::Initial;
        let mut collected: Vec<RawFragment> = Vec::new();

        loop {
            state.pages_visited += 1;

            let fragments = match strategy.extract().await {
                Ok(fragments) => fragments,
                Err(e) if e.degrades_to_empty() => {
                    tracing::warn!(
                        page = state.pages_visited,
                        error = %e,
                        "Extraction pass failed; counting as empty"
                    );
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            let mut new_count = 0usize;
            for fragment in fragments {
                let key = canonical_url_path(&fragment.url);
                if key.is_empty() {
                    continue;
                }
                if state.seen_urls.insert(key) {
                    new_count += 1;
                    collected.push(fragment);
                }
            }
            tracing::debug!(
                page = state.pages_visited,
                new = new_count,
                total = collected.len(),
                "Extraction pass complete"
            );

            if new_count == 0 {
                if state.pages_visited > 1 {
                    state.consecutive_empty_pages += 1;
                    if state.consecutive_empty_pages >= EMPTY_PAGE_THRESHOLD {
                        phase = TraversalPhase::Exhausted;
                        break;
                    }
                }
            } else {
                state.consecutive_empty_pages = 0;
            }

            if state.pages_visited >= self.max_pages {
                tracing::debug!(max_pages = self.max_pages, "Page ceiling reached");
                phase = TraversalPhase::Exhausted;
                break;
            }

            match strategy.advance().await {
                Ok(AdvanceOutcome::Advanced) => phase = TraversalPhase::Advancing,
                Ok(AdvanceOutcome::End) => {
                    phase = TraversalPhase::Exhausted;
                    break;
                }
                Ok(AdvanceOutcome::Stuck) => {
                    phase = TraversalPhase::Stuck;
                    break;
                }
                Err(e) if e.degrades_to_empty() => {
                    tracing::warn!(page = state.pages_visited, error = %e, "Advance failed");
                    phase = TraversalPhase::Stuck;
                    break;
                }
                Err(e) => return Err(e),
            }

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        Ok(TraversalOutcome {
            fragments: collected,
            pages_visited: state.pages_visited,
            stuck: phase == TraversalPhase::Stuck,
        })
    }
}
