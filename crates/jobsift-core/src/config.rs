use std::time::Duration;

/// Default relevance keywords, matched against job titles with word
/// boundaries on both ends.
pub fn default_keywords() -> Vec<String> {
    [
        "data",
        "analyst",
        "analytics",
        "machine learning",
        "ml",
        "data science",
        "data scientist",
        "data engineer",
        "data analyst",
        "business intelligence",
        "bi",
        "ai",
        "artificial intelligence",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Per-run configuration for the scan engine.
///
/// Passed explicitly at construction so tests and individual runs can
/// override any knob without global state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Relevance keywords; a title matching none of them is dropped.
    pub keywords: Vec<String>,
    /// Deadline for a single page load or vendor API request.
    pub page_load_timeout: Duration,
    /// Fixed wait after network idle, for client-side rendering that
    /// completes after the network goes quiet.
    pub settle_delay: Duration,
    /// Politeness delay between pagination steps on one site.
    pub page_delay: Duration,
    /// Politeness delay between companies within a batch.
    pub company_delay: Duration,
    /// Hard ceiling on pages visited per company traversal.
    pub max_pages: u32,
    /// Navigation retry attempts before giving up on a page load.
    pub max_retries: u32,
    /// Lazy-load scroll iterations after a page settles.
    pub scroll_iterations: u32,
    /// Companies per batch; a longer delay separates batches.
    pub companies_per_batch: usize,
    pub batch_delay: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            page_load_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(1),
            page_delay: Duration::from_secs(2),
            company_delay: Duration::from_secs(2),
            max_pages: 50,
            max_retries: 3,
            scroll_iterations: 5,
            companies_per_batch: 10,
            batch_delay: Duration::from_secs(5),
        }
    }
}

impl ScanConfig {
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Zero out every politeness delay. Test use only — hammering real
    /// sites without delays is not acceptable.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.company_delay = Duration::ZERO;
        self.batch_delay = Duration::ZERO;
        self.settle_delay = Duration::ZERO;
        self
    }
}
