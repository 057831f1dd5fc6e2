use thiserror::Error;

/// Application-wide error types for jobsift.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page load or request exceeded its deadline.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Navigation refused by the target site (anti-bot wall, interstitial).
    #[error("Navigation blocked: {0}")]
    Blocked(String),

    /// No extraction pattern in the cascade matched the page.
    #[error("No extraction pattern matched: {0}")]
    NoMatch(String),

    /// Vendor API returned a body we could not parse.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Non-success HTTP status from a vendor endpoint.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Ledger read/write failed.
    #[error("Ledger error: {message}")]
    LedgerError { message: String, retryable: bool },

    /// Headless browser failed (launch, CDP, evaluate).
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Missing or invalid configuration. Fails fast before any scraping.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            AppError::LedgerError { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns true for a 4xx-class vendor response: do not retry,
    /// fall back to the rendered-DOM strategy where one exists.
    pub fn is_permanent_http(&self) -> bool {
        matches!(
            self,
            AppError::HttpStatus { status, .. } if (400..500).contains(status) && *status != 429
        )
    }

    /// Returns true if a traversal should treat this as an empty extraction
    /// pass rather than aborting the company. The pagination controller's
    /// empty-pass counter absorbs isolated failures.
    pub fn degrades_to_empty(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_)
                | AppError::NetworkError(_)
                | AppError::Blocked(_)
                | AppError::NoMatch(_)
                | AppError::MalformedResponse(_)
                | AppError::BrowserError(_)
        )
    }
}
