//! Vendor job-board API strategies.
//!
//! Greenhouse, Lever, and SmartRecruiters all expose unauthenticated
//! JSON listings endpoints that are far more reliable than their rendered
//! boards. Each strategy speaks one vendor's payload shape and yields
//! fragments carrying the vendor's own posting id.

use std::time::Duration;

use jobsift_core::models::RawFragment;
use jobsift_core::pagination::{AdvanceOutcome, ExtractionStrategy};
use jobsift_core::{AppError, Platform};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const GREENHOUSE_API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";
const LEVER_API_BASE: &str = "https://api.lever.co/v0/postings";
const SMARTRECRUITERS_API_BASE: &str = "https://api.smartrecruiters.com/v1/companies";
const SMARTRECRUITERS_PAGE_LIMIT: u32 = 100;

/// Which vendor endpoint to hit, plus any paging cursor it needs.
#[derive(Debug, Clone)]
enum ApiVendor {
    Greenhouse { board: String },
    Lever { slug: String },
    SmartRecruiters { company: String, offset: u32, total: Option<u32> },
}

#[derive(Clone)]
pub struct ApiStrategy {
    client: Client,
    vendor: ApiVendor,
    timeout_secs: u64,
}

impl ApiStrategy {
    /// Build a strategy for an API-backed platform, deriving the board
    /// token from the career URL. Returns `None` for platforms without a
    /// listings API or URLs the token cannot be read from.
    pub fn for_platform(
        client: Client,
        platform: Platform,
        career_url: &str,
    ) -> Option<Self> {
        let vendor = match platform {
            Platform::Greenhouse => ApiVendor::Greenhouse {
                board: greenhouse_board_token(career_url)?,
            },
            Platform::Lever => ApiVendor::Lever {
                slug: path_head_token(career_url)?,
            },
            Platform::SmartRecruiters => ApiVendor::SmartRecruiters {
                company: path_head_token(career_url)?,
                offset: 0,
                total: None,
            },
            _ => return None,
        };
        Some(Self {
            client,
            vendor,
            timeout_secs: 30,
        })
    }

    pub fn client(timeout: Duration) -> Result<Client, AppError> {
        Client::builder()
            .user_agent("jobsift/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::NetworkError(e.to_string()))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{url}: {e}")))
    }
}

impl ExtractionStrategy for ApiStrategy {
    async fn prepare(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    async fn extract(&mut self) -> Result<Vec<RawFragment>, AppError> {
        match &mut self.vendor {
            ApiVendor::Greenhouse { board } => {
                let url = format!("{GREENHOUSE_API_BASE}/{board}/jobs");
                tracing::debug!(%url, "Fetching Greenhouse board");
                let payload: GreenhouseBoard = self.fetch_json(&url).await?;
                Ok(payload.jobs.into_iter().map(GreenhouseJob::into_fragment).collect())
            }
            ApiVendor::Lever { slug } => {
                let url = format!("{LEVER_API_BASE}/{slug}");
                tracing::debug!(%url, "Fetching Lever postings");
                let postings: Vec<LeverPosting> = self.fetch_json(&url).await?;
                Ok(postings.into_iter().map(LeverPosting::into_fragment).collect())
            }
            ApiVendor::SmartRecruiters { company, offset, .. } => {
                let url = format!(
                    "{SMARTRECRUITERS_API_BASE}/{company}/postings?limit={SMARTRECRUITERS_PAGE_LIMIT}&offset={offset}"
                );
                tracing::debug!(%url, "Fetching SmartRecruiters postings");
                let company_id = company.clone();
                let payload: SmartRecruitersPage = self.fetch_json(&url).await?;
                if let ApiVendor::SmartRecruiters { total, .. } = &mut self.vendor {
                    *total = Some(payload.total_found);
                }
                Ok(payload
                    .content
                    .into_iter()
                    .map(|p| p.into_fragment(&company_id))
                    .collect())
            }
        }
    }

    async fn advance(&mut self) -> Result<AdvanceOutcome, AppError> {
        match &mut self.vendor {
            // Single-shot endpoints: the whole board comes back at once.
            ApiVendor::Greenhouse { .. } | ApiVendor::Lever { .. } => Ok(AdvanceOutcome::End),
            ApiVendor::SmartRecruiters { offset, total, .. } => {
                *offset += SMARTRECRUITERS_PAGE_LIMIT;
                match *total {
                    Some(total) if *offset < total => Ok(AdvanceOutcome::Advanced),
                    _ => Ok(AdvanceOutcome::End),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Token extraction
// ---------------------------------------------------------------------------

/// Greenhouse board token: `boards.greenhouse.io/{token}`, the embed form
/// `greenhouse.io/embed/job_board?for={token}`, or a `grnh.se/{token}`
/// short link.
fn greenhouse_board_token(career_url: &str) -> Option<String> {
    let url = Url::parse(career_url).ok()?;
    if url.path().starts_with("/embed/job_board") {
        return url
            .query_pairs()
            .find(|(k, _)| k == "for")
            .map(|(_, v)| v.into_owned());
    }
    path_head(&url)
}

/// First path segment: the tenant token for `jobs.lever.co/{slug}` and
/// `careers.smartrecruiters.com/{company}` style URLs.
fn path_head_token(career_url: &str) -> Option<String> {
    let url = Url::parse(career_url).ok()?;
    path_head(&url)
}

fn path_head(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GreenhouseBoard {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: u64,
    title: String,
    #[serde(default)]
    absolute_url: String,
    #[serde(default)]
    location: Option<GreenhouseLocation>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    #[serde(default)]
    name: String,
}

impl GreenhouseJob {
    fn into_fragment(self) -> RawFragment {
        let mut fragment =
            RawFragment::new(self.title, self.absolute_url).with_vendor_id(format!("GH_{}", self.id));
        if let Some(location) = self.location {
            if !location.name.is_empty() {
                fragment = fragment.with_location(location.name);
            }
        }
        // "2024-01-15T12:00:00-05:00" carries the date up front.
        if let Some(updated) = self.updated_at {
            if let Some(date) = updated.split('T').next() {
                fragment.posted_date = date.to_string();
            }
        }
        fragment
    }
}

#[derive(Debug, Deserialize)]
struct LeverPosting {
    id: String,
    text: String,
    #[serde(default, rename = "hostedUrl")]
    hosted_url: String,
    #[serde(default, rename = "applyUrl")]
    apply_url: String,
    #[serde(default)]
    categories: Option<LeverCategories>,
}

#[derive(Debug, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    location: Option<String>,
}

impl LeverPosting {
    fn into_fragment(self) -> RawFragment {
        let url = if self.hosted_url.is_empty() {
            self.apply_url
        } else {
            self.hosted_url
        };
        let mut fragment =
            RawFragment::new(self.text, url).with_vendor_id(format!("LV_{}", self.id));
        if let Some(location) = self.categories.and_then(|c| c.location) {
            if !location.is_empty() {
                fragment = fragment.with_location(location);
            }
        }
        fragment
    }
}

#[derive(Debug, Deserialize)]
struct SmartRecruitersPage {
    #[serde(default, rename = "totalFound")]
    total_found: u32,
    #[serde(default)]
    content: Vec<SmartRecruitersPosting>,
}

#[derive(Debug, Deserialize)]
struct SmartRecruitersPosting {
    id: String,
    name: String,
    #[serde(default, rename = "ref")]
    posting_ref: String,
    #[serde(default)]
    location: Option<SmartRecruitersLocation>,
}

#[derive(Debug, Deserialize)]
struct SmartRecruitersLocation {
    #[serde(default)]
    city: String,
}

impl SmartRecruitersPosting {
    fn into_fragment(self, company: &str) -> RawFragment {
        let url = if self.posting_ref.is_empty() {
            format!("https://jobs.smartrecruiters.com/{company}/{}", self.id)
        } else {
            format!("https://jobs.smartrecruiters.com/{company}/{}", self.posting_ref)
        };
        let mut fragment =
            RawFragment::new(self.name, url).with_vendor_id(format!("SR_{}", self.id));
        if let Some(location) = self.location {
            if !location.city.is_empty() {
                fragment = fragment.with_location(location.city);
            }
        }
        fragment
    }
}
