use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a company row in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Removed,
    Error,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Removed => "removed",
            CompanyStatus::Error => "error",
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompanyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "" => Ok(CompanyStatus::Active),
            "removed" => Ok(CompanyStatus::Removed),
            "error" => Ok(CompanyStatus::Error),
            _ => Err(format!("Unknown company status: {}", s)),
        }
    }
}

/// A scrape target: one company career page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub career_url: String,
    /// Explicit operator hint naming the platform; overrides URL inference.
    pub platform_hint: Option<String>,
    pub status: CompanyStatus,
}

impl Company {
    pub fn new(name: impl Into<String>, career_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            career_url: career_url.into(),
            platform_hint: None,
            status: CompanyStatus::Active,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.platform_hint = Some(hint.into());
        self
    }
}

/// Raw (title, url, location) tuple pulled off a page or vendor API,
/// before canonicalization. Transient; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFragment {
    pub title: String,
    pub url: String,
    /// Best-effort; empty if undeterminable, never absent.
    pub location: String,
    pub posted_date: String,
    /// Vendor-native identifier including its prefix (e.g. "GH_12345").
    /// Preferred over content hashing: stable across title rewrites.
    pub vendor_id: Option<String>,
}

impl RawFragment {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_vendor_id(mut self, id: impl Into<String>) -> Self {
        self.vendor_id = Some(id.into());
        self
    }
}

/// A canonical job posting. Immutable once built; two jobs with the same
/// id are the same posting regardless of other field differences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub url: String,
    pub company_name: String,
    pub company_career_url: String,
    pub location: String,
    pub posted_date: String,
    pub matched_keywords: Vec<String>,
}

/// Summary counters for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub companies_processed: usize,
    pub companies_with_errors: usize,
    pub total_jobs_found: usize,
    pub new_jobs_added: usize,
    pub existing_jobs_refreshed: usize,
}
