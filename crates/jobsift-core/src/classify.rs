//! Platform classification: career-page URL → extraction strategy id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Known career-site platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Custom career page on plaid.com; links through Lever, so it must be
    /// classified before the Lever vendor pattern.
    Plaid,
    Workday,
    Greenhouse,
    Lever,
    SmartRecruiters,
    Eightfold,
    Icims,
    Taleo,
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Plaid => "plaid",
            Platform::Workday => "workday",
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::SmartRecruiters => "smartrecruiters",
            Platform::Eightfold => "eightfold",
            Platform::Icims => "icims",
            Platform::Taleo => "taleo",
            Platform::Generic => "generic",
        }
    }

    /// Platforms with a documented JSON job-board endpoint.
    pub fn is_api_backed(&self) -> bool {
        matches!(
            self,
            Platform::Greenhouse | Platform::Lever | Platform::SmartRecruiters
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaid" => Ok(Platform::Plaid),
            "workday" => Ok(Platform::Workday),
            "greenhouse" => Ok(Platform::Greenhouse),
            "lever" => Ok(Platform::Lever),
            "smartrecruiters" => Ok(Platform::SmartRecruiters),
            "eightfold" => Ok(Platform::Eightfold),
            "icims" => Ok(Platform::Icims),
            "taleo" => Ok(Platform::Taleo),
            "generic" => Ok(Platform::Generic),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Ordered detection table. Company-specific entries precede generic vendor
/// entries: some companies host custom pages that embed or link through a
/// vendor domain, and the specific entry must win.
const PLATFORM_PATTERNS: &[(Platform, &[&str])] = &[
    (Platform::Plaid, &["plaid.com/careers"]),
    (
        Platform::Workday,
        &[
            "myworkdayjobs.com",
            "wd1.myworkdayjobs",
            "wd3.myworkdayjobs",
            "wd5.myworkdayjobs",
        ],
    ),
    (
        Platform::Greenhouse,
        &["boards.greenhouse.io", "greenhouse.io", "grnh.se"],
    ),
    (Platform::Lever, &["jobs.lever.co", "lever.co"]),
    (
        Platform::SmartRecruiters,
        &[
            "jobs.smartrecruiters.com",
            "careers.smartrecruiters.com",
            "smartrecruiters.com",
        ],
    ),
    (Platform::Eightfold, &["eightfold.ai"]),
    (Platform::Icims, &["icims.com"]),
    (Platform::Taleo, &["taleo.net"]),
];

/// Map a career-page URL (optionally with an explicit operator hint) to a
/// platform. A hint naming a known platform is used verbatim; otherwise
/// the lowercased URL is matched against the ordered pattern table, first
/// match wins, falling back to [`Platform::Generic`]. Pure.
pub fn classify(url: &str, hint: Option<&str>) -> Platform {
    if let Some(hint) = hint {
        if let Ok(platform) = hint.parse::<Platform>() {
            return platform;
        }
        tracing::debug!(hint, "Ignoring unknown platform hint");
    }

    let url_lower = url.to_lowercase();
    for (platform, patterns) in PLATFORM_PATTERNS {
        if patterns.iter().any(|p| url_lower.contains(p)) {
            return *platform;
        }
    }
    Platform::Generic
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One case per table pattern.
    #[test]
    fn test_every_pattern_resolves() {
        let cases: &[(&str, Platform)] = &[
            ("https://plaid.com/careers/openings", Platform::Plaid),
            ("https://acme.wd5.myworkdayjobs.com/External", Platform::Workday),
            ("https://acme.wd1.myworkdayjobs.com/jobs", Platform::Workday),
            ("https://acme.wd3.myworkdayjobs.com/jobs", Platform::Workday),
            ("https://sub.myworkdayjobs.com/en-US/careers", Platform::Workday),
            ("https://boards.greenhouse.io/acme", Platform::Greenhouse),
            ("https://www.greenhouse.io/embed/job_board?for=acme", Platform::Greenhouse),
            ("https://grnh.se/acme", Platform::Greenhouse),
            ("https://jobs.lever.co/acme", Platform::Lever),
            ("https://www.lever.co/acme/jobs", Platform::Lever),
            ("https://jobs.smartrecruiters.com/Acme", Platform::SmartRecruiters),
            ("https://careers.smartrecruiters.com/Acme", Platform::SmartRecruiters),
            ("https://www.smartrecruiters.com/Acme", Platform::SmartRecruiters),
            ("https://acme.eightfold.ai/careers", Platform::Eightfold),
            ("https://careers-acme.icims.com/jobs", Platform::Icims),
            ("https://acme.taleo.net/careersection/ex/jobsearch.ftl", Platform::Taleo),
            ("https://www.acme.com/careers", Platform::Generic),
        ];
        for (url, expected) in cases {
            assert_eq!(classify(url, None), *expected, "url: {}", url);
        }
    }

    #[test]
    fn test_specific_entry_wins_over_later_vendor_pattern() {
        // Plaid's career page links through Lever; both substrings appear,
        // and table order decides.
        let url = "https://plaid.com/careers/openings?ref=jobs.lever.co";
        assert_eq!(classify(url, None), Platform::Plaid);
    }

    #[test]
    fn test_hint_overrides_inference() {
        assert_eq!(
            classify("https://boards.greenhouse.io/acme", Some("generic")),
            Platform::Generic
        );
        assert_eq!(
            classify("https://www.acme.com/careers", Some("Workday")),
            Platform::Workday
        );
    }

    #[test]
    fn test_unknown_hint_falls_back_to_url() {
        assert_eq!(
            classify("https://jobs.lever.co/acme", Some("bamboohr")),
            Platform::Lever
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        let url = "https://BOARDS.Greenhouse.IO/Acme";
        assert_eq!(classify(url, None), classify(url, None));
        assert_eq!(classify(url, None), Platform::Greenhouse);
    }

    #[test]
    fn test_api_backed_platforms() {
        assert!(Platform::Greenhouse.is_api_backed());
        assert!(Platform::Lever.is_api_backed());
        assert!(Platform::SmartRecruiters.is_api_backed());
        assert!(!Platform::Workday.is_api_backed());
        assert!(!Platform::Generic.is_api_backed());
    }
}
