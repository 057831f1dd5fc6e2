//! Canonicalization of raw fragments into [`Job`] records.

use sha2::{Digest, Sha256};
use url::Url;

use crate::models::{Company, Job, RawFragment};

/// Truncation bound for the content-hash id (hex chars).
const HASH_ID_LEN: usize = 16;
/// Truncation bound for vendor-native ids, prefix included.
const VENDOR_ID_LEN: usize = 32;
/// Title length bounds in characters, after whitespace normalization.
const MIN_TITLE_LEN: usize = 3;
const MAX_TITLE_LEN: usize = 200;

/// Builds immutable [`Job`] records from raw fragments.
///
/// The id is deterministic: the same (company, canonical URL, title) tuple
/// always yields the same value. Fragments carrying a vendor-native id use
/// it directly — it is stable across title rewrites — otherwise the id is
/// a truncated SHA-256 over `company|host+path|title`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobRecordBuilder;

impl JobRecordBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Canonicalize a fragment into a Job, or `None` if the fragment is
    /// unusable (empty URL, title outside bounds).
    pub fn build(
        &self,
        fragment: &RawFragment,
        company: &Company,
        matched_keywords: Vec<String>,
    ) -> Option<Job> {
        let title = normalize_whitespace(&fragment.title);
        let title_chars = title.chars().count();
        if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&title_chars) {
            return None;
        }

        let url = resolve_url(&fragment.url, &company.career_url)?;

        let id = match &fragment.vendor_id {
            Some(vendor_id) if !vendor_id.is_empty() => truncate(vendor_id, VENDOR_ID_LEN),
            _ => hash_id(&company.name, &url, &title),
        };

        Some(Job {
            id,
            title,
            url,
            company_name: company.name.clone(),
            company_career_url: company.career_url.clone(),
            location: normalize_whitespace(&fragment.location),
            posted_date: fragment.posted_date.clone(),
            matched_keywords,
        })
    }
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a possibly-relative URL against the company career page.
/// Returns `None` for empty input or anchors/javascript pseudo-links.
pub fn resolve_url(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") {
        return None;
    }
    if let Ok(absolute) = Url::parse(raw) {
        return Some(absolute.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(raw).ok().map(|u| u.to_string())
}

/// Canonical key for a job URL: host + path, query intentionally discarded.
/// Many vendors reissue the same posting with churned query parameters.
pub fn canonical_url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!(
            "{}{}",
            parsed.host_str().unwrap_or_default(),
            parsed.path().trim_end_matches('/')
        ),
        // Not absolute: strip query/fragment by hand.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string(),
    }
}

fn hash_id(company_name: &str, url: &str, title: &str) -> String {
    let content = format!("{}|{}|{}", company_name, canonical_url_path(url), title);
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..HASH_ID_LEN].to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Company {
        Company::new("Acme", "https://boards.example.io/acme")
    }

    #[test]
    fn test_id_is_deterministic() {
        let builder = JobRecordBuilder::new();
        let frag = RawFragment::new("Data Analyst", "/jobs/1").with_location("NYC");
        let a = builder.build(&frag, &acme(), vec![]).unwrap();
        let b = builder.build(&frag, &acme(), vec![]).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_id_differs_per_tuple_component() {
        let builder = JobRecordBuilder::new();
        let base = builder
            .build(&RawFragment::new("Data Analyst", "/jobs/1"), &acme(), vec![])
            .unwrap();

        let other_title = builder
            .build(&RawFragment::new("Data Engineer", "/jobs/1"), &acme(), vec![])
            .unwrap();
        assert_ne!(base.id, other_title.id);

        let other_url = builder
            .build(&RawFragment::new("Data Analyst", "/jobs/2"), &acme(), vec![])
            .unwrap();
        assert_ne!(base.id, other_url.id);

        let other_company = Company::new("Globex", "https://boards.example.io/acme");
        let job = builder
            .build(
                &RawFragment::new("Data Analyst", "/jobs/1"),
                &other_company,
                vec![],
            )
            .unwrap();
        assert_ne!(base.id, job.id);
    }

    #[test]
    fn test_query_string_does_not_affect_id() {
        let builder = JobRecordBuilder::new();
        let a = builder
            .build(
                &RawFragment::new("Data Analyst", "https://x.io/jobs/1?src=linkedin"),
                &acme(),
                vec![],
            )
            .unwrap();
        let b = builder
            .build(
                &RawFragment::new("Data Analyst", "https://x.io/jobs/1?session=9f2"),
                &acme(),
                vec![],
            )
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_vendor_id_wins_over_hash() {
        let builder = JobRecordBuilder::new();
        let frag = RawFragment::new("Data Analyst", "/jobs/1").with_vendor_id("GH_12345");
        let job = builder.build(&frag, &acme(), vec![]).unwrap();
        assert_eq!(job.id, "GH_12345");
    }

    #[test]
    fn test_vendor_id_is_bounded() {
        let builder = JobRecordBuilder::new();
        let long = format!("EF_{}", "x".repeat(100));
        let frag = RawFragment::new("Data Analyst", "/jobs/1").with_vendor_id(long);
        let job = builder.build(&frag, &acme(), vec![]).unwrap();
        assert_eq!(job.id.len(), 32);
    }

    #[test]
    fn test_relative_url_resolved_against_origin() {
        let builder = JobRecordBuilder::new();
        let frag = RawFragment::new("Data Analyst", "/jobs/1");
        let job = builder.build(&frag, &acme(), vec![]).unwrap();
        assert_eq!(job.url, "https://boards.example.io/jobs/1");
    }

    #[test]
    fn test_title_whitespace_normalized_and_bounded() {
        let builder = JobRecordBuilder::new();
        let frag = RawFragment::new("  Data\n   Analyst \t II ", "/jobs/1");
        let job = builder.build(&frag, &acme(), vec![]).unwrap();
        assert_eq!(job.title, "Data Analyst II");

        assert!(
            builder
                .build(&RawFragment::new("ab", "/jobs/1"), &acme(), vec![])
                .is_none()
        );
        assert!(
            builder
                .build(&RawFragment::new("x".repeat(201), "/jobs/1"), &acme(), vec![])
                .is_none()
        );
    }

    #[test]
    fn test_title_bounds_count_characters_not_bytes() {
        let builder = JobRecordBuilder::new();

        // Two CJK characters: 6 bytes but below the 3-character minimum.
        assert!(
            builder
                .build(&RawFragment::new("工程", "/jobs/1"), &acme(), vec![])
                .is_none()
        );

        // 100 CJK characters: 300 bytes but well within the 200-character cap.
        let cjk = "数".repeat(100);
        let job = builder
            .build(&RawFragment::new(cjk.clone(), "/jobs/1"), &acme(), vec![])
            .unwrap();
        assert_eq!(job.title, cjk);

        assert!(
            builder
                .build(&RawFragment::new("数".repeat(201), "/jobs/1"), &acme(), vec![])
                .is_none()
        );
    }

    #[test]
    fn test_pseudo_links_rejected() {
        let builder = JobRecordBuilder::new();
        for bad in ["#", "javascript:void(0)", ""] {
            assert!(
                builder
                    .build(&RawFragment::new("Data Analyst", bad), &acme(), vec![])
                    .is_none()
            );
        }
    }

    #[test]
    fn test_canonical_url_path() {
        assert_eq!(
            canonical_url_path("https://x.io/jobs/1?utm=a#top"),
            "x.io/jobs/1"
        );
        assert_eq!(canonical_url_path("/jobs/1?page=2"), "/jobs/1");
        assert_eq!(
            canonical_url_path("https://x.io/jobs/1/"),
            "x.io/jobs/1"
        );
    }
}
