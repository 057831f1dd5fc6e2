//! Fragment extraction from rendered HTML snapshots.
//!
//! Pure string-in, fragments-out: the live page session hands over its
//! serialized DOM and this module does all the parsing, so extraction
//! behavior stays testable without a browser.

use std::collections::HashSet;

use jobsift_core::models::RawFragment;
use jobsift_core::{normalize_whitespace, resolve_url};
use scraper::{ElementRef, Html, Selector};

use crate::tables::{DomTables, EXCLUDED_PATH_MARKERS, JOB_PATH_MARKERS};

const MIN_LINK_TEXT: usize = 4;
const MAX_LINK_TEXT: usize = 200;

/// Extract job fragments from a rendered page.
///
/// Card selectors are tried in table order; the first selector producing
/// at least one usable fragment wins and the rest are skipped. When no
/// card selector matches, falls back to enumerating every anchor whose
/// path looks like a job posting.
pub fn extract_fragments(html: &str, base_url: &str, tables: &DomTables) -> Vec<RawFragment> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    for selector in tables.card_selectors {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let mut fragments = Vec::new();
        for card in document.select(&sel) {
            if let Some(fragment) = parse_card(card, base_url, tables) {
                if seen.insert(fragment.url.clone()) {
                    fragments.push(fragment);
                }
            }
        }
        if !fragments.is_empty() {
            tracing::debug!(selector, count = fragments.len(), "Card selector matched");
            return fragments;
        }
        seen.clear();
    }

    enumerate_job_links(&document, base_url)
}

fn parse_card(card: ElementRef<'_>, base_url: &str, tables: &DomTables) -> Option<RawFragment> {
    let href = card_href(card)?;
    if should_exclude(&href) {
        return None;
    }
    let url = resolve_url(&href, base_url)?;

    let title = card_title(card, tables)?;
    let mut fragment = RawFragment::new(title, url);
    if let Some(location) = first_text(card, tables.location_selectors) {
        fragment = fragment.with_location(location);
    }
    Some(fragment)
}

/// The card's own href, or the first descendant anchor's.
fn card_href(card: ElementRef<'_>) -> Option<String> {
    if let Some(href) = card.value().attr("href") {
        return Some(href.to_string());
    }
    let Ok(anchor) = Selector::parse("a[href]") else {
        return None;
    };
    card.select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// Anchor cards carry their title as link text; container cards hold
/// title and location side by side, so sub-selectors go first there.
fn card_title(card: ElementRef<'_>, tables: &DomTables) -> Option<String> {
    let is_anchor = card.value().name() == "a";
    if !is_anchor {
        if let Some(title) = first_text(card, tables.title_selectors) {
            return Some(title);
        }
    }
    let own = normalize_whitespace(&card.text().collect::<String>());
    if (MIN_LINK_TEXT..=MAX_LINK_TEXT).contains(&own.chars().count()) {
        return Some(own);
    }
    if is_anchor {
        if let Some(title) = first_text(card, tables.title_selectors) {
            return Some(title);
        }
    }
    for attr in ["aria-label", "title"] {
        if let Some(value) = card.value().attr(attr) {
            let value = normalize_whitespace(value);
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn first_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = scope.select(&sel).next() {
            let text = normalize_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Last-resort extraction: every anchor whose path contains a job marker.
/// Anchors with unusable text get a title derived from the URL slug.
fn enumerate_job_links(document: &Html, base_url: &str) -> Vec<RawFragment> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut fragments = Vec::new();

    for link in document.select(&anchor) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if should_exclude(href) || !looks_like_job_url(href) {
            continue;
        }
        let Some(url) = resolve_url(href, base_url) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let text = normalize_whitespace(&link.text().collect::<String>());
        let title = if (MIN_LINK_TEXT..=MAX_LINK_TEXT).contains(&text.chars().count()) {
            text
        } else {
            match title_from_slug(&url) {
                Some(title) => title,
                None => continue,
            }
        };

        fragments.push(RawFragment::new(title, url));
    }

    fragments
}

fn should_exclude(href: &str) -> bool {
    let lower = href.to_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return true;
    }
    EXCLUDED_PATH_MARKERS.iter().any(|m| lower.contains(m))
}

fn looks_like_job_url(href: &str) -> bool {
    let lower = href.to_lowercase();
    JOB_PATH_MARKERS.iter().any(|m| lower.contains(m))
}

/// "senior-data-engineer" from a posting URL becomes "Senior Data Engineer".
fn title_from_slug(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let slug = path
        .trim_end_matches('/')
        .rsplit('/')
        .find(|segment| segment.contains(['-', '_']) && !segment.chars().all(char::is_numeric))?;

    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty() && !w.chars().all(char::is_numeric))
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}
