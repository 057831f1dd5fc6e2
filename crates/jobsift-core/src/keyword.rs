//! Word-boundary keyword matching over job titles.
//!
//! The sole relevance gate of the system: a title matching none of the
//! configured keywords is excluded from all downstream processing.

/// Case-insensitive matcher with word-boundary anchoring on both ends of
/// each keyword phrase, so "ai" matches "AI Engineer" but not "maintain".
/// Multi-word phrases match as a contiguous phrase.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// Original keywords, preserved for reporting.
    keywords: Vec<String>,
    /// Lowercased counterparts, index-aligned with `keywords`.
    lowered: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k| !k.trim().is_empty())
            .collect();
        let lowered = keywords.iter().map(|k| k.to_lowercase()).collect();
        Self { keywords, lowered }
    }

    /// Returns the keywords matched by `title`, in configured order.
    pub fn matches(&self, title: &str) -> Vec<String> {
        let title_lower = title.to_lowercase();
        self.keywords
            .iter()
            .zip(&self.lowered)
            .filter(|(_, lowered)| contains_bounded(&title_lower, lowered))
            .map(|(keyword, _)| keyword.clone())
            .collect()
    }

    pub fn is_relevant(&self, title: &str) -> bool {
        let title_lower = title.to_lowercase();
        self.lowered.iter().any(|k| contains_bounded(&title_lower, k))
    }
}

/// Word character per the usual \b semantics: alphanumeric or underscore.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True if `needle` occurs in `haystack` with non-word characters (or the
/// string edge) on both sides. Both inputs must already be lowercased.
fn contains_bounded(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let at = start + pos;
        let end = at + needle.len();
        let before_ok = haystack[..at].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        // Step past the first char of this occurrence and keep scanning.
        start = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_keywords;

    #[test]
    fn test_short_keyword_needs_boundaries() {
        let matcher = KeywordMatcher::new(["ai"]);
        assert_eq!(matcher.matches("AI Engineer"), vec!["ai".to_string()]);
        assert_eq!(matcher.matches("Conversational AI"), vec!["ai".to_string()]);
        assert!(matcher.matches("maintainer").is_empty());
        assert!(matcher.matches("Maintain Fleet Systems").is_empty());
    }

    #[test]
    fn test_phrase_matches_contiguously() {
        let matcher = KeywordMatcher::new(["data scientist", "data"]);
        let matched = matcher.matches("Senior Data Scientist");
        assert_eq!(
            matched,
            vec!["data scientist".to_string(), "data".to_string()]
        );
        assert_eq!(
            matcher.matches("Data Platform Lead"),
            vec!["data".to_string()]
        );
        assert!(matcher.matches("Database Administrator").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = KeywordMatcher::new(["Machine Learning"]);
        assert_eq!(
            matcher.matches("machine learning engineer"),
            vec!["Machine Learning".to_string()]
        );
    }

    #[test]
    fn test_punctuation_counts_as_boundary() {
        let matcher = KeywordMatcher::new(["ml"]);
        assert!(matcher.is_relevant("Engineer (ML)"));
        assert!(matcher.is_relevant("ML/AI Engineer"));
        assert!(!matcher.is_relevant("HTML Developer"));
    }

    #[test]
    fn test_zero_matches_for_irrelevant_title() {
        let matcher = KeywordMatcher::new(default_keywords());
        assert!(matcher.matches("Office Manager").is_empty());
        assert!(!matcher.is_relevant("Executive Assistant"));
    }

    #[test]
    fn test_empty_keywords_are_dropped() {
        let matcher = KeywordMatcher::new(["", "  ", "data"]);
        assert_eq!(matcher.matches("Data Analyst"), vec!["data".to_string()]);
    }
}
