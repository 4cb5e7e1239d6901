//! Structured field extraction from rendered page markup.
//!
//! This crate provides:
//! - [`PageExtractor`]: the pluggable extraction strategy
//! - [`CompanyPageExtractor`]: heuristics for public organization pages
//! - [`extract`]: parse markup and run a strategy over it
//!
//! Extraction is total: missing structure becomes sentinel defaults, never errors.

pub mod company;

use pageinsights_shared::PageProfile;
use scraper::Html;

pub use company::{
    CompanyPageExtractor, DEFAULT_DESCRIPTION, DEFAULT_FOLLOWERS, DEFAULT_INDUSTRY,
    DEFAULT_PROFILE_PIC, POST_COMMENTS, POST_ELLIPSIS, POST_EXCERPT_CHARS, POST_LIKES,
    classify_info_texts, post_from_text,
};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Strategy that turns a parsed document into a [`PageProfile`].
///
/// Implementations must be total: every field gets a value even for an empty document.
pub trait PageExtractor: Send + Sync {
    /// Extract profile fields. `page_id` is the caller's identifier, used as a fallback name.
    fn extract(&self, doc: &Html, page_id: &str) -> PageProfile;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

/// Parse `markup` and run `extractor` over it.
pub fn extract(extractor: &dyn PageExtractor, markup: &str, page_id: &str) -> PageProfile {
    let doc = Html::parse_document(markup);
    extractor.extract(&doc, page_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    // -----------------------------------------------------------------------
    // Full-page extraction
    // -----------------------------------------------------------------------

    #[test]
    fn company_page_extracts_all_fields() {
        let html = load_fixture("company.html");
        let profile = extract(&CompanyPageExtractor, &html, "globex");

        assert_eq!(profile.name, "Globex Corporation");
        assert_eq!(
            profile.description,
            "Globex builds logistics software for mid-sized manufacturers."
        );
        assert_eq!(profile.followers, "48,213 followers");
        // Last qualifying text wins; "NA" is too short, employees line is skipped
        assert_eq!(profile.industry, "Springfield, OR");
        assert_eq!(profile.profile_pic, "https://media.example.com/globex-logo.png");

        assert_eq!(profile.posts.len(), 2);
        assert!(profile.posts[0].content.starts_with("We are thrilled"));
        assert_eq!(profile.posts[0].content.chars().count(), 153);
        assert_eq!(
            profile.posts[1].content,
            "Hiring: senior backend engineers who enjoy distributed systems...."
        );
        assert!(profile.posts.iter().all(|p| !p.content.contains("fourth update")));
    }

    #[test]
    fn paragraph_fallback_scenario() {
        let html = load_fixture("acme.html");
        let profile = extract(&CompanyPageExtractor, &html, "acme");

        assert_eq!(profile.name, "Acme Inc");
        assert_eq!(profile.description.chars().count(), 200);
        assert_eq!(profile.followers, DEFAULT_FOLLOWERS);
        assert_eq!(profile.industry, DEFAULT_INDUSTRY);
        assert_eq!(profile.profile_pic, DEFAULT_PROFILE_PIC);

        // Pool is the first five <p>; the first three are considered and "ok" is noise
        assert_eq!(profile.posts.len(), 2);
        assert_eq!(
            profile.posts[0].content,
            format!("{}...", profile.description.chars().take(150).collect::<String>())
        );
        assert!(profile.posts[1].content.starts_with("Acme announces"));
    }

    #[test]
    fn blocked_page_falls_back_to_defaults() {
        let html = load_fixture("blocked.html");
        let profile = extract(&CompanyPageExtractor, &html, "initech");

        assert_eq!(profile.name, "initech");
        assert_eq!(profile.description, DEFAULT_DESCRIPTION);
        assert_eq!(profile.followers, DEFAULT_FOLLOWERS);
        assert_eq!(profile.industry, DEFAULT_INDUSTRY);
        assert_eq!(profile.profile_pic, DEFAULT_PROFILE_PIC);
        assert!(profile.posts.is_empty());
    }

    #[test]
    fn empty_markup_is_total() {
        for markup in ["", "<html></html>", "not html at all", "<h1></h1>"] {
            let profile = extract(&CompanyPageExtractor, markup, "empty-co");
            assert!(!profile.description.is_empty());
            assert!(!profile.followers.is_empty());
            assert!(!profile.industry.is_empty());
            assert!(!profile.profile_pic.is_empty());
            assert!(profile.posts.len() <= 3);
        }

        let profile = extract(&CompanyPageExtractor, "", "empty-co");
        assert_eq!(profile.name, "empty-co");
    }

    #[test]
    fn extractor_name() {
        assert_eq!(CompanyPageExtractor.name(), "company");
    }
}
