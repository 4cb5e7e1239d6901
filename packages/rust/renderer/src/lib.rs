//! Headless browser rendering of organization pages.
//!
//! This crate provides:
//! - [`PageRenderer`]: "render this identifier and give me the final markup"
//! - [`ChromeRenderer`]: Chromium over the DevTools protocol
//! - [`canonical_url`]: identifier to page URL

mod chrome;

use async_trait::async_trait;
use url::Url;

use pageinsights_shared::Result;

pub use chrome::{ChromeRenderer, RenderSettings, SETTLE_DELAY, USER_AGENT};

/// Base URL that identifiers are appended to.
const COMPANY_URL_BASE: &str = "https://www.linkedin.com/company";

/// Renders a page and returns its markup after client-side scripts have run.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render the page for `page_id`.
    ///
    /// Fails with [`PageInsightsError::Render`](pageinsights_shared::PageInsightsError::Render)
    /// on launch, navigation, timeout or capture errors.
    async fn render(&self, page_id: &str) -> Result<String>;
}

/// Canonical page URL for an identifier. The identifier is one percent-encoded path segment.
pub fn canonical_url(page_id: &str) -> String {
    let Ok(mut url) = Url::parse(COMPANY_URL_BASE) else {
        return format!("{COMPANY_URL_BASE}/{page_id}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(page_id);
    }
    url.to_string()
}
