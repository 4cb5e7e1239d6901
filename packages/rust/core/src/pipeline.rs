//! Cache-or-scrape orchestration.
//!
//! [`PageService::get_or_create`] serves a stored page verbatim, or renders,
//! extracts, summarizes and stores it on a miss. A failed render becomes a
//! degraded record that is stored like any other; a failed summary becomes
//! [`SUMMARY_FALLBACK`]. Only store errors reach the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use pageinsights_extractor::PageExtractor;
use pageinsights_renderer::{PageRenderer, canonical_url};
use pageinsights_shared::{Page, Result};
use pageinsights_storage::Storage;

use crate::summarizer::Summarizer;

/// Stored in `ai_summary` when the summarizer fails.
pub const SUMMARY_FALLBACK: &str = "AI Summary unavailable.";

const DEGRADED_DESCRIPTION: &str = "Failed to scrape (LinkedIn Blocked)";
const DEGRADED_FOLLOWERS: &str = "0";
const DEGRADED_INDUSTRY: &str = "Unknown";
const DEGRADED_PROFILE_PIC: &str = "";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the store; nothing was rendered or summarized.
    CacheHit,
    /// Rendered and extracted successfully.
    Scraped,
    /// Rendering failed; a sentinel record was built and stored.
    Degraded,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache_hit",
            Self::Scraped => "scraped",
            Self::Degraded => "degraded",
        }
    }
}

/// A page together with the way it was obtained.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub page: Page,
    pub outcome: FetchOutcome,
}

// ---------------------------------------------------------------------------
// PageService
// ---------------------------------------------------------------------------

/// The orchestrator. Holds the process-wide collaborators, built once at startup.
pub struct PageService {
    storage: Arc<Storage>,
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<dyn PageExtractor>,
    summarizer: Arc<dyn Summarizer>,
    locks: KeyedLocks,
}

impl PageService {
    pub fn new(
        storage: Arc<Storage>,
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<dyn PageExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            storage,
            renderer,
            extractor,
            summarizer,
            locks: KeyedLocks::default(),
        }
    }

    /// Return the stored page for `page_id`, scraping and storing it first on a miss.
    pub async fn get_or_create(&self, page_id: &str) -> Result<Page> {
        self.fetch(page_id).await.map(|fetched| fetched.page)
    }

    /// Same as [`get_or_create`](Self::get_or_create), also reporting the outcome.
    #[instrument(skip(self))]
    pub async fn fetch(&self, page_id: &str) -> Result<Fetched> {
        if let Some(page) = self.storage.get_page(page_id).await? {
            debug!("cache hit");
            return Ok(Fetched {
                page,
                outcome: FetchOutcome::CacheHit,
            });
        }

        // One scrape per identifier at a time; late arrivals find the stored record.
        let _guard = self.locks.lock(page_id).await;
        if let Some(page) = self.storage.get_page(page_id).await? {
            debug!("cache hit after waiting on concurrent scrape");
            return Ok(Fetched {
                page,
                outcome: FetchOutcome::CacheHit,
            });
        }

        let fetched = self.scrape(page_id).await;

        match self.storage.insert_page(&fetched.page).await {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                warn!(error = %e, "page was stored concurrently, returning the freshly built record");
            }
            Err(e) => return Err(e),
        }

        info!(outcome = fetched.outcome.as_str(), "page stored");
        Ok(fetched)
    }

    /// Up to `limit` stored pages in storage order.
    pub async fn list(&self, limit: u32) -> Result<Vec<Page>> {
        self.storage.list_pages(limit).await
    }

    /// Render, extract and summarize. Never fails: failures degrade the content.
    async fn scrape(&self, page_id: &str) -> Fetched {
        let url = canonical_url(page_id);

        let markup = match self.renderer.render(page_id).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(error = %e, %url, "render failed, storing degraded record");
                // Degraded records are deliberately never summarized: ai_summary stays None
                return Fetched {
                    page: degraded_page(page_id, &url),
                    outcome: FetchOutcome::Degraded,
                };
            }
        };

        let profile = pageinsights_extractor::extract(self.extractor.as_ref(), &markup, page_id);
        debug!(extractor = self.extractor.name(), name = %profile.name, "extracted profile");

        let ai_summary = match self.summarizer.summarize(&profile.description).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summary failed, using fallback");
                SUMMARY_FALLBACK.to_string()
            }
        };

        Fetched {
            page: Page::from_profile(page_id, url, profile, Some(ai_summary)),
            outcome: FetchOutcome::Scraped,
        }
    }
}

/// Sentinel record for a page that could not be rendered.
fn degraded_page(page_id: &str, url: &str) -> Page {
    Page {
        page_id: page_id.to_string(),
        name: page_id.to_string(),
        url: url.to_string(),
        description: DEGRADED_DESCRIPTION.to_string(),
        followers: DEGRADED_FOLLOWERS.to_string(),
        industry: DEGRADED_INDUSTRY.to_string(),
        profile_pic: DEGRADED_PROFILE_PIC.to_string(),
        posts: Vec::new(),
        ai_summary: None,
    }
}

// ---------------------------------------------------------------------------
// Per-identifier locks
// ---------------------------------------------------------------------------

/// Async mutex per key. Entries are removed once nobody holds or waits on them.
#[derive(Default)]
struct KeyedLocks {
    slots: StdMutex<HashMap<String, Slot>>,
}

#[derive(Default)]
struct Slot {
    mutex: Arc<Mutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(key.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.mutex)
        };

        // Registered before waiting so a cancelled waiter still releases its slot
        let mut guard = KeyGuard {
            locks: self,
            key: key.to_string(),
            held: None,
        };
        guard.held = Some(mutex.lock_owned().await);
        guard
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());

        let mut slots = self.locks.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
