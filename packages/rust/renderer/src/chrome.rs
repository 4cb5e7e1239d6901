//! Chromium renderer over the DevTools protocol.
//!
//! One browser process per render. The process is closed on every exit path
//! (and killed if a graceful close fails); dropping a [`Browser`] mid-render
//! also kills its child.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use pageinsights_shared::{PageInsightsError, RendererConfig, Result};

use crate::{PageRenderer, canonical_url};

/// Desktop user agent presented to the site.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Fixed wait after navigation so client-rendered content can populate.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// RenderSettings
// ---------------------------------------------------------------------------

/// Runtime renderer settings, derived from the `[renderer]` config section.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Deadline for launch + navigation + settle + capture.
    pub timeout: Duration,
    /// Maximum concurrent browser sessions (at least 1).
    pub max_concurrent: usize,
    /// Explicit browser binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
}

impl From<&RendererConfig> for RenderSettings {
    fn from(config: &RendererConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.render_timeout_secs),
            max_concurrent: (config.max_concurrent_renders as usize).max(1),
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&RendererConfig::default())
    }
}

// ---------------------------------------------------------------------------
// ChromeRenderer
// ---------------------------------------------------------------------------

/// Renders pages in a fresh headless Chromium per call.
pub struct ChromeRenderer {
    settings: RenderSettings,
    permits: Semaphore,
}

impl ChromeRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        let permits = Semaphore::new(settings.max_concurrent);
        Self { settings, permits }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={USER_AGENT}"))
            .request_timeout(self.settings.timeout);

        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| PageInsightsError::Render(format!("invalid browser config: {e}")))
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    #[instrument(skip(self))]
    async fn render(&self, page_id: &str) -> Result<String> {
        let url = canonical_url(page_id);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PageInsightsError::Render(format!("render pool closed: {e}")))?;

        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageInsightsError::Render(format!("failed to launch browser: {e}")))?;

        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(%url, "rendering page");
        let outcome = tokio::time::timeout(self.settings.timeout, capture(&browser, &url)).await;

        shutdown(&mut browser).await;
        driver.abort();

        match outcome {
            Ok(Ok(html)) => {
                debug!(%url, bytes = html.len(), "captured markup");
                Ok(html)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PageInsightsError::Render(format!(
                "rendering {url} exceeded {}s",
                self.settings.timeout.as_secs()
            ))),
        }
    }
}

/// Navigate, wait out the settle delay, and return the page's full markup.
async fn capture(browser: &Browser, url: &str) -> Result<String> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| PageInsightsError::Render(format!("navigation to {url} failed: {e}")))?;

    tokio::time::sleep(SETTLE_DELAY).await;

    page.content()
        .await
        .map_err(|e| PageInsightsError::Render(format!("failed to read markup of {url}: {e}")))
}

/// Close the browser, falling back to killing the process.
async fn shutdown(browser: &mut Browser) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "browser close failed, killing process");
        if let Some(Err(e)) = browser.kill().await {
            warn!(error = %e, "failed to kill browser process");
        }
    }

    if let Err(e) = browser.wait().await {
        debug!(error = %e, "browser wait error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_config() {
        let config = RendererConfig {
            render_timeout_secs: 12,
            max_concurrent_renders: 0,
            chrome_executable: Some("/opt/chromium/chrome".into()),
        };
        let settings = RenderSettings::from(&config);
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.max_concurrent, 1);
        assert_eq!(
            settings.chrome_executable,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );
    }

    #[test]
    fn default_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.max_concurrent, 2);
        assert!(settings.chrome_executable.is_none());
    }

    #[test]
    fn user_agent_is_desktop_chrome() {
        assert!(USER_AGENT.starts_with("Mozilla/5.0 (Macintosh"));
        assert!(USER_AGENT.contains("Chrome/96.0.4664.110"));
        assert!(!USER_AGENT.contains("  "));
    }

    #[tokio::test]
    async fn renderer_limits_concurrent_sessions() {
        let renderer = ChromeRenderer::new(RenderSettings {
            max_concurrent: 1,
            ..RenderSettings::default()
        });
        let first = renderer.permits.try_acquire().expect("first permit");
        assert!(renderer.permits.try_acquire().is_err());
        drop(first);
        assert!(renderer.permits.try_acquire().is_ok());
    }
}
