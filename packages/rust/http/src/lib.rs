//! HTTP API for PageInsights.
//!
//! Routes:
//! - `GET /`: liveness probe with a fixed payload
//! - `GET /page/{page_id}`: cache-or-scrape a single page
//! - `GET /search?limit=N`: up to `N` stored pages (default 10)

pub mod api_error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use pageinsights_core::PageService;

pub use api_error::ApiError;
pub use handlers::{DEFAULT_SEARCH_LIMIT, SearchQuery};

/// Shared state for all handlers.
pub struct AppState {
    pub service: Arc<PageService>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/page/{page_id}", get(handlers::get_page))
        .route("/search", get(handlers::search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pageinsights_core::Summarizer;
    use pageinsights_extractor::CompanyPageExtractor;
    use pageinsights_renderer::PageRenderer;
    use pageinsights_shared::{Page, PageInsightsError, Result};
    use pageinsights_storage::Storage;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    struct FixtureRenderer {
        markup: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageRenderer for FixtureRenderer {
        async fn render(&self, _page_id: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.markup
                .clone()
                .ok_or_else(|| PageInsightsError::Render("blocked".into()))
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, _description: &str) -> Result<String> {
            Ok("A concise summary.".into())
        }
    }

    async fn app(markup: Option<&str>) -> (Router, Arc<FixtureRenderer>) {
        let tmp = std::env::temp_dir().join(format!("pi_http_test_{}.db", Uuid::now_v7()));
        let storage = Arc::new(Storage::open(&tmp).await.expect("open test db"));
        let renderer = Arc::new(FixtureRenderer {
            markup: markup.map(String::from),
            calls: AtomicUsize::new(0),
        });
        let service = PageService::new(
            storage,
            renderer.clone(),
            Arc::new(CompanyPageExtractor),
            Arc::new(EchoSummarizer),
        );
        let state = Arc::new(AppState {
            service: Arc::new(service),
        });
        (create_router(state), renderer)
    }

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let (router, _) = app(None).await;
        let (status, body) = get(&router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert!(body["msg"].is_string());
    }

    #[tokio::test]
    async fn page_is_scraped_then_cached() {
        let html = load_fixture("company.html");
        let (router, renderer) = app(Some(&html)).await;

        let (status, first) = get(&router, "/page/globex").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["page_id"], "globex");
        assert_eq!(first["name"], "Globex Corporation");
        assert_eq!(first["url"], "https://www.linkedin.com/company/globex");
        assert_eq!(first["ai_summary"], "A concise summary.");
        assert!(first["posts"].as_array().unwrap().len() <= 3);

        let (_, second) = get(&router, "/page/globex").await;
        assert_eq!(first, second);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blocked_page_is_degraded_not_an_error() {
        let (router, _) = app(None).await;

        let (status, body) = get(&router, "/page/initech").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "initech");
        assert_eq!(body["description"], "Failed to scrape (LinkedIn Blocked)");
        assert_eq!(body["followers"], "0");
        assert_eq!(body["posts"], Value::Array(vec![]));
        assert!(body["ai_summary"].is_null());
    }

    #[tokio::test]
    async fn search_defaults_and_bounds() {
        let (router, _) = app(None).await;
        for id in (0..12).map(|i| format!("org-{i}")) {
            let (status, _) = get(&router, &format!("/page/{id}")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = get(&router, "/search").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), DEFAULT_SEARCH_LIMIT as usize);

        let (_, body) = get(&router, "/search?limit=3").await;
        let pages: Vec<Page> = serde_json::from_value(body).unwrap();
        assert_eq!(pages.len(), 3);

        let (_, body) = get(&router, "/search?limit=0").await;
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = get(&router, "/search?limit=100").await;
        assert_eq!(body.as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn search_rejects_non_numeric_limit() {
        let (router, _) = app(None).await;
        let (status, _) = get(&router, "/search?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
