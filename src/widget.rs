use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::WidgetConfig;
use crate::data_models::{ErrorBody, SearchQuery, SearchResponse};
use crate::error::SearchError;
use crate::es_client::{EsClient, RawResponse};
use crate::query_engine::QueryEngine;
use crate::render;

/// A surface the widget writes HTML into, e.g. a page element.
///
/// The widget only ever replaces the whole content; it never creates or
/// removes the surface itself.
pub trait RenderTarget: Send + Sync {
    fn set_inner_html(&self, html: &str);
    fn inner_html(&self) -> String;
}

/// In-memory render target. Clones share the same content.
#[derive(Debug, Clone, Default)]
pub struct HtmlSlot {
    html: Arc<Mutex<String>>,
}

impl HtmlSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(html: impl Into<String>) -> Self {
        Self {
            html: Arc::new(Mutex::new(html.into())),
        }
    }
}

impl RenderTarget for HtmlSlot {
    fn set_inner_html(&self, html: &str) {
        let mut guard = self.html.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
        guard.push_str(html);
    }

    fn inner_html(&self) -> String {
        self.html.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Debug)]
pub enum SearchOutcome {
    Rendered { total: u64, hits: usize },
    Failed(SearchError),
    /// A later search was issued before this one completed; nothing was written.
    Superseded,
}

impl SearchOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, SearchOutcome::Rendered { .. })
    }
}

pub struct SearchWidget {
    config: WidgetConfig,
    client: EsClient,
    engine: QueryEngine,
    total_target: Arc<dyn RenderTarget>,
    results_target: Arc<dyn RenderTarget>,
    latest_token: AtomicU64,
    render_lock: Mutex<()>,
}

impl SearchWidget {
    pub fn new(
        config: WidgetConfig,
        total_target: Arc<dyn RenderTarget>,
        results_target: Arc<dyn RenderTarget>,
    ) -> Result<Self, SearchError> {
        let client = EsClient::new(config.timeout)?;
        Ok(Self::with_client(config, client, total_target, results_target))
    }

    /// Reuses an existing client, e.g. one shared by all requests of a server.
    pub fn with_client(
        config: WidgetConfig,
        client: EsClient,
        total_target: Arc<dyn RenderTarget>,
        results_target: Arc<dyn RenderTarget>,
    ) -> Self {
        Self {
            config,
            client,
            engine: QueryEngine::default(),
            total_target,
            results_target,
            latest_token: AtomicU64::new(0),
            render_lock: Mutex::new(()),
        }
    }

    pub fn with_query_engine(mut self, engine: QueryEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn build_query(&self, text: &str) -> SearchQuery {
        self.engine.build(text)
    }

    /// Runs one search and renders its outcome into the two targets.
    ///
    /// Only the most recently issued call may render: if another call starts
    /// while this one is in flight, this one's completion is dropped.
    pub async fn perform_search(&self, text: &str) -> SearchOutcome {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.engine.build(text);
        log::debug!("search #{token}: {:?}", text);

        let result = self.fetch(&query).await;

        let _guard = self.render_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.latest_token.load(Ordering::SeqCst) != token {
            log::debug!("search #{token} superseded, discarding response");
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(response) => {
                let total = response.hits.total.value();
                let hits = response.hits.hits.len();
                self.total_target
                    .set_inner_html(&render::render_total(total));
                self.results_target
                    .set_inner_html(&render::render_hits(&self.config.base_url, &response));
                log::info!("search #{token} rendered {hits} of {total} hits");
                SearchOutcome::Rendered { total, hits }
            }
            Err(e) => {
                log::warn!("search #{token} failed: {:#}", e);
                self.total_target.set_inner_html(&render::render_error(&e));
                if self.config.clear_results_on_error {
                    self.results_target.set_inner_html("");
                }
                SearchOutcome::Failed(e)
            }
        }
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let raw = self
            .client
            .post_json(&self.config.search_endpoint, query)
            .await?;
        parse_search_response(&raw)
    }
}

/// Separates a usable result document from error statuses and error or
/// malformed bodies.
pub fn parse_search_response(raw: &RawResponse) -> Result<SearchResponse, SearchError> {
    let error_body = serde_json::from_str::<ErrorBody>(&raw.body).ok();

    if !raw.is_success() {
        let reason = error_body
            .map(|b| b.error.describe())
            .unwrap_or_else(|| format!("HTTP {}", raw.status));
        return Err(SearchError::ErrorResponse {
            status: raw.status,
            reason,
        });
    }

    if let Some(body) = error_body {
        return Err(SearchError::ErrorResponse {
            status: body.status.unwrap_or(raw.status),
            reason: body.error.describe(),
        });
    }

    serde_json::from_str::<SearchResponse>(&raw.body)
        .map_err(|e| SearchError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn parses_well_formed_result_document() {
        let body = r#"{
            "took": 3,
            "timed_out": false,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_index": "docs", "_id": "1", "_score": 1.2,
                     "_source": {"url": "/a/", "title": "A", "content": "..."},
                     "highlight": {"content": ["<em>a</em>"]}},
                    {"_index": "docs", "_id": "2", "_score": 0.7,
                     "_source": {"url": "/b/", "title": null, "content": "..."}}
                ]
            }
        }"#;
        let parsed = parse_search_response(&raw(200, body)).unwrap();
        assert_eq!(parsed.hits.total.value(), 2);
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].highlight.content, vec!["<em>a</em>"]);
        assert_eq!(parsed.hits.hits[1].source.title, None);
        assert!(parsed.hits.hits[1].highlight.content.is_empty());
    }

    #[test]
    fn accepts_legacy_numeric_total() {
        let parsed =
            parse_search_response(&raw(200, r#"{"hits": {"total": 7, "hits": []}}"#)).unwrap();
        assert_eq!(parsed.hits.total.value(), 7);
    }

    #[test]
    fn error_status_with_error_body() {
        let body = r#"{"error": {"root_cause": [], "type": "index_not_found_exception",
                       "reason": "no such index [docs]"}, "status": 404}"#;
        match parse_search_response(&raw(404, body)) {
            Err(SearchError::ErrorResponse { status, reason }) => {
                assert_eq!(status, 404);
                assert_eq!(reason, "index_not_found_exception: no such index [docs]");
            }
            other => panic!("expected ErrorResponse, got {:?}", other),
        }
    }

    #[test]
    fn error_status_with_unparseable_body() {
        match parse_search_response(&raw(502, "<html>Bad Gateway</html>")) {
            Err(SearchError::ErrorResponse { status, reason }) => {
                assert_eq!(status, 502);
                assert_eq!(reason, "HTTP 502");
            }
            other => panic!("expected ErrorResponse, got {:?}", other),
        }
    }

    #[test]
    fn error_shaped_body_with_ok_status() {
        let body = r#"{"error": "Incorrect HTTP method for uri", "status": 405}"#;
        match parse_search_response(&raw(200, body)) {
            Err(SearchError::ErrorResponse { status, reason }) => {
                assert_eq!(status, 405);
                assert_eq!(reason, "Incorrect HTTP method for uri");
            }
            other => panic!("expected ErrorResponse, got {:?}", other),
        }
    }

    #[test]
    fn malformed_bodies() {
        for body in ["", "not json", "{}", r#"{"hits": {"hits": []}}"#, r#"{"hits": {"total": 1, "hits": [{"_source": {}}]}}"#] {
            assert!(
                matches!(parse_search_response(&raw(200, body)), Err(SearchError::Malformed(_))),
                "body should be malformed: {body}"
            );
        }
    }

    #[test]
    fn html_slot_replaces_content() {
        let slot = HtmlSlot::with_content("<p>old</p>");
        let shared = slot.clone();
        slot.set_inner_html("<p>new</p>");
        assert_eq!(shared.inner_html(), "<p>new</p>");
    }
}
