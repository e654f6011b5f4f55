use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::widget::{HtmlSlot, RenderTarget, SearchWidget};

use super::AppState;
use super::models::{SearchRequest, SearchResponse};

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let start = Instant::now();

    let total = Arc::new(HtmlSlot::new());
    let results = Arc::new(HtmlSlot::new());
    let widget = SearchWidget::with_client(
        state.widget_config.clone(),
        state.client.clone(),
        total.clone(),
        results.clone(),
    );

    let outcome = widget.perform_search(&request.query).await;
    let ok = outcome.is_rendered();

    Json(SearchResponse {
        query: request.query,
        ok,
        replace_results: ok || state.widget_config.clear_results_on_error,
        total_html: total.inner_html(),
        results_html: results.inner_html(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}
