use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Inner HTML for the page's status and results elements.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub ok: bool,
    pub total_html: String,
    pub results_html: String,
    /// False when a failed search must leave the page's current results alone.
    pub replace_results: bool,
    pub processing_time_ms: u64,
}
