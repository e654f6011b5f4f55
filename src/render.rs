//! HTML fragments written into the two render targets.
//!
//! Hit titles, URLs and highlight fragments are inserted as-is: fragments carry
//! the engine's `<em>` markup and the index content is trusted.

use crate::data_models::{Hit, SearchResponse};
use crate::error::SearchError;

pub const SUCCESS_CLASS: &str = "docsearch_success";
pub const ERROR_CLASS: &str = "docsearch_error";

/// Status shown when the request could not be delivered at all.
pub const TRANSPORT_ERROR_HTML: &str = "<p class=\"docsearch_error\">Error</p>";

pub fn render_total(total: u64) -> String {
    format!("<p class=\"{SUCCESS_CLASS}\">Results: {total}</p>")
}

pub fn page_link(base_url: &str, hit_url: &str) -> String {
    format!("{base_url}{hit_url}")
}

pub fn render_hit(base_url: &str, hit: &Hit, out: &mut String) {
    let title = hit.source.title.as_deref().unwrap_or_default();
    let link = page_link(base_url, &hit.source.url);

    out.push_str(&format!(
        "<h2>{title}</h2><p>Page URL: <a href=\"{link}\">{link}</a></p><pre>"
    ));
    for fragment in &hit.highlight.content {
        out.push_str(fragment);
        out.push_str("\n\n");
    }
    out.push_str("</pre>");
}

pub fn render_hits(base_url: &str, response: &SearchResponse) -> String {
    let mut out = String::new();
    for hit in &response.hits.hits {
        render_hit(base_url, hit, &mut out);
    }
    out
}

pub fn render_error(err: &SearchError) -> String {
    match err {
        SearchError::Transport(_) => TRANSPORT_ERROR_HTML.to_string(),
        SearchError::ErrorResponse { reason, .. } => {
            format!("<p class=\"{ERROR_CLASS}\">Search failed: {reason}</p>")
        }
        SearchError::Malformed(_) => format!("<p class=\"{ERROR_CLASS}\">Malformed response</p>"),
    }
}
