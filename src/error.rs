use thiserror::Error;

/// Ways a single search can fail before anything is rendered as results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request never produced a response (connection refused, DNS, timeout...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but with a non-2xx status or an error document.
    #[error("Search failed (status {status}): {reason}")]
    ErrorResponse { status: u16, reason: String },

    /// 2xx response whose body is not a result document.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid url_transform pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}
