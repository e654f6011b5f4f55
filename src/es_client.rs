use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

/// Content type used for every request body, bulk NDJSON included.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Status and raw body of a completed exchange.
///
/// Interpreting the body is left to the caller: the cluster answers errors
/// with JSON too, so a non-2xx status is not a transport failure.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Thin wrapper over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct EsClient {
    http: reqwest::Client,
}

impl EsClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// A body that fails to serialize surfaces as a builder error from `send`.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<RawResponse, reqwest::Error> {
        self.send(self.request(Method::POST, url).json(body)).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<RawResponse, reqwest::Error> {
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    /// `body` must already be newline-delimited JSON ending in `\n`.
    pub async fn post_ndjson(
        &self,
        url: &str,
        body: String,
    ) -> Result<RawResponse, reqwest::Error> {
        self.send(self.request(Method::POST, url).body(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<RawResponse, reqwest::Error> {
        self.send(self.request(Method::DELETE, url)).await
    }

    // Set before `.json()`, which only adds its own content type when none is present.
    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, reqwest::Error> {
        let res = request.send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        log::debug!("response received, status: {status}, {} bytes", body.len());
        Ok(RawResponse { status, body })
    }
}

/// Joins a cluster base URL and a path, dropping trailing slashes from the base.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_strips_trailing_slashes() {
        assert_eq!(
            join_url("http://127.0.0.1:9200/", "docs"),
            "http://127.0.0.1:9200/docs"
        );
        assert_eq!(
            join_url("http://127.0.0.1:9200", "docs/_bulk?refresh"),
            "http://127.0.0.1:9200/docs/_bulk?refresh"
        );
        assert_eq!(join_url("http://es//", "/docs/"), "http://es/docs/");
    }

    #[test]
    fn raw_response_success_range() {
        let ok = RawResponse {
            status: 201,
            body: String::new(),
        };
        let bad = RawResponse {
            status: 400,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
