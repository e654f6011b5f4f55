use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        search_endpoint: get_env_or_default(
            "SEARCH_ENDPOINT",
            "http://localhost:9200/docs/_search",
        ),
        site_base_url: get_env_or_default("SITE_BASE_URL", "http://localhost"),
        search_timeout_secs: get_env_parsed("SEARCH_TIMEOUT_SECS"),
        clear_results_on_error: get_env_parsed("CLEAR_RESULTS_ON_ERROR").unwrap_or(false),
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:3000"),
        static_dir: get_env_or_default("STATIC_DIR", "static"),
    }
});

pub struct Config {
    pub search_endpoint: String,
    pub site_base_url: String,
    pub search_timeout_secs: Option<u64>,
    pub clear_results_on_error: bool,
    pub bind_addr: String,
    pub static_dir: String,
}

impl Config {
    pub fn widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            search_endpoint: self.search_endpoint.clone(),
            base_url: self.site_base_url.clone(),
            timeout: self.search_timeout_secs.map(Duration::from_secs),
            clear_results_on_error: self.clear_results_on_error,
        }
    }
}

/// Everything a [`crate::widget::SearchWidget`] needs, handed over at construction.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Full URL of the `_search` endpoint, e.g. `http://localhost:9200/docs/_search`.
    pub search_endpoint: String,
    /// Site URL without trailing slash; hit URLs are appended to it verbatim.
    pub base_url: String,
    /// `None` waits forever, like a plain browser request would.
    pub timeout: Option<Duration>,
    /// Whether a failed search also wipes the previously rendered results.
    pub clear_results_on_error: bool,
}

impl WidgetConfig {
    pub fn new(search_endpoint: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            search_endpoint: search_endpoint.into(),
            base_url: base_url.into(),
            timeout: None,
            clear_results_on_error: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_clear_results_on_error(mut self, clear: bool) -> Self {
        self.clear_results_on_error = clear;
        self
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_config_builder_sets_fields() {
        let cfg = WidgetConfig::new("http://es:9200/idx/_search", "https://docs.example.com")
            .with_timeout(Duration::from_secs(5))
            .with_clear_results_on_error(true);

        assert_eq!(cfg.search_endpoint, "http://es:9200/idx/_search");
        assert_eq!(cfg.base_url, "https://docs.example.com");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(5)));
        assert!(cfg.clear_results_on_error);
    }

    #[test]
    fn widget_config_defaults_keep_stale_results() {
        let cfg = WidgetConfig::new("http://localhost:9200/docs/_search", "http://localhost");
        assert_eq!(cfg.timeout, None);
        assert!(!cfg.clear_results_on_error);
    }
}
