use reqwest::{Client, Url};
use std::time::Duration;

pub type SourceResult<T> = Result<T, SourceError>;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; slate/0.1; +toto round collector)";

/// A single source could not produce a slate: network, HTTP status, or parse failure.
/// Always recovered by the orchestrator moving on to the next tier.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Network error for {1}: {0}")]
    Network(reqwest::Error, String),
    #[error("API error for {1}: {0}")]
    Api(reqwest::Error, String),
    #[error("Parse error for {1}: {0}")]
    Parsing(reqwest::Error, String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Error: {0}")]
    Other(String),
}

/// Thin HTTP wrapper shared by every adapter. The per-request timeout is the
/// only cancellation mechanism; a timeout surfaces as `SourceError::Network`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            timeout,
        }
    }

    /// Build `base` + `params` into a URL, percent-encoding the values.
    pub fn url_with_params(base: &str, params: &[(&str, String)]) -> SourceResult<Url> {
        Url::parse_with_params(base, params.iter().map(|(k, v)| (*k, v.as_str())))
            .map_err(|e| SourceError::Other(format!("invalid url {base}: {e}")))
    }

    /// `bypass_cache` asks intermediaries for a fresh copy; set on force-refresh.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        bypass_cache: bool,
    ) -> SourceResult<T> {
        let response = self.send(url, bypass_cache).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Parsing(e, url.to_owned()))
    }

    pub async fn get_text(&self, url: &str, bypass_cache: bool) -> SourceResult<String> {
        let response = self.send(url, bypass_cache).await?;
        response
            .text()
            .await
            .map_err(|e| SourceError::Parsing(e, url.to_owned()))
    }

    async fn send(&self, url: &str, bypass_cache: bool) -> SourceResult<reqwest::Response> {
        let mut request = self.client.get(url).timeout(self.timeout);
        if bypass_cache {
            request = request
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .header(reqwest::header::PRAGMA, "no-cache");
        }
        log::debug!("GET {url}");

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e, url.to_owned()))?;

        response
            .error_for_status()
            .map_err(|e| SourceError::Api(e, url.to_owned()))
    }
}
