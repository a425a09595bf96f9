//! Blocking client for the unofficial public page API.

use super::{ChunkRequest, ChunkResponse, PageSource, SignRequest};
use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

/// Base URL of the public page API.
pub const PUBLIC_API_BASE: &str = "https://www.notion.so/api/v3";

/// Default delay after every request.
pub const DEFAULT_EXPORT_DELAY: Duration = Duration::from_millis(300);

const USER_AGENT: &str = concat!("notionmd/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`PublicApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub api_base: String,

    /// User-Agent header value
    pub user_agent: String,

    /// Pause after every request
    pub delay: Duration,

    /// Optional `token_v2` session cookie
    token: Option<SecretString>,
}

impl ClientConfig {
    /// Create a configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a `token_v2` cookie (needed by some public pages).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }

    /// Set the pause after every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Point the client at another API base.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Check whether a session token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: PUBLIC_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            delay: DEFAULT_EXPORT_DELAY,
            token: None,
        }
    }
}

/// [`PageSource`] over HTTP.
pub struct PublicApiClient {
    config: ClientConfig,
    http: Client,
}

impl PublicApiClient {
    /// Build a client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self { config, http })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let url = format!("{}/{}", self.config.api_base, endpoint);
        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = &self.config.token {
            request = request.header(COOKIE, format!("token_v2={}", token.expose_secret()));
        }

        log::debug!("POST {}", endpoint);
        let response = request.send();
        self.pause();
        let text = check(endpoint, response?)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {}", url);
        let response = self.http.get(url).send();
        self.pause();
        check(url, response?)
    }

    fn pause(&self) {
        if !self.config.delay.is_zero() {
            thread::sleep(self.config.delay);
        }
    }
}

/// Turn a non-success response into [`Error::Api`].
fn check(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::api(endpoint, status.as_u16(), &body))
}

impl PageSource for PublicApiClient {
    fn load_page_chunk(&self, request: &ChunkRequest) -> Result<ChunkResponse> {
        let value = match self.post("loadPageChunk", request) {
            Ok(value) => value,
            Err(e) if e.is_transport() => {
                log::debug!("loadPageChunk failed ({}), trying loadCachedPageChunk", e);
                self.post("loadCachedPageChunk", request)?
            }
            Err(e) => return Err(e),
        };
        Ok(serde_json::from_value(value)?)
    }

    fn query_collection(
        &self,
        collection_id: &str,
        view_id: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let body = json!({
            "collection": {"id": collection_id},
            "collectionView": {"id": view_id},
            "loader": {
                "type": "reducer",
                "reducers": {
                    "collection_group_results": {"type": "results", "limit": limit}
                },
                "searchQuery": "",
                "userTimeZone": "UTC"
            }
        });
        let value = self.post("queryCollection", &body)?;
        let ids = value
            .pointer("/result/reducerResults/collection_group_results/blockIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    fn sign_urls(&self, requests: &[SignRequest]) -> Result<Vec<Option<String>>> {
        let urls: Vec<Value> = requests
            .iter()
            .map(|r| {
                json!({
                    "url": r.url,
                    "permissionRecord": {"table": "block", "id": r.block_id}
                })
            })
            .collect();
        let value = self.post("getSignedFileUrls", &json!({ "urls": urls }))?;

        let signed = value.get("signedUrls").and_then(Value::as_array);
        Ok((0..requests.len())
            .map(|i| {
                signed
                    .and_then(|list| list.get(i))
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get(url)?.bytes()?.to_vec())
    }

    fn fetch_html(&self, url: &str) -> Result<String> {
        Ok(self.get(url)?.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_api_base("http://localhost:9000/api/v3/")
            .with_delay(Duration::ZERO)
            .with_token("secret");
        assert_eq!(config.api_base, "http://localhost:9000/api/v3");
        assert!(config.delay.is_zero());
        assert!(config.has_token());
    }

    #[test]
    fn test_token_is_not_debug_printed() {
        let config = ClientConfig::new().with_token("very-secret-token");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("very-secret-token"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, PUBLIC_API_BASE);
        assert_eq!(config.delay, Duration::from_millis(300));
        assert!(!config.has_token());
        assert!(config.user_agent.starts_with("notionmd/"));
    }
}
