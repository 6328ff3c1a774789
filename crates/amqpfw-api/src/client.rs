// HTTP client for the broker-hosting API
//
// Wraps `reqwest::Client` with base-URL joining, Basic auth, and status
// mapping. The firewall endpoints themselves are implemented in
// `firewall.rs` so this module stays focused on transport mechanics.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error body shapes returned by the API: `{"error": "..."}` or `{"message": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const BODY_PREVIEW_CHARS: usize = 200;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Async client for the hosting API.
///
/// Every request authenticates with HTTP Basic auth: an empty user name
/// and the API key as password.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Public endpoint of the hosted service.
    pub const DEFAULT_BASE_URL: &'static str = "https://customer.cloudamqp.com";

    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, API key, and transport config.
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            api_key,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        api_key: SecretString,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            api_key,
            timeout: TransportConfig::default().timeout,
        })
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure a trailing slash so relative joins keep any path prefix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/instances/42/security/firewall"`).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        self.send(self.http.post(url).json(body)).await?;
        Ok(())
    }

    pub(crate) async fn put<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        self.send(self.http.put(url).json(body)).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    // ── Response handling ────────────────────────────────────────────

    /// Attach credentials, send, and map non-success statuses to errors.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = builder
            .basic_auth("", Some(self.api_key.expose_secret()))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    Error::Transport(e)
                }
            })?;

        let status = resp.status();
        trace!(%status, "response received");
        if status.is_success() {
            return Ok(resp);
        }

        let path = resp.url().path().to_owned();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication {
                message: if message.is_empty() {
                    format!("API key rejected (HTTP {})", status.as_u16())
                } else {
                    message
                },
            },
            StatusCode::NOT_FOUND => Error::NotFound { path },
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Parse a JSON success body, keeping the raw text on failure.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Extract a human-readable message from an error body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.message) {
            return msg;
        }
    }
    preview(body)
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(base, SecretString::from("key"), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("https://api.example.com");
        assert_eq!(c.base_url().as_str(), "https://api.example.com/");
    }

    #[test]
    fn join_keeps_path_prefix() {
        let c = client("https://api.example.com/proxy");
        let url = c.url("api/instances/1/security/firewall").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/proxy/api/instances/1/security/firewall"
        );
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"error":"Invalid ip"}"#), "Invalid ip");
        assert_eq!(error_message(r#"{"message":"Busy"}"#), "Busy");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let body = "é".repeat(500);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_CHARS);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let c = ApiClient::with_client(
            "https://api.example.com",
            SecretString::from("s3cr3t-value"),
            reqwest::Client::new(),
        )
        .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("s3cr3t-value"));
        assert!(dbg.contains("api.example.com"));
    }
}
