use std::time::Duration;

use drain_core::Broadcast;
use drain_logging::drain_debug;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;

use crate::config::Configuration;
use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Source of broadcasts for one status filter. The whole result set comes
/// back from a single call.
#[async_trait::async_trait]
pub trait BroadcastSource: Send + Sync {
    async fn broadcasts(&self, status: &str) -> Result<Vec<Broadcast>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct BroadcastsResponse {
    broadcasts: Vec<WireBroadcast>,
}

#[derive(Debug, Deserialize)]
struct WireBroadcast {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    send_at: Option<String>,
    #[serde(default)]
    html_body: Option<String>,
}

impl From<WireBroadcast> for Broadcast {
    fn from(wire: WireBroadcast) -> Self {
        Broadcast {
            subject: wire.subject.unwrap_or_default(),
            send_at: wire.send_at,
            html_body: wire.html_body.unwrap_or_default(),
        }
    }
}

/// Drip REST API client: `GET {api_url}{account_id}/broadcasts?status=...`
/// with the API key as the basic-auth user name.
#[derive(Debug, Clone)]
pub struct DripClient {
    api_url: Url,
    account_id: String,
    api_key: String,
    settings: FetchSettings,
}

impl DripClient {
    pub fn new(
        api_url: Url,
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            api_url,
            account_id: account_id.into(),
            api_key: api_key.into(),
            settings,
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(
            config.api_url.clone(),
            config.account_id.clone(),
            config.api_key.clone(),
            config.fetch_settings(),
        )
    }

    fn broadcasts_url(&self, status: &str) -> Result<Url, FetchError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::new(FailureKind::InvalidUrl, "api url cannot be a base"))?
            .pop_if_empty()
            .push(&self.account_id)
            .push("broadcasts");
        url.query_pairs_mut().append_pair("status", status);
        Ok(url)
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.redirect_limit,
            ))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    async fn fetch_body(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let client = self.build_client()?;
        let response = client
            .get(url)
            .basic_auth(&self.api_key, Some(""))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl BroadcastSource for DripClient {
    async fn broadcasts(&self, status: &str) -> Result<Vec<Broadcast>, FetchError> {
        let url = self.broadcasts_url(status)?;
        drain_debug!("GET {}", url);
        let bytes = self.fetch_body(url).await?;
        let parsed: BroadcastsResponse = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        Ok(parsed.broadcasts.into_iter().map(Broadcast::from).collect())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
