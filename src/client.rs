//! HTTP client for the question-answering backend.
//!
//! Three calls are supported:
//!
//! - `POST /ask` with `{ "query": ... }`
//! - `POST /clear_history` (body ignored)
//! - `GET /stats`

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::message::ContentFormat;
use crate::stats::StatsResponse;

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
}

/// Confidence is sent as a number by some backends and as a formatted
/// string (`"0.91"`) by others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskMetadata {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub query_type: Option<String>,
}

/// Raw `/ask` body. Either an answer or an `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<AskMetadata>,
    /// Explicit content flag. When absent the content is sniffed.
    #[serde(default)]
    pub format: Option<ContentFormat>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AskReply {
    pub response: String,
    pub source: String,
    pub confidence: Option<f64>,
    pub format: Option<ContentFormat>,
}

impl AskResponse {
    /// Split into an answer or the application-level error it carries.
    pub fn into_reply(self) -> Result<AskReply, ClientError> {
        if let Some(err) = self.error {
            return Err(ClientError::Application(err));
        }
        Ok(AskReply {
            response: self.response.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            confidence: self.metadata.and_then(|m| m.confidence),
            format: self.format,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

// -- Client -------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client for `config.base_url`.
    ///
    /// Only a connect timeout is ever applied; requests themselves have no
    /// deadline.
    pub fn new(config: &Config) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        // Builder failure only happens when TLS init fails; fall back to defaults.
        let http = builder.build().unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask a question.
    ///
    /// # Returns
    /// - `Ok(AskReply)` on a 2xx body without an `error` field.
    /// - `Err(ClientError::Connect | Timeout)` when no response arrived.
    /// - `Err(ClientError::Status)` on a non-2xx status.
    /// - `Err(ClientError::Application)` when the body carries `error`.
    /// - `Err(ClientError::Decode)` when the body is not the expected JSON.
    pub async fn ask(&self, query: &str) -> Result<AskReply, ClientError> {
        let url = self.url("/ask");
        let started = Instant::now();
        debug!(url = %url, query_len = query.len(), "sending question");

        let resp = self
            .http
            .post(&url)
            .json(&AskRequest { query })
            .send()
            .await
            .map_err(|e| ClientError::from_transport(&url, e))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(&url, e))?;
        debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "question settled"
        );

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), detail = %detail, "ask returned non-success status");
            return Err(ClientError::status(status.as_u16()));
        }

        serde_json::from_slice::<AskResponse>(&bytes)
            .map_err(|e| ClientError::Decode(e.to_string()))?
            .into_reply()
    }

    /// Ask the backend to drop its session history.
    pub async fn clear_history(&self) -> Result<(), ClientError> {
        let url = self.url("/clear_history");
        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(&url, e))?;
        if !resp.status().is_success() {
            return Err(ClientError::status(resp.status().as_u16()));
        }
        Ok(())
    }

    /// Fetch the learning statistics.
    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        let url = self.url("/stats");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(&url, e))?;
        if !resp.status().is_success() {
            return Err(ClientError::status(resp.status().as_u16()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(&url, e))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
