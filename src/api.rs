//! HTTP client for the Churchen API.
//!
//! Thin wrapper over GET/POST against a configured base URL. Response bodies
//! are parsed as JSON when the content-type header says so, otherwise kept
//! as plain text; `ok` mirrors the HTTP status range. Transport failures
//! surface as errors to the caller. No retries, no timeout, no backoff: any
//! network failure immediately fails the in-flight command.

use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::{ChurnError, Result};

/// Submission endpoint (the `/api/` variant is canonical; some deployments
/// also answered on `/churchen`)
pub const CHURN_PATH: &str = "/api/churchen";
pub const PUBLISH_PATH: &str = "/api/publish";
pub const FEED_PATH: &str = "/api/feed";
pub const HEALTH_PATH: &str = "/health";
/// Ingest path on the separate drafts host
pub const DRAFTS_PATH: &str = "/api/drafts";

/// Known public-idea path templates, probed in order by the open flow
const PUBLIC_IDEA_TEMPLATES: [&str; 3] = ["/public/idea/", "/api/idea/", "/idea/"];

// encodeURIComponent leaves these unescaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Candidate paths for the public JSON record of `id`, in probe order.
pub fn public_idea_paths(id: &str) -> Vec<String> {
    let encoded = utf8_percent_encode(id, PATH_SEGMENT).to_string();
    PUBLIC_IDEA_TEMPLATES
        .iter()
        .map(|template| format!("{}{}", template, encoded))
        .collect()
}

/// A response body, parsed according to its content type
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// A normalized HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Whether the HTTP status was in the success range
    pub ok: bool,
    pub status: u16,
    pub data: Payload,
}

impl ApiResponse {
    /// The JSON payload, or an unrecognized-shape error for text bodies.
    pub fn json(&self) -> Result<&Value> {
        match &self.data {
            Payload::Json(v) => Ok(v),
            Payload::Text(t) => Err(ChurnError::UnrecognizedResponse {
                message: format!("expected JSON, got text: {}", crate::abstract_of(t, 80)),
            }),
        }
    }

    /// User-facing message for a failed response: the body's `error` field
    /// when present, otherwise the HTTP status.
    pub fn error_message(&self) -> String {
        if let Payload::Json(v) = &self.data {
            if let Some(msg) = v["error"].as_str() {
                return msg.to_string();
            }
        }
        format!("HTTP {}", self.status)
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type.to_lowercase().contains("json")
}

/// Client bound to one API host
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        debug!("GET {}", self.url(path));
        let response = self.http.get(self.url(path)).send().await?;
        Self::read(response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        debug!("POST {}", self.url(path));
        let response = self
            .http
            .post(self.url(path))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await?;

        let data = if is_json_content_type(&content_type) {
            match serde_json::from_str(&text) {
                Ok(v) => Payload::Json(v),
                Err(e) => {
                    warn!("Response declared JSON but failed to parse: {}", e);
                    Payload::Text(text)
                }
            }
        } else {
            Payload::Text(text)
        };

        Ok(ApiResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            data,
        })
    }
}
