//! Farming advice from a hosted language model.
//!
//! The advisor sends one prompt per question to Bedrock's `InvokeModel`
//! endpoint and returns whatever text comes back. It never fails from the
//! caller's point of view: any transport, status or decoding problem is
//! logged and replaced by [`FALLBACK_ADVICE`].

mod prompt;
pub mod sigv4;

use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AdvisorSettings, DEFAULT_REGION};
use crate::farm::FarmSnapshot;

pub use prompt::build_prompt;

pub const FALLBACK_ADVICE: &str = "I'm having trouble connecting right now. Ask me about the current weather or crop conditions instead.";
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

const SERVICE: &str = "bedrock";
const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisor credentials are not configured")]
    MissingCredentials,
    #[error("invalid advisor endpoint: {0}")]
    Endpoint(String),
    #[error("request signing failed: {0}")]
    Signing(String),
    #[error("advisor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("advisor returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected advisor response: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub region: String,
    pub credentials: Option<Credentials>,
    /// Replaces `https://bedrock-runtime.{region}.amazonaws.com`.
    pub endpoint: Option<String>,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

impl AdvisorConfig {
    pub fn new(settings: &AdvisorSettings) -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            credentials: None,
            endpoint: None,
            model_id: settings.model_id.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Reads region and credentials from the environment:
    /// - `AWS_REGION` (default `us-west-2`)
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, optional `AWS_SESSION_TOKEN`
    /// - `SMARTFARM_ADVISOR_ENDPOINT` to point at a different host
    ///
    /// Missing credentials are not an error here; every request will simply
    /// fall back until they are provided.
    pub fn from_env(settings: &AdvisorSettings) -> Self {
        let mut config = Self::new(settings);
        if let Some(region) = env_non_empty("AWS_REGION") {
            config.region = region;
        }
        config.endpoint = env_non_empty("SMARTFARM_ADVISOR_ENDPOINT");
        config.credentials = match (
            env_non_empty("AWS_ACCESS_KEY_ID"),
            env_non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id,
                secret_access_key,
                session_token: env_non_empty("AWS_SESSION_TOKEN"),
            }),
            _ => {
                warn!("AWS credentials not set; the advisor will answer with its fallback");
                None
            }
        };
        config
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn invoke_url(&self) -> Result<Url, AdvisoryError> {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        };
        let url = format!(
            "{base}/model/{}/invoke",
            sigv4::uri_encode(&self.model_id, true)
        );
        Url::parse(&url).map_err(|err| AdvisoryError::Endpoint(format!("{url}: {err}")))
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub struct AdvisorClient {
    http: reqwest::Client,
    config: AdvisorConfig,
}

impl AdvisorClient {
    pub fn new(config: AdvisorConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "falling back to a default HTTP client");
                reqwest::Client::new()
            });
        Self { http, config }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Asks the model about `snapshot`. Always yields text.
    pub async fn request_advice(&self, snapshot: &FarmSnapshot, question: &str) -> String {
        match self.try_request_advice(snapshot, question).await {
            Ok(advice) => advice,
            Err(err) => {
                warn!(error = %err, "advisor unavailable; using fallback advice");
                FALLBACK_ADVICE.to_string()
            }
        }
    }

    pub async fn try_request_advice(
        &self,
        snapshot: &FarmSnapshot,
        question: &str,
    ) -> Result<String, AdvisoryError> {
        let credentials = self
            .config
            .credentials
            .as_ref()
            .ok_or(AdvisoryError::MissingCredentials)?;
        let url = self.config.invoke_url()?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(AdvisoryError::Endpoint(url.to_string())),
        };

        let prompt = build_prompt(snapshot, question);
        let body = serde_json::to_vec(&self.request_body(&prompt))
            .map_err(|err| AdvisoryError::UnexpectedShape(err.to_string()))?;

        let signed = sigv4::sign(
            &sigv4::SigningRequest {
                method: "POST",
                host: &host,
                path: url.path(),
                content_type: CONTENT_TYPE,
                payload: &body,
            },
            credentials,
            &sigv4::SigningScope {
                region: &self.config.region,
                service: SERVICE,
                time: Utc::now(),
            },
        )
        .map_err(|err| AdvisoryError::Signing(err.to_string()))?;

        info!(
            model = %self.config.model_id,
            region = %self.config.region,
            day = snapshot.day,
            "requesting farming advice"
        );
        let mut request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, CONTENT_TYPE);
        for (name, value) in signed {
            request = request.header(name, value);
        }
        let response = request.body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        debug!(response = %json, "advisor response");
        extract_advice(&json)
    }

    fn request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "anthropic_version": ANTHROPIC_VERSION,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }
}

/// Pulls the advice out of `messages[0].content`, either a string or a list
/// of text blocks.
pub fn extract_advice(json: &Value) -> Result<String, AdvisoryError> {
    json.get("messages")
        .and_then(|messages| messages.get(0))
        .and_then(|message| message.get("content"))
        .and_then(content_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            AdvisoryError::UnexpectedShape("response carried no message content".to_owned())
        })
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => {
            let parts: Vec<&str> = blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.concat())
        }
        _ => None,
    }
}
