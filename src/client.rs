//! Client wrapper around the inference daemon's HTTP API.
//!
//! One `OllamaClient` owns one session (active model + default generation
//! options). The session is behind an async RwLock so a client shared across
//! concurrent request handlers stays race-free: `generate` takes a read
//! snapshot, `switch_model` holds the write lock only for the assignment.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use log::debug;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::config::GatewayConfig;
use crate::error::{ClientError, ClientResult};
use crate::io_struct::{
    DaemonGenerateRequest, DaemonGenerateResponse, GenerateOutput, parse_model_names,
};
use crate::resolver;

/// Mutable per-client state: which model is active and the default options
/// merged into every generate call.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub active_model: String,
    pub default_options: Value,
}

#[derive(Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<ClientSession>,
}

impl OllamaClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let session = ClientSession {
            active_model: config.default_model.clone(),
            default_options: json!({ "temperature": config.default_temperature }),
        };
        Ok(Self {
            http,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            session: RwLock::new(session),
        })
    }

    fn api_path(&self, api_path: &str) -> String {
        if api_path.starts_with("/") {
            format!("{}{}", self.base_url, api_path)
        } else {
            format!("{}/{}", self.base_url, api_path)
        }
    }

    /// Snapshot of the currently active model.
    pub async fn active_model(&self) -> String {
        self.session.read().await.active_model.clone()
    }

    /// Build a daemon request from the session snapshot, with per-request
    /// options overriding the session defaults key by key.
    async fn build_generate_request(
        &self,
        prompt: &str,
        think: bool,
        stream: bool,
        options: Option<&Value>,
    ) -> DaemonGenerateRequest {
        let session = self.session.read().await;
        let mut merged = session.default_options.clone();
        if let (Value::Object(base), Some(Value::Object(extra))) = (&mut merged, options) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        DaemonGenerateRequest {
            model: session.active_model.clone(),
            prompt: prompt.to_string(),
            stream,
            think,
            options: merged,
        }
    }

    /// Generate a completion for `prompt` with the active model.
    pub async fn generate(
        &self,
        prompt: &str,
        think: bool,
        options: Option<&Value>,
    ) -> ClientResult<GenerateOutput> {
        let request = self.build_generate_request(prompt, think, false, options).await;
        let url = self.api_path("/api/generate");
        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| ClientError::ConnectionFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::ModelNotFound {
                model: request.model,
                available: Vec::new(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::GenerationFailed {
                model: request.model,
                reason: format!(
                    "daemon returned {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ),
            });
        }
        let parsed: DaemonGenerateResponse =
            serde_json::from_slice(&body).map_err(|e| ClientError::GenerationFailed {
                model: request.model.clone(),
                reason: format!("malformed generate payload: {}", e),
            })?;
        debug!("generate ok, {} bytes of response text", parsed.response.len());
        Ok(GenerateOutput {
            response: parsed.response,
            model: parsed.model.unwrap_or(request.model),
            created_at: parsed.created_at,
            done: parsed.done,
        })
    }

    /// Generate with `stream: true`, passing the daemon's body bytes through
    /// untouched for the HTTP layer to stream to the caller.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        think: bool,
        options: Option<&Value>,
    ) -> ClientResult<Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>> {
        let request = self.build_generate_request(prompt, think, true, options).await;
        let url = self.api_path("/api/generate");
        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::ModelNotFound {
                model: request.model,
                available: Vec::new(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::GenerationFailed {
                model: request.model,
                reason: format!("daemon returned {}", status),
            });
        }
        Ok(Box::pin(resp.bytes_stream()))
    }

    /// Query the daemon's catalog and normalize it to a flat name list.
    pub async fn list_models(&self) -> ClientResult<Vec<String>> {
        let url = self.api_path("/api/tags");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| ClientError::ConnectionFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(ClientError::UnexpectedPayload {
                url,
                reason: format!("catalog request returned {}", status),
            });
        }
        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| ClientError::UnexpectedPayload {
                url: url.clone(),
                reason: format!("catalog is not valid json: {}", e),
            })?;
        parse_model_names(&url, &payload)
    }

    /// Check daemon liveness. Any successful response counts as healthy; the
    /// payload shape is the daemon's business and is passed through as-is.
    pub async fn check_health(&self) -> ClientResult<Value> {
        let url = self.api_path("/api/ps");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::ConnectionFailed {
                url,
                reason: format!("status check returned {}", status),
            });
        }
        let payload = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok(payload)
    }

    /// Switch the active model after validating the request against the live
    /// catalog. Returns the resolved catalog name on success, `None` when the
    /// model is not available (the session is left untouched). Catalog fetch
    /// failures propagate.
    pub async fn switch_model(&self, requested: &str) -> ClientResult<Option<String>> {
        let catalog = self.list_models().await?;
        let resolved = match resolver::resolve(requested, &catalog) {
            Some(name) => name.to_string(),
            None => {
                debug!("model {:?} not resolvable against catalog {:?}", requested, catalog);
                return Ok(None);
            }
        };
        let mut session = self.session.write().await;
        session.active_model = resolved.clone();
        Ok(Some(resolved))
    }
}
