use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateReqInput {
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub think: bool,
    /// Generation parameters forwarded to the daemon (temperature etc.)
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateOutput {
    pub response: String,
    pub model: String,
    pub created_at: Option<String>,
    pub done: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SwitchModelReqInput {
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SwitchModelResponse {
    pub success: bool,
    pub model: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub daemon_running: bool,
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PipelineReqInput {
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PipelineRespOutput {
    pub summary: String,
    pub analysis: String,
    pub model: String,
}

/// Request body sent to the daemon's generate endpoint
#[derive(Debug, Serialize)]
pub struct DaemonGenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub think: bool,
    pub options: Value,
}

/// Response body from the daemon's generate endpoint
///
/// The daemon omits fields depending on version; only `response` is relied on.
#[derive(Debug, Deserialize)]
pub struct DaemonGenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_done() -> bool {
    true
}

/// Normalize the daemon's catalog response into a flat name list.
///
/// The daemon's shape is not contractually stable: current versions wrap the
/// list as `{"models": [{"name": ...}, ...]}`, older ones used a `model` key
/// or returned a bare list. Entries may also be bare strings. Anything else
/// is rejected rather than guessed at.
pub fn parse_model_names(url: &str, payload: &Value) -> ClientResult<Vec<String>> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("models") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ClientError::UnexpectedPayload {
                    url: url.to_string(),
                    reason: "catalog object has no 'models' list".to_string(),
                });
            }
        },
        _ => {
            return Err(ClientError::UnexpectedPayload {
                url: url.to_string(),
                reason: "catalog is neither an object nor a list".to_string(),
            });
        }
    };
    entries
        .iter()
        .map(|entry| match entry {
            Value::String(name) => Ok(name.clone()),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("model"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ClientError::UnexpectedPayload {
                    url: url.to_string(),
                    reason: "catalog entry has no name".to_string(),
                }),
            _ => Err(ClientError::UnexpectedPayload {
                url: url.to_string(),
                reason: "catalog entry is neither an object nor a string".to_string(),
            }),
        })
        .collect()
}
