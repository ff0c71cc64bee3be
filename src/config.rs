//! Gateway configuration
//!
//! Configuration comes from a JSON file named on the command line, with host
//! and port overridable per invocation. A missing config file is a fatal
//! startup error.

use std::path::Path;

use clap::Parser;
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(name = "ollama-gateway", about = "HTTP gateway for a local Ollama daemon")]
pub struct CliArgs {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Override the listen host from the config file
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port from the config file
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL of the inference daemon, e.g. "http://localhost:11434"
    pub ollama_url: String,
    /// Model activated at startup
    pub default_model: String,
    /// Models this deployment intends to serve; probed against the daemon at startup
    #[serde(default)]
    pub supported_models: Vec<String>,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Request timeout for daemon calls, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Seconds between periodic daemon status log lines
    #[serde(default = "default_log_interval")]
    pub log_interval: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout() -> u64 {
    30
}

fn default_log_interval() -> u64 {
    60
}

impl GatewayConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("cannot read config file {}: {}", path.display(), e)
        })?;
        let config: GatewayConfig = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn from_args(args: &CliArgs) -> anyhow::Result<Self> {
        let mut config = Self::load(Path::new(&args.config))?;
        if let Some(host) = &args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_is_fatal() {
        let result = GatewayConfig::load(Path::new("/nonexistent/config.json"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cannot read config file"), "got: {}", err);
    }

    #[test]
    fn test_defaults_applied() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"ollama_url": "http://localhost:11434", "default_model": "llama2"}"#,
        )
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.default_temperature, 0.7);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.log_interval, 60);
        assert!(config.supported_models.is_empty());
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("gateway-config-bad-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let err = GatewayConfig::load(&path).unwrap_err().to_string();
        std::fs::remove_file(&path).unwrap();
        assert!(err.contains("invalid config file"), "got: {}", err);
    }

    #[test]
    fn test_full_config_roundtrip() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{
                "host": "127.0.0.1",
                "port": 9000,
                "ollama_url": "http://localhost:11434",
                "default_model": "gpt-oss:20b",
                "supported_models": ["gpt-oss:20b", "llama2"],
                "default_temperature": 0.2,
                "timeout_secs": 5,
                "log_interval": 10
            }"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_model, "gpt-oss:20b");
        assert_eq!(config.supported_models.len(), 2);
        assert_eq!(config.timeout_secs, 5);
    }
}
