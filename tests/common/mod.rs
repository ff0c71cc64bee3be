//! Shared test helpers: a hand-rolled mock inference daemon.
//!
//! The daemon listens on an ephemeral port, serves canned responses per
//! path (cycling through a sequence when several are given), and records
//! every request's path and body so tests can assert on call counts and
//! prompt contents.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use ollama_gateway::config::GatewayConfig;

pub struct MockDaemon {
    pub url: String,
    hits: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockDaemon {
    /// All recorded (path, body) pairs, in arrival order.
    pub async fn hits(&self) -> Vec<(String, String)> {
        self.hits.lock().await.clone()
    }

    pub async fn hit_count(&self, path: &str) -> usize {
        self.hits
            .lock()
            .await
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }
}

/// Spawn the mock daemon. `routes` maps a path to a sequence of
/// (status, body) responses; calls beyond the sequence cycle through it.
/// Unknown paths get a 404.
pub async fn spawn_mock_daemon(routes: Vec<(&'static str, Vec<(u16, String)>)>) -> MockDaemon {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let hits_clone = Arc::clone(&hits);
    let routes: HashMap<&'static str, Vec<(u16, String)>> = routes.into_iter().collect();

    tokio::spawn(async move {
        let mut call_counts: HashMap<String, usize> = HashMap::new();
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let Some((path, body)) = read_request(&mut stream).await else {
                continue;
            };
            hits_clone.lock().await.push((path.clone(), body));

            let count = call_counts.entry(path.clone()).or_insert(0);
            let (status, response_body) = match routes.get(path.as_str()) {
                Some(responses) if !responses.is_empty() => {
                    let (status, body) = &responses[*count % responses.len()];
                    (*status, body.clone())
                }
                _ => (404, String::from("{}")),
            };
            *count += 1;

            let response = format!(
                "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                response_body.len(),
                response_body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    MockDaemon {
        url: format!("http://{}", addr),
        hits,
    }
}

/// Read one HTTP request off the stream, returning its path and body.
async fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut raw = Vec::new();
    let mut buffer = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buffer).await.ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if raw.len() > 65536 {
            return None;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while raw.len() < header_end + content_length {
        let n = stream.read(&mut buffer).await.ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
    }
    let body = String::from_utf8_lossy(&raw[header_end..]).to_string();
    Some((path, body))
}

/// A URL nothing listens on: bind an ephemeral port, then release it.
pub async fn dead_daemon_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn test_config(daemon_url: &str) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ollama_url: daemon_url.to_string(),
        default_model: "test-model".to_string(),
        supported_models: vec!["test-model".to_string()],
        default_temperature: 0.7,
        timeout_secs: 5,
        log_interval: 60,
    }
}
