//! Typed HTTP client for the LanguageTool `/v2` API.
//!
//! Both providers speak this protocol: the local one against a child
//! process on localhost, the remote one against the hosted service.

use serde::Deserialize;
use std::time::Duration;

use super::GrammarError;
use crate::models::{GrammarIssue, MAX_REPLACEMENTS};

/// Longest upstream error body echoed into logs
const MAX_ERROR_BODY: usize = 512;

pub struct LanguageToolClient {
    base_url: String,
    language: String,
    timeout: Duration,
    client: reqwest::Client,
}

// ── LanguageTool API types ──────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub matches: Vec<LtMatch>,
}

/// A single rule match as reported by LanguageTool
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LtMatch {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<LtReplacement>,
    #[serde(default)]
    pub rule: Option<LtRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LtReplacement {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LtRule {
    pub id: String,
}

impl From<LtMatch> for GrammarIssue {
    fn from(m: LtMatch) -> Self {
        Self {
            message: m.message,
            offset: m.offset,
            length: m.length,
            replacements: m
                .replacements
                .into_iter()
                .take(MAX_REPLACEMENTS)
                .map(|r| r.value)
                .collect(),
            rule_id: m.rule.map(|r| r.id),
        }
    }
}

// ── Client impl ─────────────────────────────────────

impl LanguageToolClient {
    pub fn new(base_url: &str, language: &str, timeout: Duration) -> Result<Self, GrammarError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GrammarError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the LanguageTool server answers
    pub async fn health(&self) -> Result<bool, GrammarError> {
        let resp = self
            .client
            .get(format!("{}/v2/languages", self.base_url))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        Ok(resp.status().is_success())
    }

    /// Run a check and return the raw matches
    pub async fn check(&self, text: &str) -> Result<Vec<LtMatch>, GrammarError> {
        let resp = self
            .client
            .post(format!("{}/v2/check", self.base_url))
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GrammarError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GrammarError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let parsed: CheckResponse = resp
            .json()
            .await
            .map_err(|e| GrammarError::Upstream(format!("invalid check response: {}", e)))?;

        Ok(parsed.matches)
    }

    fn request_error(&self, e: reqwest::Error) -> GrammarError {
        if e.is_timeout() {
            GrammarError::Timeout(self.timeout)
        } else {
            GrammarError::Upstream(format!("request to {} failed: {}", self.base_url, e))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! A throwaway HTTP server answering every request with one canned response

    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub struct CannedServer {
        pub base_url: String,
        /// Raw requests in the order they were answered
        pub requests: Arc<Mutex<Vec<String>>>,
        /// Highest number of requests being handled at once
        pub max_in_flight: Arc<AtomicUsize>,
    }

    pub async fn spawn(status: &'static str, body: &'static str, delay: Duration) -> CannedServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let requests = Arc::new(Mutex::new(Vec::new()));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let server = CannedServer {
            base_url,
            requests: Arc::clone(&requests),
            max_in_flight: Arc::clone(&max_in_flight),
        };

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let requests = Arc::clone(&requests);
                let max_in_flight = Arc::clone(&max_in_flight);
                let in_flight = Arc::clone(&in_flight);

                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;

                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    requests.lock().push(request);
                    in_flight.fetch_sub(1, Ordering::SeqCst);

                    let response = format!(
                        concat!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n",
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}"
                        ),
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        server
    }

    /// Read the request head plus a `Content-Length` body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }

            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }
}
