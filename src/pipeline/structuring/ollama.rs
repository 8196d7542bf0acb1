use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::ChatClient;
use super::StructuringError;

/// Ollama HTTP client for local model inference.
pub struct OllamaChatClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaChatClient {
    /// Client for the Ollama instance at `base_url`.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, StructuringError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &crate::config::EngineConfig) -> Result<Self, StructuringError> {
        Self::new(
            &config.ollama_url,
            &config.structuring_model,
            config.structuring_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl ChatClient for OllamaChatClient {
    fn chat(&self, prompt: &str, system: &str) -> Result<String, StructuringError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    StructuringError::OllamaConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    StructuringError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    StructuringError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn provider(&self) -> &str {
        "ollama"
    }
}

/// Mock chat client for testing. Replays scripted replies in order, then
/// keeps repeating the last one. `None` simulates a provider outage.
pub struct MockChatClient {
    replies: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockChatClient {
    pub fn new(response: &str) -> Self {
        Self::sequence(vec![Some(response)])
    }

    /// A provider that is never reachable.
    pub fn unavailable() -> Self {
        Self::sequence(vec![None])
    }

    pub fn sequence(replies: Vec<Option<&str>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatClient for MockChatClient {
    fn chat(&self, _prompt: &str, _system: &str) -> Result<String, StructuringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| StructuringError::HttpClient("mock lock poisoned".into()))?;
        let mut last = self
            .last
            .lock()
            .map_err(|_| StructuringError::HttpClient("mock lock poisoned".into()))?;
        if let Some(next) = replies.pop_front() {
            *last = next;
        }
        last.clone()
            .ok_or_else(|| StructuringError::OllamaConnection("mock://offline".into()))
    }

    fn provider(&self) -> &str {
        "mock_chat"
    }
}
