use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::sse_decoder::{SseDecoder, SseEvent};
use crate::application::{CompletionClient, FragmentStream};
use crate::domain::{ChatMessage, DomainError};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-coder";
const COMPLETIONS_PATH: &str = "/chat/completions";

pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const BASE_URL_VAR: &str = "DEEPSEEK_BASE_URL";
pub const MODEL_VAR: &str = "DEEPSEEK_MODEL";

/// Connection settings for an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl RelayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Read configuration from the environment:
    ///
    /// | Variable            | Default                       |
    /// |---------------------|-------------------------------|
    /// | `DEEPSEEK_API_KEY`  | required                      |
    /// | `DEEPSEEK_BASE_URL` | `https://api.deepseek.com/v1` |
    /// | `DEEPSEEK_MODEL`    | `deepseek-coder`              |
    pub fn from_env() -> Result<Self, DomainError> {
        let key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DomainError::environment_missing(format!(
                    "Error: {} is not set. Export your API key before running.",
                    API_KEY_VAR
                ))
            })?;

        let mut config = Self::new(key);
        if let Ok(base) = std::env::var(BASE_URL_VAR) {
            config.base_url = base;
        }
        if let Ok(model) = std::env::var(MODEL_VAR) {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Streaming client for `POST {base}/chat/completions` (OpenAI, DeepSeek and
/// compatible servers).
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    config: RelayConfig,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: RelayConfig) -> Self {
        let url = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            COMPLETIONS_PATH
        );
        Self {
            // No overall timeout: a long answer keeps the body open.
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            config,
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, DomainError> {
        let request = ApiRequest {
            model: &self.config.model,
            messages,
            stream: true,
        };

        debug!("POST {} (model {})", self.url, self.config.model);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("request to {} failed: {e}", self.url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {status}: {body}");
            return Err(DomainError::transport(format!(
                "API returned {status}: {body}"
            )));
        }

        let bytes = response.bytes_stream().map(|chunk| {
            chunk
                .map(|b| b.to_vec())
                .map_err(|e| DomainError::transport(format!("stream interrupted: {e}")))
        });
        Ok(fragment_stream(bytes))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, DomainError>> + Send>>;

struct Decoding {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, DomainError>>,
    finished: bool,
}

impl Decoding {
    fn absorb(&mut self, events: Result<Vec<SseEvent>, DomainError>) {
        let events = match events {
            Ok(events) => events,
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finished = true;
                return;
            }
        };
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Done => self.finished = true,
                SseEvent::Data(payload) => match parse_fragment(&payload) {
                    Ok(Some(text)) => self.pending.push_back(Ok(text)),
                    Ok(None) => {}
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        self.finished = true;
                    }
                },
            }
        }
    }
}

/// Turn a raw SSE body into text fragments.
///
/// The body is read only as far as needed: after `[DONE]` or the first error
/// nothing more is pulled from the network.
pub fn fragment_stream<S>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<Vec<u8>, DomainError>> + Send + 'static,
{
    let state = Decoding {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(&chunk);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e));
                    state.finished = true;
                }
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    state.finished = true;
                }
            }
        }
    }))
}

/// Extract `choices[0].delta.content` from one chunk; empty deltas are `None`.
fn parse_fragment(payload: &str) -> Result<Option<String>, DomainError> {
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| DomainError::protocol(format!("malformed stream chunk: {e}: {payload}")))?;

    if let Some(error) = chunk.error {
        return Err(DomainError::protocol(format!("API error: {}", error.message)));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}
