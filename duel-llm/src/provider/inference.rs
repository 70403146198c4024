//! Hugging Face inference provider
//!
//! Talks to the OpenAI-compatible `/chat/completions` route of the Hugging
//! Face router. Any server speaking the same format (Ollama, vLLM,
//! llama.cpp) works through `ProviderConfig::local`.

use super::*;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct InferenceProvider {
    client: Client,
    config: ProviderConfig,
    usage: Arc<Mutex<UsageTracker>>,
}

impl InferenceProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs.unwrap_or(120)))
            .build()
            .map_err(|e| {
                Error::unexpected("failed to create HTTP client")
                    .with_operation("inference::new")
                    .set_source(e)
            })?;

        Ok(Self {
            client,
            config,
            usage: Arc::new(Mutex::new(UsageTracker::new())),
        })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(HUGGING_FACE_ROUTER_URL)
            .trim_end_matches('/')
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url())
    }

    /// Wire request, with config defaults filling what the request leaves open
    fn build_request(&self, request: &CompletionRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_string()),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature.or(self.config.temperature),
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            stream: Some(stream),
            stop: request.stop.clone(),
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response> {
        let mut req = self.client.post(self.endpoint()).json(body);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.bearer_auth(api_key);
            }
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        debug!(model = %body.model, stream = ?body.stream, url = %self.endpoint(), "sending chat request");

        let response = req.send().await.map_err(|e| {
            let kind = if e.is_timeout() || e.is_connect() || e.is_request() {
                ErrorKind::NetworkFailed
            } else {
                ErrorKind::Unexpected
            };
            Error::new(kind, "request to inference endpoint failed")
                .with_operation("inference::send")
                .with_context("model", body.model.clone())
                .set_source(e)
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text).with_context("model", body.model.clone()));
        }

        Ok(response)
    }

    fn track(&self, model: &str, usage: &Usage) {
        record_usage(&self.usage, model, usage.clone());
    }
}

fn record_usage(tracker: &Mutex<UsageTracker>, model: &str, usage: Usage) {
    tracker
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .track(model, &usage);
}

impl LlmProvider for InferenceProvider {
    fn name(&self) -> &str {
        match self.config.provider_type {
            ProviderType::HuggingFace => "huggingface",
            ProviderType::Local => "local",
        }
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn prefers_streaming(&self) -> bool {
        self.config.stream
    }

    fn usage(&self) -> Option<UsageTracker> {
        Some(self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request, false);
        let response = self.send(&body).await?;

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            Error::invalid_response("could not decode completion body")
                .with_operation("inference::complete")
                .with_context("model", body.model.clone())
                .set_source(e)
        })?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            Error::inference_failed("no choices in response")
                .with_operation("inference::complete")
                .with_context("model", body.model.clone())
        })?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();
        self.track(&body.model, &usage);

        Ok(CompletionResponse {
            id: api_response.id.unwrap_or_default(),
            model: api_response.model.unwrap_or(body.model),
            content: choice.message.content,
            finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
            usage,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver> {
        let body = self.build_request(&request, true);
        let response = self.send(&body).await?;
        let usage = Arc::clone(&self.usage);
        let model = body.model;

        let stream = async_stream::stream! {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut seen_usage = None;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield StreamChunk::Error(e.to_string());
                        return;
                    }
                };

                for data in decoder.push(&bytes) {
                    for chunk in chunks_from_data(&data) {
                        if let StreamChunk::Done { usage: Some(u), .. } = &chunk {
                            seen_usage = Some(u.clone());
                        }
                        let done = matches!(chunk, StreamChunk::Done { .. });
                        yield chunk;
                        if done {
                            record_usage(&usage, &model, seen_usage.take().unwrap_or_default());
                            return;
                        }
                    }
                }
            }

            // Server closed the stream without a finish marker
            record_usage(&usage, &model, seen_usage.unwrap_or_default());
        };

        Ok(StreamReceiver::new(stream))
    }
}

/// Map a non-success HTTP status to an error kind
fn error_for_status(status: u16, body: &str) -> Error {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    let kind = match status {
        401 | 403 => ErrorKind::AuthenticationFailed,
        404 => ErrorKind::ModelNotFound,
        429 => ErrorKind::RateLimited,
        _ => ErrorKind::InferenceFailed,
    };
    let err = Error::new(kind, message)
        .with_operation("inference::send")
        .with_context("status", status.to_string());
    if (400..500).contains(&status) && status != 429 {
        err.permanent()
    } else {
        err
    }
}

/// Pull `error` / `error.message` out of a JSON error body
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .as_str()
        .or_else(|| error.get("message").and_then(|m| m.as_str()))
        .map(str::to_string)
}

// ============================================================================
// Server-sent events
// ============================================================================

/// Splits a byte stream into SSE `data:` payloads.
///
/// Bytes are buffered until an event is complete, so a UTF-8 character
/// split across network chunks decodes intact.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed more bytes, return the data payloads of every complete event
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some((end, separator)) = event_end(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + separator).collect();
            let event = String::from_utf8_lossy(&event[..end]);
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }
}

/// Offset and length of the first blank-line separator
fn event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|i| (i, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Turn one SSE payload into stream chunks. Unparsable payloads are skipped.
fn chunks_from_data(data: &str) -> Vec<StreamChunk> {
    if data.trim() == "[DONE]" {
        return vec![StreamChunk::Done {
            finish_reason: FinishReason::Stop,
            usage: None,
        }];
    }

    let chunk = match serde_json::from_str::<ChatStreamChunk>(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "skipping unparsable stream payload");
            return Vec::new();
        }
    };

    let usage = chunk.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    let mut out = Vec::new();
    if let Some(choice) = chunk.choices.first() {
        if let Some(content) = choice.delta.content.as_ref().filter(|c| !c.is_empty()) {
            out.push(StreamChunk::Text(content.clone()));
        }
        if let Some(reason) = &choice.finish_reason {
            out.push(StreamChunk::Done {
                finish_reason: FinishReason::from_wire(Some(reason)),
                usage,
            });
        }
    }
    out
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamDelta {
    content: Option<String>,
}
