//! Scripted provider - replays canned replies without a network
//!
//! Replies are handed out in call order, or computed from the prompt by a
//! responder function. Every prompt received is recorded so callers can
//! assert on what the agents were asked.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(ErrorKind),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

type Responder = Box<dyn Fn(&str, usize) -> Result<String> + Send + Sync>;

pub struct ScriptedProvider {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
    streaming: bool,
    usage: Mutex<UsageTracker>,
}

impl ScriptedProvider {
    /// Replay `replies` in order; calls past the end fail with `InferenceFailed`
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let queue = Mutex::new(replies.into_iter().collect::<VecDeque<_>>());
        Self::from_fn(move |_, call| {
            let next = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
            match next {
                Some(ScriptedReply::Text(text)) => Ok(text),
                Some(ScriptedReply::Fail(kind)) => Err(Error::new(kind, "scripted failure")
                    .with_context("call", call.to_string())),
                None => Err(Error::inference_failed("script exhausted")
                    .with_context("call", call.to_string())),
            }
        })
    }

    /// Compute each reply from the prompt and the zero-based call index
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str, usize) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
            streaming: false,
            usage: Mutex::new(UsageTracker::new()),
        }
    }

    /// Route `generate` through `stream`, splitting replies at spaces
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    /// Every prompt received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn respond(&self, request: &CompletionRequest) -> Result<String> {
        let prompt = request.last_user_content().unwrap_or_default().to_string();
        let call = {
            let mut prompts = self.prompts.lock().unwrap_or_else(|e| e.into_inner());
            prompts.push(prompt.clone());
            prompts.len() - 1
        };
        let reply = (self.responder)(&prompt, call).map_err(|e| e.with_operation("scripted::respond"))?;

        let usage = Usage {
            prompt_tokens: approx_tokens(&prompt),
            completion_tokens: approx_tokens(&reply),
            total_tokens: approx_tokens(&prompt) + approx_tokens(&reply),
        };
        self.usage
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .track(self.default_model(), &usage);
        Ok(reply)
    }
}

/// Rough token count: four characters per token
fn approx_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    fn prefers_streaming(&self) -> bool {
        self.streaming
    }

    fn usage(&self) -> Option<UsageTracker> {
        Some(self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let content = self.respond(&request)?;
        let usage = Usage {
            prompt_tokens: 0,
            completion_tokens: approx_tokens(&content),
            total_tokens: approx_tokens(&content),
        };
        Ok(CompletionResponse {
            id: "scripted".into(),
            model: self.default_model().into(),
            content: Some(content),
            finish_reason: FinishReason::Stop,
            usage,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver> {
        let content = self.respond(&request)?;
        let mut chunks: Vec<StreamChunk> = content
            .split_inclusive(' ')
            .map(|piece| StreamChunk::Text(piece.to_string()))
            .collect();
        chunks.push(StreamChunk::Done {
            finish_reason: FinishReason::Stop,
            usage: None,
        });
        Ok(StreamReceiver::new(futures_util::stream::iter(chunks)))
    }
}
