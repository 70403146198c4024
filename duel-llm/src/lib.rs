//! # duel-llm
//!
//! The text generation service behind every agent in a duel.
//!
//! ## Core Concepts
//! - **Provider**: trait-based access to a chat-completions backend
//! - **Generate**: prompt in, full completion text out; streamed tokens
//!   are concatenated before returning
//! - **Inference**: the Hugging Face router client (any OpenAI-compatible
//!   server works)
//! - **Scripted**: an in-memory provider that replays canned replies

pub mod provider;

pub use duel_error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, InferenceProvider,
    LlmProvider, ProviderConfig, ProviderType, Role, ScriptedProvider, ScriptedReply,
    StreamChunk, StreamReceiver, Usage, UsageTracker,
};
