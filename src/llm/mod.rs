// src/llm/mod.rs
// Language-model integration (OpenAI-compatible chat completions with tool calling)

mod client;
pub mod http_client;
mod logging;
pub mod openai_compat;
mod provider;
mod types;

pub use client::OpenAiCompatClient;
pub use provider::{LlmClient, ToolChoice};
pub use types::{ChatResult, FunctionCall, FunctionDef, Message, Tool, ToolCall, Usage};
