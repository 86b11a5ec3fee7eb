// src/llm/provider.rs
// Language-model client abstraction

use anyhow::Result;
use async_trait::async_trait;

use super::{ChatResult, Message, Tool};

/// How the model may use the advertised tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides whether to call tools
    Auto,
    /// The model must answer in text
    None,
}

impl ToolChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }
}

/// Trait for chat clients. The orchestrator only talks to this.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<Tool>>,
        tool_choice: ToolChoice,
    ) -> Result<ChatResult>;

    /// Model identifier sent on the wire
    fn model_name(&self) -> String;
}
