// src/llm/client.rs
// Chat client for any OpenAI-compatible /chat/completions endpoint

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{Span, debug, info, instrument};
use uuid::Uuid;

use super::http_client::LlmHttpClient;
use super::logging;
use super::openai_compat::{ChatRequest, parse_chat_response};
use super::{ChatResult, LlmClient, Message, Tool, ToolChoice};

const CONNECTION_TEST_PROMPT: &str = "Please respond with the string 'Pong'";
const CONNECTION_TEST_REPLY: &str = "Pong";

pub struct OpenAiCompatClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    http: LlmHttpClient,
}

impl OpenAiCompatClient {
    /// `model` is the name the endpoint expects (no provider prefix).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.into(),
            model: model.into(),
            http: LlmHttpClient::default(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Ask the model to answer "Pong" and fail unless it does.
    pub async fn connection_test(&self) -> Result<()> {
        info!(model = %self.model, base_url = %self.base_url, "Testing model connection");
        let result = self
            .chat(vec![Message::user(CONNECTION_TEST_PROMPT)], None, ToolChoice::None)
            .await?;

        let reply = result.content.unwrap_or_default();
        if !reply.contains(CONNECTION_TEST_REPLY) {
            bail!("Unexpected connection test reply from {}: {:?}", self.model, reply);
        }
        info!(model = %self.model, "Model connection OK");
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    #[instrument(skip(self, messages, tools), fields(request_id, model = %self.model, message_count = messages.len()))]
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<Tool>>,
        tool_choice: ToolChoice,
    ) -> Result<ChatResult> {
        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", &request_id);

        info!(
            request_id = %request_id,
            message_count = messages.len(),
            tool_count = tools.as_ref().map(|t| t.len()).unwrap_or(0),
            tool_choice = tool_choice.as_str(),
            "Starting chat request"
        );

        let request = ChatRequest::new(&self.model, messages).with_tools(tools, tool_choice);
        let body = serde_json::to_string(&request)?;
        debug!(request_id = %request_id, "Chat request: {}", body);

        let response_body = self
            .http
            .post_json(&request_id, &self.completions_url(), self.api_key.as_deref(), body)
            .await?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let result = parse_chat_response(&response_body, &request_id, duration_ms)?;

        if let Some(ref usage) = result.usage {
            logging::log_usage(&request_id, &self.model, usage);
        }
        if let Some(ref calls) = result.tool_calls {
            logging::log_tool_calls(&request_id, calls);
        }
        logging::log_completion(
            &request_id,
            duration_ms,
            result.content.as_ref().map(|c| c.len()).unwrap_or(0),
            result.requested_calls().len(),
        );

        Ok(result)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
