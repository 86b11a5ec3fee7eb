// src/llm/openai_compat/request.rs
// Chat completion request builder

use crate::llm::{Message, Tool, ToolChoice};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>, // "auto" | "none"
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Advertise tools. `tool_choice` is only sent alongside tools.
    pub fn with_tools(mut self, tools: Option<Vec<Tool>>, choice: ToolChoice) -> Self {
        self.tool_choice = tools.as_ref().map(|_| choice.as_str().to_string());
        self.tools = tools;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_tools_omits_choice() {
        let req = ChatRequest::new("gpt-4", vec![Message::user("hi")]).with_tools(None, ToolChoice::Auto);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn test_request_with_tools_sets_choice() {
        let tools = vec![Tool::function("view_goals", "List goals", json!({"type": "object"}))];
        let req = ChatRequest::new("gpt-4", vec![]).with_tools(Some(tools), ToolChoice::None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tool_choice"], "none");
        assert_eq!(json["tools"][0]["function"]["name"], "view_goals");
    }
}
