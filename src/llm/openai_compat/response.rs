// src/llm/openai_compat/response.rs
// Chat completion response parsing

use crate::llm::{ChatResult, FunctionCall, ToolCall, Usage};
use anyhow::{Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".into()
}

/// Parse a chat completion body into a ChatResult. Only the first choice is used.
pub fn parse_chat_response(
    response_body: &str,
    request_id: &str,
    duration_ms: u64,
) -> Result<ChatResult> {
    let data: ChatResponse = serde_json::from_str(response_body)
        .map_err(|e| anyhow!("Failed to parse chat response: {}", e))?;

    let (content, tool_calls) = match data.choices.into_iter().next() {
        Some(choice) => {
            let calls = choice.message.tool_calls.filter(|c| !c.is_empty()).map(|calls| {
                calls
                    .into_iter()
                    .map(|tc| ToolCall {
                        id: tc.id,
                        call_type: tc.call_type,
                        function: FunctionCall {
                            name: tc.function.name,
                            arguments: tc.function.arguments,
                        },
                    })
                    .collect()
            });
            (choice.message.content, calls)
        }
        None => (None, None),
    };

    Ok(ChatResult {
        request_id: request_id.to_owned(),
        content,
        tool_calls,
        usage: data.usage,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_response() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Pong"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
        }"#;

        let result = parse_chat_response(json, "req-1", 100).unwrap();
        assert_eq!(result.request_id, "req-1");
        assert_eq!(result.content.as_deref(), Some("Pong"));
        assert!(result.tool_calls.is_none());
        assert_eq!(result.usage.unwrap().total_tokens, 11);
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_parse_tool_calls_in_order() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "log_goal", "arguments": "{\"goal\":\"Run\"}"}},
                        {"id": "call_2", "type": "function", "function": {"name": "view_goals", "arguments": "{}"}}
                    ]
                }
            }]
        }"#;

        let result = parse_chat_response(json, "req-2", 0).unwrap();
        assert!(result.content.is_none());
        let calls = result.requested_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "log_goal");
        assert_eq!(calls[0].function.arguments, r#"{"goal":"Run"}"#);
        assert_eq!(calls[1].id, "call_2");
    }

    #[test]
    fn test_empty_tool_call_list_is_text() {
        let json = r#"{"choices": [{"message": {"content": "hi", "tool_calls": []}}]}"#;
        let result = parse_chat_response(json, "r", 0).unwrap();
        assert!(result.tool_calls.is_none());
    }

    #[test]
    fn test_parse_empty_choices() {
        let result = parse_chat_response(r#"{"choices": []}"#, "r", 0).unwrap();
        assert!(result.content.is_none());
        assert!(result.tool_calls.is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_chat_response("not json", "r", 0).is_err());
    }
}
