// src/llm/openai_compat/mod.rs
// OpenAI-compatible request/response handling (OpenAI, LiteLLM proxies, Ollama)

mod request;
mod response;

pub use request::ChatRequest;
pub use response::parse_chat_response;
