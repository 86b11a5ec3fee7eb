// src/llm/http_client.rs
// HTTP transport for chat requests, with bounded retry on transient failures

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Retries after the first attempt
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Backoff before the first retry; doubles each time
const DEFAULT_BASE_BACKOFF_SECS: u64 = 1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

pub struct LlmHttpClient {
    client: Client,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl LlmHttpClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_secs(DEFAULT_BASE_BACKOFF_SECS),
        }
    }

    /// POST a JSON body, with Bearer auth when a key is given.
    /// Returns the response body as text on success.
    pub async fn post_json(
        &self,
        request_id: &str,
        url: &str,
        api_key: Option<&str>,
        body: String,
    ) -> Result<String> {
        let mut attempts = 0;
        let mut backoff = self.base_backoff;

        loop {
            let mut request = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .body(body.clone());
            if let Some(key) = api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }

                    let error_body = response.text().await.unwrap_or_default();
                    if attempts < self.max_retries
                        && (status.as_u16() == 429 || status.is_server_error())
                    {
                        warn!(
                            request_id = %request_id,
                            status = %status,
                            error = %error_body,
                            "Transient error, retrying in {:?}...",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        backoff *= 2;
                        continue;
                    }

                    return Err(anyhow!("API error {}: {}", status, error_body));
                }
                Err(e) => {
                    // Other errors may mean the request was processed
                    if attempts < self.max_retries && (e.is_connect() || e.is_timeout()) {
                        warn!(
                            request_id = %request_id,
                            error = %e,
                            "Request failed (connect/timeout), retrying in {:?}...",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        backoff *= 2;
                        continue;
                    }
                    return Err(anyhow!("Request failed after {} retries: {}", attempts, e));
                }
            }
        }
    }
}

impl Default for LlmHttpClient {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = LlmHttpClient::default();
        assert_eq!(client.max_retries, 3);
        assert_eq!(client.base_backoff, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connection_refused_gives_up() {
        let mut client = LlmHttpClient::new(Duration::from_millis(500), Duration::from_millis(200));
        client.max_retries = 1;
        client.base_backoff = Duration::from_millis(10);

        let err = client
            .post_json("test", "http://127.0.0.1:1/chat/completions", Some("key"), "{}".into())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Request failed after 1 retries"), "got: {err}");
    }
}
