use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

const MAX_BACKOFF_SECS: u64 = 60;

/// Connection details for one OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub(crate) struct ChatEndpoint {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) request_timeout: Duration,
    pub(crate) max_retries: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ChatRequest {
    pub(crate) messages: Vec<Value>,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChatCompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl ChatCompletionClient {
    pub(crate) fn new(endpoint: ChatEndpoint) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(endpoint.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: endpoint.api_key,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            model: endpoint.model,
            max_retries: endpoint.max_retries,
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    /// Sends one completion request and returns the trimmed reply text.
    pub(crate) async fn complete(&self, request: ChatRequest) -> Result<String> {
        let payload = build_payload(&self.model, &request);
        let url = format!("{}/chat/completions", self.base_url);
        let timer = Instant::now();

        let mut attempt = 0;
        let body = loop {
            match self.send_once(&url, &payload).await {
                Ok(body) => break body,
                Err(err) if attempt < self.max_retries => {
                    tracing::warn!(
                        model = %self.model,
                        attempt,
                        error = %format!("{err:#}"),
                        "Chat completion failed; retrying"
                    );
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let content = extract_message_content(&body).context("Missing chat completion content")?;
        let tokens_used = body.pointer("/usage/total_tokens").and_then(Value::as_u64);

        tracing::debug!(
            model = %self.model,
            duration_seconds = timer.elapsed().as_secs_f64(),
            tokens_used,
            "Chat completion finished"
        );

        Ok(content)
    }

    async fn send_once(&self, url: &str, payload: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .context("Failed to call chat completion API")?;

        let status = response.status();
        let text = response.text().await.context("Failed to read chat completion response")?;
        if !status.is_success() {
            anyhow::bail!("Chat completion API error (status {status}): {}", text.trim());
        }

        serde_json::from_str(&text)
            .with_context(|| format!("Chat completion response is not JSON: {}", text.trim()))
    }
}

/// `2^attempt` seconds, capped.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2_u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

fn build_payload(model: &str, request: &ChatRequest) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": request.messages,
        "max_tokens": request.max_tokens,
    });

    if let Some(temperature) = request.temperature {
        payload["temperature"] = json!(temperature);
    }

    payload
}

pub(crate) fn extract_message_content(body: &Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
}
