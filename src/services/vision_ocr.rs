use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use crate::core::config::Settings;
use crate::services::chat_completions::{ChatCompletionClient, ChatEndpoint, ChatRequest};

/// What the vision model is asked to read from an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OcrTask {
    AnswerScript,
    SignInSheet,
}

impl OcrTask {
    fn system_prompt(self) -> &'static str {
        match self {
            Self::AnswerScript => {
                "You are an OCR system that extracts handwritten answers and detects figures from images."
            }
            Self::SignInSheet => "You are an OCR system that extracts handwritten names from images.",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::AnswerScript => {
                "Extract all handwritten answers and mention if any figures or diagrams are present."
            }
            Self::SignInSheet => {
                "Extract only the handwritten names from this attendance sheet. Do not include introductory text or numbers."
            }
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::AnswerScript => "answer_script",
            Self::SignInSheet => "sign_in_sheet",
        }
    }
}

#[async_trait]
pub(crate) trait VisionOcr: Send + Sync {
    /// Returns the text the model reads from the image at `image`.
    async fn transcribe(&self, image: &Path, task: OcrTask) -> Result<String>;
}

#[derive(Debug, Clone)]
pub(crate) struct OpenAiVisionOcr {
    client: ChatCompletionClient,
    answers_max_tokens: u32,
    names_max_tokens: u32,
}

impl OpenAiVisionOcr {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let vision = settings.vision();
        let client = ChatCompletionClient::new(ChatEndpoint {
            api_key: vision.api_key.clone(),
            base_url: vision.base_url.clone(),
            model: vision.model.clone(),
            request_timeout: Duration::from_secs(settings.ai().request_timeout_seconds),
            max_retries: settings.ai().max_retries,
        })
        .context("Failed to configure vision OCR client")?;

        Ok(Self {
            client,
            answers_max_tokens: vision.answers_max_tokens,
            names_max_tokens: vision.names_max_tokens,
        })
    }

    fn max_tokens(&self, task: OcrTask) -> u32 {
        match task {
            OcrTask::AnswerScript => self.answers_max_tokens,
            OcrTask::SignInSheet => self.names_max_tokens,
        }
    }
}

#[async_trait]
impl VisionOcr for OpenAiVisionOcr {
    async fn transcribe(&self, image: &Path, task: OcrTask) -> Result<String> {
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("Failed to read image {}", image.display()))?;
        let data_url = format!("data:{};base64,{}", image_mime_type(image), STANDARD.encode(bytes));

        let request = ChatRequest {
            messages: vec![
                json!({"role": "system", "content": task.system_prompt()}),
                json!({
                    "role": "user",
                    "content": [
                        {"type": "text", "text": task.instruction()},
                        {"type": "image_url", "image_url": {"url": data_url}}
                    ]
                }),
            ],
            max_tokens: self.max_tokens(task),
            temperature: None,
        };

        let timer = Instant::now();
        let result = self.client.complete(request).await;
        metrics::histogram!("ocr_duration_seconds").record(timer.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                metrics::counter!("ocr_requests_total", "status" => "success").increment(1);
            }
            Err(_) => {
                metrics::counter!("ocr_requests_total", "status" => "failed").increment(1);
            }
        }

        result.with_context(|| format!("Vision OCR failed for {}", image.display()))
    }
}

fn image_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
