use std::fmt::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::core::config::Settings;
use crate::schemas::evaluation::ExtractedAnswers;
use crate::schemas::rubric::Rubric;
use crate::services::chat_completions::{ChatCompletionClient, ChatEndpoint, ChatRequest};
use crate::services::evaluation_table::EVALUATION_HEADER;

const EVALUATION_SYSTEM_PROMPT: &str = "You are an expert examiner who evaluates student answers based on predefined criteria. Always format your response as a table with pipe-delimited columns.";

#[async_trait]
pub(crate) trait AnswerEvaluator: Send + Sync {
    /// Returns the model's free-form evaluation, expected to contain the
    /// pipe-delimited score table.
    async fn evaluate(&self, rubric: &Rubric, answers: &ExtractedAnswers) -> Result<String>;
}

#[derive(Debug, Clone)]
pub(crate) struct ChatAnswerEvaluator {
    client: ChatCompletionClient,
    max_tokens: u32,
    temperature: f64,
}

impl ChatAnswerEvaluator {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let evaluation = settings.evaluation();
        let client = ChatCompletionClient::new(ChatEndpoint {
            api_key: evaluation.api_key.clone(),
            base_url: evaluation.base_url.clone(),
            model: evaluation.model.clone(),
            request_timeout: Duration::from_secs(settings.ai().request_timeout_seconds),
            max_retries: settings.ai().max_retries,
        })
        .context("Failed to configure evaluation client")?;

        Ok(Self { client, max_tokens: evaluation.max_tokens, temperature: evaluation.temperature })
    }
}

#[async_trait]
impl AnswerEvaluator for ChatAnswerEvaluator {
    async fn evaluate(&self, rubric: &Rubric, answers: &ExtractedAnswers) -> Result<String> {
        let request = ChatRequest {
            messages: vec![
                json!({"role": "system", "content": EVALUATION_SYSTEM_PROMPT}),
                json!({"role": "user", "content": build_evaluation_prompt(rubric, answers)}),
            ],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        tracing::info!(
            model = %self.client.model(),
            pages = answers.pages().len(),
            "Sending evaluation request"
        );

        let result = self.client.complete(request).await;
        let status = if result.is_ok() { "success" } else { "failed" };
        metrics::counter!("evaluation_requests_total", "status" => status).increment(1);

        result.context("Answer evaluation failed")
    }
}

pub(crate) fn build_evaluation_prompt(rubric: &Rubric, answers: &ExtractedAnswers) -> String {
    let mut prompt = String::from(
        "Evaluate the following student answers based on clarity, completeness, and accuracy.\n\
         Give a score out of the total marks assigned to each question.\n\nQuestions and Marks:\n",
    );

    for question in rubric.questions() {
        let _ = writeln!(
            prompt,
            "{}. {} (max marks: {})",
            question.id, question.prompt, question.max_marks
        );
    }

    prompt.push_str("\nStudent Answers:\n");
    for page in answers.pages() {
        let _ = writeln!(prompt, "{}:\n{}\n", page.page_id, page.text);
    }

    let _ = write!(
        prompt,
        "Please provide your evaluation in the following format:\n\
         {EVALUATION_HEADER}\n\
         1|4|5|Good explanation but missing one point\n\
         2|1|1|Correct answer\n\
         ...\n\n\
         For each question:\n\
         1. Provide a score out of the maximum marks\n\
         2. Include brief comments justifying the score\n\
         3. Use the pipe (|) character as a delimiter\n\
         4. Start the table with the header row exactly as shown above\n\
         5. Include all questions in the table\n"
    );

    prompt
}
