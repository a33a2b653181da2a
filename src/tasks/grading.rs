use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::schemas::evaluation::{EvaluationSummary, ExtractedAnswers};
use crate::schemas::rubric::Rubric;
use crate::services::answer_evaluation::AnswerEvaluator;
use crate::services::evaluation_table::parse_evaluation_table;
use crate::services::pdf_pages::PageRasterizer;
use crate::services::summary_export::write_summary_csv;
use crate::services::vision_ocr::{OcrTask, VisionOcr};

#[derive(Debug, Clone)]
pub(crate) struct GradingOutcome {
    pub(crate) answers: ExtractedAnswers,
    pub(crate) raw_evaluation: String,
    pub(crate) summary: EvaluationSummary,
}

pub(crate) struct GradingPipeline<'a> {
    pub(crate) rasterizer: &'a dyn PageRasterizer,
    pub(crate) ocr: &'a dyn VisionOcr,
    pub(crate) evaluator: &'a dyn AnswerEvaluator,
    pub(crate) rubric: &'a Rubric,
    /// Paid once before the first network call of a run.
    pub(crate) request_delay: Duration,
}

impl GradingPipeline<'_> {
    /// Grades one scanned answer script and writes the summary to `output`.
    ///
    /// Only rasterization and the final write can fail the run. OCR and
    /// evaluation errors are logged and degrade to empty text.
    pub(crate) async fn run(&self, pdf: &Path, output: &Path) -> Result<GradingOutcome> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        tracing::info!(pdf = %pdf.display(), "Extracting student answers");
        let answers = self.extract_answers(pdf).await?;
        tracing::debug!(?answers, "Extracted answers");

        if answers.is_blank() {
            tracing::warn!(pdf = %pdf.display(), "No answer text was extracted from any page");
        }

        tracing::info!(questions = self.rubric.questions().len(), "Evaluating answers");
        let raw_evaluation = match self.evaluator.evaluate(self.rubric, &answers).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "Error during evaluation");
                String::new()
            }
        };
        tracing::debug!(reply = %raw_evaluation, "Evaluation result");

        let summary = parse_evaluation_table(&raw_evaluation, self.rubric);
        write_summary_csv(&summary, output)?;

        Ok(GradingOutcome { answers, raw_evaluation, summary })
    }

    async fn extract_answers(&self, pdf: &Path) -> Result<ExtractedAnswers> {
        let rendered = self
            .rasterizer
            .render(pdf)
            .await
            .with_context(|| format!("Failed to convert {} to page images", pdf.display()))?;

        let mut answers = ExtractedAnswers::default();
        for (page_id, image) in rendered.labelled() {
            let text = match self.ocr.transcribe(image, OcrTask::AnswerScript).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(
                        page = %page_id,
                        task = OcrTask::AnswerScript.as_str(),
                        error = %format!("{err:#}"),
                        "Error during OCR extraction"
                    );
                    String::new()
                }
            };
            answers.push(page_id, text);
        }

        tracing::info!(pages = rendered.pages().len(), "Finished page extraction");
        Ok(answers)
    }
}
