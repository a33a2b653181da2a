use std::path::Path;

use anyhow::{Context, Result};

use crate::schemas::evaluation::EvaluationSummary;
use crate::services::atomic_file::write_atomically;

pub(crate) const SUMMARY_COLUMNS: [&str; 5] =
    ["Question No.", "Question", "Max Marks", "Marks Obtained", "Comments"];

pub(crate) fn write_summary_csv(summary: &EvaluationSummary, path: &Path) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(SUMMARY_COLUMNS)?;
        for row in &summary.rows {
            let max_marks = format_score(row.max_marks);
            let marks_obtained = format_score(row.marks_obtained);
            writer.write_record([
                row.question_id.as_str(),
                row.question.as_str(),
                max_marks.as_str(),
                marks_obtained.as_str(),
                row.comments.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    })
    .with_context(|| format!("Failed to write evaluation summary to {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = summary.rows.len(), "Evaluation summary saved");
    Ok(())
}

/// Whole numbers print without a fraction, missing values as an empty cell.
pub(crate) fn format_score(value: Option<f64>) -> String {
    match value {
        Some(score) if score.fract() == 0.0 => format!("{score:.0}"),
        Some(score) => score.to_string(),
        None => String::new(),
    }
}
