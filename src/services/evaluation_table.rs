use crate::schemas::evaluation::{EvaluationRow, EvaluationSummary};
use crate::schemas::rubric::Rubric;

pub(crate) const EVALUATION_HEADER: &str = "Question|Score|Max Marks|Comments";

const MIN_FIELDS: usize = 4;

/// Pulls the score table out of an evaluation reply.
///
/// The reply is free text from a language model, so parsing is best effort:
/// everything before [`EVALUATION_HEADER`] is ignored, following lines without
/// a `|` are skipped, and rows with fewer than four fields are dropped.
/// Scores that are not numbers become `None`. A reply without the header
/// yields an empty summary.
pub(crate) fn parse_evaluation_table(reply: &str, rubric: &Rubric) -> EvaluationSummary {
    let mut lines = reply.lines();

    if !lines.by_ref().any(is_header_line) {
        tracing::warn!("Could not find the evaluation table in the response");
        return EvaluationSummary::default();
    }

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() || !line.contains('|') {
            continue;
        }

        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            tracing::debug!(line, "Skipping short evaluation row");
            continue;
        }
        if fields.iter().all(|field| is_separator_field(field)) {
            continue;
        }

        let question_id = fields[0].to_string();
        let question = rubric.get(&question_id).map(|q| q.prompt.clone()).unwrap_or_default();

        rows.push(EvaluationRow {
            question_id,
            question,
            marks_obtained: parse_score(fields[1]),
            max_marks: parse_score(fields[2]),
            comments: fields[3..].join("|"),
        });
    }

    if rows.is_empty() {
        tracing::warn!("Evaluation table header found but no rows could be parsed");
    }

    EvaluationSummary { rows }
}

fn is_header_line(line: &str) -> bool {
    split_fields(line).join("|").starts_with(EVALUATION_HEADER)
}

/// Splits on `|`, trimming each field and dropping the empty edges produced
/// by markdown-style `| a | b |` rows.
fn split_fields(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(str::trim).collect()
}

fn is_separator_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| matches!(c, '-' | ':' | ' '))
}

fn parse_score(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> Rubric {
        Rubric::builtin()
    }

    #[test]
    fn parses_rows_after_header() {
        let reply = "Here is my evaluation.\n\
                     Question|Score|Max Marks|Comments\n\
                     1|1|1|Correct answer\n\
                     6|3.5|5|Good explanation but missing one point\n\
                     \n\
                     Overall the student did well.";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows.len(), 2);
        let first = &summary.rows[0];
        assert_eq!(first.question_id, "1");
        assert_eq!(first.question, "What are the two most common supervised tasks?");
        assert_eq!(first.marks_obtained, Some(1.0));
        assert_eq!(first.max_marks, Some(1.0));
        assert_eq!(first.comments, "Correct answer");
        assert_eq!(summary.rows[1].marks_obtained, Some(3.5));
        assert_eq!(summary.total_obtained(), 4.5);
    }

    #[test]
    fn missing_header_yields_empty_summary() {
        let reply = "1|1|1|Correct\n2|0|1|Wrong";
        let summary = parse_evaluation_table(reply, &rubric());
        assert!(summary.is_empty());
        assert!(parse_evaluation_table("", &rubric()).is_empty());
    }

    #[test]
    fn non_numeric_scores_become_missing() {
        let reply = "Question|Score|Max Marks|Comments\n\
                     2|N/A|1|Not attempted\n\
                     3|nan|one|Unclear";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].marks_obtained, None);
        assert_eq!(summary.rows[0].max_marks, Some(1.0));
        assert_eq!(summary.rows[1].marks_obtained, None);
        assert_eq!(summary.rows[1].max_marks, None);
    }

    #[test]
    fn unknown_question_keeps_row_with_empty_prompt() {
        let reply = "Question|Score|Max Marks|Comments\n12|2|5|Bonus question";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].question_id, "12");
        assert_eq!(summary.rows[0].question, "");
        assert_eq!(summary.rows[0].marks_obtained, Some(2.0));
    }

    #[test]
    fn short_rows_and_plain_lines_are_skipped() {
        let reply = "Question|Score|Max Marks|Comments\n\
                     1|1|1\n\
                     no delimiter here\n\
                     4|1|1|Correct";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].question_id, "4");
    }

    #[test]
    fn markdown_tables_are_accepted() {
        let reply = "```\n\
                     | Question | Score | Max Marks | Comments |\n\
                     |----------|-------|-----------|----------|\n\
                     | 5 | 1 | 1 | Precision matters more |\n\
                     ```";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].question_id, "5");
        assert_eq!(summary.rows[0].comments, "Precision matters more");
    }

    #[test]
    fn comment_keeps_embedded_delimiters() {
        let reply = "Question|Score|Max Marks|Comments\n7|4|5|Bias | variance both covered";

        let summary = parse_evaluation_table(reply, &rubric());

        assert_eq!(summary.rows[0].comments, "Bias|variance both covered");
    }
}
