use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::schemas::evaluation::EvaluationSummary;
use crate::schemas::roster::Roster;
use crate::services::name_matching::{NameResolver, PendingName, Resolution};
use crate::services::summary_export::format_score;

pub(crate) const PDF_PROMPT: &str = "Enter the path to the answer script PDF: ";
pub(crate) const IMAGE_PROMPT: &str = "Enter the path of the scanned attendance sheet: ";

#[derive(Debug, Parser)]
#[command(name = "scanmark")]
#[command(about = "Grade a scanned handwritten answer script")]
#[command(version)]
pub(crate) struct GradeArgs {
    /// Scanned answer script; prompted for when omitted
    pub(crate) pdf: Option<PathBuf>,
    /// Where to write the evaluation summary CSV
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(name = "attendance")]
#[command(about = "Record attendance from a scanned sign-in sheet")]
#[command(version)]
pub(crate) struct AttendanceArgs {
    /// Photo or scan of the sign-in sheet; prompted for when omitted
    pub(crate) image: Option<PathBuf>,
    /// Date column to mark (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub(crate) date: Option<String>,
    /// Attendance CSV to update
    #[arg(short, long)]
    pub(crate) sheet: Option<PathBuf>,
    /// Skip unrecognized names instead of asking
    #[arg(long)]
    pub(crate) non_interactive: bool,
}

/// Writes `prompt` and reads one trimmed line. `None` means end of input.
pub(crate) fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    output.write_all(prompt.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read from the console")? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Uses the positional argument, otherwise asks on the console.
pub(crate) fn path_or_prompt(path: Option<PathBuf>, prompt: &str) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    match prompt_line(&mut input, &mut output, prompt)? {
        Some(answer) if !answer.is_empty() => Ok(PathBuf::from(answer)),
        _ => anyhow::bail!("no input path was given"),
    }
}

/// Asks an operator about each unrecognized name.
pub(crate) struct ConsoleResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleResolver<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> NameResolver for ConsoleResolver<R, W> {
    fn resolve(&mut self, pending: &PendingName, roster: &Roster) -> Result<Resolution> {
        writeln!(self.output, "\nUnrecognized name: '{}'", pending.extracted)?;
        if !pending.candidates.is_empty() {
            writeln!(self.output, "Closest roster names: {}", pending.candidates.join(", "))?;
        }

        let names = roster.names().collect::<Vec<_>>().join(", ");
        let prompt =
            format!("Enter the correct name from the list [{names}], or type 'skip' to ignore: ");
        let answer = prompt_line(&mut self.input, &mut self.output, &prompt)?;

        let resolution = match answer.as_deref() {
            Some(name) if roster.roll_number_for(name).is_some() => {
                Resolution::Roster(name.to_string())
            }
            Some(answer) if answer.eq_ignore_ascii_case("skip") => Resolution::Skip,
            Some(answer) => {
                tracing::warn!(
                    extracted = %pending.extracted,
                    answer,
                    "Answer is not on the roster"
                );
                Resolution::Skip
            }
            None => Resolution::Skip,
        };

        if resolution == Resolution::Skip {
            writeln!(self.output, "Skipping attendance for '{}'", pending.extracted)?;
        }
        Ok(resolution)
    }
}

/// Console table of an evaluation summary with a totals line.
pub(crate) fn render_summary(summary: &EvaluationSummary) -> String {
    if summary.is_empty() {
        return "No evaluation rows were parsed.".to_string();
    }

    let id_width = summary
        .rows
        .iter()
        .map(|row| row.question_id.chars().count())
        .chain(std::iter::once("Question".len()))
        .max()
        .unwrap_or(0);

    let header = format!("{:<id_width$}  {:>5}  {:>5}  Comments", "Question", "Score", "Max");
    let mut lines = vec![header];
    for row in &summary.rows {
        lines.push(
            format!(
                "{:<id_width$}  {:>5}  {:>5}  {}",
                row.question_id,
                format_score(row.marks_obtained),
                format_score(row.max_marks),
                row.comments
            )
            .trim_end()
            .to_string(),
        );
    }
    lines.push(format!(
        "Total: {} / {}",
        format_score(Some(summary.total_obtained())),
        format_score(Some(summary.total_max()))
    ));
    lines.join("\n")
}
