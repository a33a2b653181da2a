pub(crate) mod cli;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use clap::Parser;

use crate::cli::{AttendanceArgs, ConsoleResolver, GradeArgs};
use crate::core::{config::Settings, telemetry};
use crate::schemas::{roster::Roster, rubric::Rubric};
use crate::services::answer_evaluation::ChatAnswerEvaluator;
use crate::services::name_matching::SkipResolver;
use crate::services::pdf_pages::PdftoppmRasterizer;
use crate::services::vision_ocr::OpenAiVisionOcr;
use crate::tasks::grading::GradingPipeline;

fn init_runtime() -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;
    Ok(settings)
}

pub async fn run_grading() -> anyhow::Result<()> {
    let args = GradeArgs::parse();
    let settings = init_runtime()?;
    settings.require_vision_credentials()?;
    settings.require_evaluation_credentials()?;

    let rubric = Rubric::load(settings.data().rubric_path.as_deref())?;
    tracing::info!(
        questions = rubric.questions().len(),
        total_marks = rubric.total_marks(),
        "Rubric loaded"
    );
    let rasterizer = PdftoppmRasterizer::from_settings(&settings);
    let ocr = OpenAiVisionOcr::from_settings(&settings)?;
    let evaluator = ChatAnswerEvaluator::from_settings(&settings)?;

    let pdf = cli::path_or_prompt(args.pdf, cli::PDF_PROMPT)?;
    let output =
        args.output.unwrap_or_else(|| settings.output().evaluation_summary_path.clone());

    let pipeline = GradingPipeline {
        rasterizer: &rasterizer,
        ocr: &ocr,
        evaluator: &evaluator,
        rubric: &rubric,
        request_delay: settings.grading_request_delay(),
    };
    let outcome = pipeline.run(&pdf, &output).await?;

    println!("{}", cli::render_summary(&outcome.summary));
    println!("Summary saved as {}", output.display());

    core::metrics::log_snapshot();
    Ok(())
}

pub async fn run_attendance() -> anyhow::Result<()> {
    let args = AttendanceArgs::parse();
    let settings = init_runtime()?;
    settings.require_vision_credentials()?;

    let roster = Roster::load(settings.data().roster_path.as_deref())?;
    let ocr = OpenAiVisionOcr::from_settings(&settings)?;
    let date = match args.date.as_deref() {
        Some(value) => core::time::format_date(core::time::parse_date(value)?),
        None => core::time::format_date(core::time::today_local()),
    };
    let sheet_path = args.sheet.unwrap_or_else(|| settings.output().attendance_file.clone());

    let image = cli::path_or_prompt(args.image, cli::IMAGE_PROMPT)?;
    let Some(mut update) =
        tasks::attendance::prepare_attendance(&ocr, &image, &roster, &sheet_path, &date).await?
    else {
        println!("No valid names detected. Attendance not updated.");
        core::metrics::log_snapshot();
        return Ok(());
    };

    if args.non_interactive {
        update.resolve_with(&mut SkipResolver)?;
    } else {
        let stdin = std::io::stdin();
        let mut resolver = ConsoleResolver::new(stdin.lock(), std::io::stdout());
        update.resolve_with(&mut resolver)?;
    }

    let report = update.commit(&sheet_path)?;
    println!("{}", report.sheet.render_table());
    println!(
        "Attendance updated successfully in {} for {} ({} present, {} skipped).",
        sheet_path.display(),
        report.date,
        report.present.len(),
        report.skipped.len()
    );

    core::metrics::log_snapshot();
    Ok(())
}
