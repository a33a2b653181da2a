use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) vision: VisionSettings,
    pub(super) evaluation: EvaluationSettings,
    pub(super) ai: AiSettings,
    pub(super) pdf: PdfSettings,
    pub(super) data: DataSettings,
    pub(super) output: OutputSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct VisionSettings {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) answers_max_tokens: u32,
    pub(crate) names_max_tokens: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct EvaluationSettings {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct AiSettings {
    pub(crate) request_timeout_seconds: u64,
    pub(crate) max_retries: u32,
    pub(crate) grading_request_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct PdfSettings {
    pub(crate) pdftoppm_path: String,
    pub(crate) render_dpi: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct DataSettings {
    pub(crate) rubric_path: Option<PathBuf>,
    pub(crate) roster_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct OutputSettings {
    pub(crate) evaluation_summary_path: PathBuf,
    pub(crate) attendance_file: PathBuf,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) metrics_enabled: bool,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
    #[error("failed to load {path}: {reason}")]
    InvalidFile { path: String, reason: String },
    #[error("duplicate {kind} in configuration: {value}")]
    DuplicateEntry { kind: &'static str, value: String },
}
