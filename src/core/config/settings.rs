use std::time::Duration;

use super::parsing::{
    env_optional, env_or_default, env_path, parse_bool, parse_f64, parse_u32, parse_u64,
    trim_base_url,
};
use super::types::{
    AiSettings, ConfigError, DataSettings, EvaluationSettings, OutputSettings, PdfSettings,
    Settings, TelemetrySettings, VisionSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let vision_api_key = env_or_default("OPENAI_API_KEY", "");
        let vision_base_url =
            trim_base_url(env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"));
        let vision_model = env_or_default("VISION_MODEL", "gpt-4-turbo");
        let answers_max_tokens =
            parse_u32("OCR_ANSWERS_MAX_TOKENS", env_or_default("OCR_ANSWERS_MAX_TOKENS", "1000"))?;
        let names_max_tokens =
            parse_u32("OCR_NAMES_MAX_TOKENS", env_or_default("OCR_NAMES_MAX_TOKENS", "300"))?;

        let evaluation_api_key = env_or_default("DEEPSEEK_API_KEY", "");
        let evaluation_base_url =
            trim_base_url(env_or_default("DEEPSEEK_BASE_URL", "https://api.deepseek.com/v1"));
        let evaluation_model = env_or_default("EVALUATION_MODEL", "deepseek-chat");
        let evaluation_max_tokens =
            parse_u32("EVALUATION_MAX_TOKENS", env_or_default("EVALUATION_MAX_TOKENS", "1500"))?;
        let evaluation_temperature =
            parse_f64("EVALUATION_TEMPERATURE", env_or_default("EVALUATION_TEMPERATURE", "0.1"))?;

        let request_timeout_seconds =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "120"))?;
        let max_retries = parse_u32("AI_MAX_RETRIES", env_or_default("AI_MAX_RETRIES", "0"))?;
        let grading_request_delay_ms = parse_u64(
            "GRADING_REQUEST_DELAY_MS",
            env_or_default("GRADING_REQUEST_DELAY_MS", "1000"),
        )?;

        let pdftoppm_path = env_or_default("PDFTOPPM_PATH", "pdftoppm");
        let render_dpi = parse_u32("PDF_RENDER_DPI", env_or_default("PDF_RENDER_DPI", "200"))?;

        let rubric_path = env_path("RUBRIC_PATH");
        let roster_path = env_path("ROSTER_PATH");

        let evaluation_summary_path =
            env_or_default("EVALUATION_SUMMARY_PATH", "evaluation_summary.csv").into();
        let attendance_file = env_or_default("ATTENDANCE_FILE", "attendance.csv").into();

        let log_level = env_or_default("SCANMARK_LOG_LEVEL", "info");
        let json =
            env_optional("SCANMARK_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let metrics_enabled =
            env_optional("SCANMARK_METRICS").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            vision: VisionSettings {
                api_key: vision_api_key,
                base_url: vision_base_url,
                model: vision_model,
                answers_max_tokens,
                names_max_tokens,
            },
            evaluation: EvaluationSettings {
                api_key: evaluation_api_key,
                base_url: evaluation_base_url,
                model: evaluation_model,
                max_tokens: evaluation_max_tokens,
                temperature: evaluation_temperature,
            },
            ai: AiSettings { request_timeout_seconds, max_retries, grading_request_delay_ms },
            pdf: PdfSettings { pdftoppm_path, render_dpi },
            data: DataSettings { rubric_path, roster_path },
            output: OutputSettings { evaluation_summary_path, attendance_file },
            telemetry: TelemetrySettings { log_level, json, metrics_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn vision(&self) -> &VisionSettings {
        &self.vision
    }

    pub(crate) fn evaluation(&self) -> &EvaluationSettings {
        &self.evaluation
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn pdf(&self) -> &PdfSettings {
        &self.pdf
    }

    pub(crate) fn data(&self) -> &DataSettings {
        &self.data
    }

    pub(crate) fn output(&self) -> &OutputSettings {
        &self.output
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn grading_request_delay(&self) -> Duration {
        Duration::from_millis(self.ai.grading_request_delay_ms)
    }

    pub(crate) fn require_vision_credentials(&self) -> Result<(), ConfigError> {
        if self.vision.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("OPENAI_API_KEY"));
        }
        Ok(())
    }

    pub(crate) fn require_evaluation_credentials(&self) -> Result<(), ConfigError> {
        if self.evaluation.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("DEEPSEEK_API_KEY"));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pdf.render_dpi == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PDF_RENDER_DPI",
                value: self.pdf.render_dpi.to_string(),
            });
        }

        if self.ai.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AI_REQUEST_TIMEOUT",
                value: self.ai.request_timeout_seconds.to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.evaluation.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "EVALUATION_TEMPERATURE",
                value: self.evaluation.temperature.to_string(),
            });
        }

        Ok(())
    }
}
