use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::schemas::evaluation::ExtractedAnswers;
use crate::schemas::roster::Roster;
use crate::schemas::rubric::Rubric;
use crate::services::answer_evaluation::AnswerEvaluator;
use crate::services::name_matching::{NameResolver, PendingName, Resolution};
use crate::services::pdf_pages::{PageRasterizer, RenderedPages};
use crate::services::vision_ocr::{OcrTask, VisionOcr};

const SCANMARK_ENV: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "VISION_MODEL",
    "OCR_ANSWERS_MAX_TOKENS",
    "OCR_NAMES_MAX_TOKENS",
    "DEEPSEEK_API_KEY",
    "DEEPSEEK_BASE_URL",
    "EVALUATION_MODEL",
    "EVALUATION_MAX_TOKENS",
    "EVALUATION_TEMPERATURE",
    "AI_REQUEST_TIMEOUT",
    "AI_MAX_RETRIES",
    "GRADING_REQUEST_DELAY_MS",
    "PDFTOPPM_PATH",
    "PDF_RENDER_DPI",
    "RUBRIC_PATH",
    "ROSTER_PATH",
    "EVALUATION_SUMMARY_PATH",
    "ATTENDANCE_FILE",
    "SCANMARK_LOG_LEVEL",
    "SCANMARK_LOG_JSON",
    "SCANMARK_METRICS",
];

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn clear_scanmark_env() {
    for key in SCANMARK_ENV {
        std::env::remove_var(key);
    }
}

/// Produces `pages` blank JPEG files per render, or fails every render.
pub(crate) struct FakeRasterizer {
    pages: Option<usize>,
}

impl FakeRasterizer {
    pub(crate) fn with_pages(pages: usize) -> Self {
        Self { pages: Some(pages) }
    }

    pub(crate) fn failing() -> Self {
        Self { pages: None }
    }
}

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    async fn render(&self, pdf: &Path) -> Result<RenderedPages> {
        let Some(count) = self.pages else {
            anyhow::bail!("pdftoppm exited with status 1 for {}", pdf.display());
        };

        let dir = tempfile::tempdir()?;
        let mut pages = Vec::with_capacity(count);
        for index in 1..=count {
            let path: PathBuf = dir.path().join(format!("page-{index}.jpg"));
            std::fs::write(&path, b"\xff\xd8\xff\xd9")?;
            pages.push(path);
        }
        Ok(RenderedPages::new(dir, pages))
    }
}

/// Replies from a queue in call order. An exhausted queue yields empty text.
pub(crate) struct FakeOcr {
    replies: StdMutex<VecDeque<Result<String>>>,
    tasks: StdMutex<Vec<OcrTask>>,
}

impl FakeOcr {
    pub(crate) fn replying(replies: Vec<Result<String>>) -> Self {
        Self { replies: StdMutex::new(replies.into()), tasks: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn tasks(&self) -> Vec<OcrTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionOcr for FakeOcr {
    async fn transcribe(&self, _image: &Path, task: OcrTask) -> Result<String> {
        self.tasks.lock().unwrap().push(task);
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(String::new()))
    }
}

pub(crate) struct FakeEvaluator {
    reply: StdMutex<Option<Result<String>>>,
    seen_pages: AtomicUsize,
}

impl FakeEvaluator {
    pub(crate) fn replying(reply: Result<String>) -> Self {
        Self { reply: StdMutex::new(Some(reply)), seen_pages: AtomicUsize::new(0) }
    }

    /// Page count of the last evaluated script; zero when never called.
    pub(crate) fn seen_pages(&self) -> usize {
        self.seen_pages.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerEvaluator for FakeEvaluator {
    async fn evaluate(&self, _rubric: &Rubric, answers: &ExtractedAnswers) -> Result<String> {
        self.seen_pages.store(answers.pages().len(), Ordering::SeqCst);
        self.reply.lock().unwrap().take().unwrap_or_else(|| Ok(String::new()))
    }
}

/// Hands out prepared answers in order and records what it was asked.
pub(crate) struct ScriptedResolver {
    answers: VecDeque<Resolution>,
    asked: Vec<String>,
}

impl ScriptedResolver {
    pub(crate) fn new(answers: Vec<Resolution>) -> Self {
        Self { answers: answers.into(), asked: Vec::new() }
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        self.asked.clone()
    }
}

impl NameResolver for ScriptedResolver {
    fn resolve(&mut self, pending: &PendingName, _roster: &Roster) -> Result<Resolution> {
        self.asked.push(pending.extracted.clone());
        Ok(self.answers.pop_front().unwrap_or(Resolution::Skip))
    }
}
