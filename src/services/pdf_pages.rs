use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use crate::core::config::Settings;

/// Page images of one PDF. The images live in a temporary directory that is
/// removed when this value is dropped.
#[derive(Debug)]
pub(crate) struct RenderedPages {
    _dir: TempDir,
    pages: Vec<PathBuf>,
}

impl RenderedPages {
    pub(crate) fn new(dir: TempDir, pages: Vec<PathBuf>) -> Self {
        Self { _dir: dir, pages }
    }

    pub(crate) fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    /// `Page 1`, `Page 2`, ... paired with each image path.
    pub(crate) fn labelled(&self) -> impl Iterator<Item = (String, &Path)> {
        self.pages.iter().enumerate().map(|(idx, path)| (page_label(idx), path.as_path()))
    }
}

pub(crate) fn page_label(index: usize) -> String {
    format!("Page {}", index + 1)
}

#[async_trait]
pub(crate) trait PageRasterizer: Send + Sync {
    async fn render(&self, pdf: &Path) -> Result<RenderedPages>;
}

/// Rasterizes with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub(crate) struct PdftoppmRasterizer {
    program: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self { program: settings.pdf().pdftoppm_path.clone(), dpi: settings.pdf().render_dpi }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render(&self, pdf: &Path) -> Result<RenderedPages> {
        if !pdf.is_file() {
            return Err(anyhow!("PDF not found: {}", pdf.display()));
        }

        let dir = tempfile::Builder::new()
            .prefix("scanmark-pages-")
            .tempdir()
            .context("Failed to create page image directory")?;

        let output = Command::new(&self.program)
            .arg("-jpeg")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(dir.path().join("page"))
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let pages = collect_page_images(dir.path())?;
        if pages.is_empty() {
            return Err(anyhow!("{} produced no pages for {}", self.program, pdf.display()));
        }

        tracing::info!(pdf = %pdf.display(), pages = pages.len(), "Rendered answer script");

        Ok(RenderedPages::new(dir, pages))
    }
}

/// `pdftoppm` zero-pads page numbers to a common width, so a name sort is
/// page order.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir).context("Failed to list rendered pages")? {
        let path = entry.context("Failed to read rendered page entry")?.path();
        let is_page = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("page-") && name.ends_with(".jpg"));
        if is_page {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}
