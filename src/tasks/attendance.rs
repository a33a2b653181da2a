use std::path::Path;

use anyhow::{Context, Result};

use crate::schemas::roster::Roster;
use crate::services::attendance_sheet::{AttendanceSheet, PRESENT};
use crate::services::name_matching::{
    extract_names, reconcile, NameResolver, PendingName, Resolution,
};
use crate::services::vision_ocr::{OcrTask, VisionOcr};

/// An attendance run that has applied every exact match and is waiting for
/// decisions on the names it could not place.
#[derive(Debug)]
pub(crate) struct AttendanceUpdate<'a> {
    roster: &'a Roster,
    sheet: AttendanceSheet,
    date: String,
    present: Vec<String>,
    pending: Vec<PendingName>,
    skipped: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct AttendanceReport {
    pub(crate) date: String,
    pub(crate) present: Vec<String>,
    pub(crate) skipped: Vec<String>,
    pub(crate) sheet: AttendanceSheet,
}

/// Reads names off the sign-in sheet and applies exact roster matches.
///
/// Returns `None` when no usable name was read; the attendance file is left
/// alone in that case.
pub(crate) async fn prepare_attendance<'a>(
    ocr: &dyn VisionOcr,
    image: &Path,
    roster: &'a Roster,
    sheet_path: &Path,
    date: &str,
) -> Result<Option<AttendanceUpdate<'a>>> {
    let names = match ocr.transcribe(image, OcrTask::SignInSheet).await {
        Ok(text) => extract_names(&text),
        Err(err) => {
            tracing::error!(
                image = %image.display(),
                task = OcrTask::SignInSheet.as_str(),
                error = %format!("{err:#}"),
                "Error during OCR extraction"
            );
            Vec::new()
        }
    };

    if names.is_empty() {
        tracing::warn!("No valid names detected. Attendance not updated.");
        return Ok(None);
    }
    tracing::info!(names = ?names, "Extracted names");

    let mut sheet = AttendanceSheet::load_or_seed(sheet_path, roster)
        .with_context(|| format!("Failed to load {}", sheet_path.display()))?;
    if sheet.ensure_date_column(date) {
        tracing::info!(date, "Added attendance column");
    }
    tracing::debug!(
        students = sheet.len(),
        dates = sheet.dates().len(),
        "Attendance sheet ready"
    );

    let reconciliation = reconcile(&names, roster);
    let mut present = Vec::with_capacity(reconciliation.matched.len());
    for matched in reconciliation.matched {
        sheet.mark_present(&matched.roll_number, date);
        metrics::counter!("attendance_names_total", "outcome" => "matched").increment(1);
        present.push(matched.extracted);
    }

    Ok(Some(AttendanceUpdate {
        roster,
        sheet,
        date: date.to_string(),
        present,
        pending: reconciliation.pending,
        skipped: Vec::new(),
    }))
}

impl AttendanceUpdate<'_> {
    pub(crate) fn pending(&self) -> &[PendingName] {
        &self.pending
    }

    /// Settles one pending name. A roster name that does not exist counts as
    /// a skip.
    pub(crate) fn apply(&mut self, pending: &PendingName, resolution: Resolution) {
        match resolution {
            Resolution::Roster(name) => match self.roster.roll_number_for(&name) {
                Some(roll_number) => {
                    if self.sheet.status(roll_number, &self.date) == Some(PRESENT) {
                        tracing::debug!(roster_name = %name, "Already marked present");
                    }
                    self.sheet.mark_present(roll_number, &self.date);
                    metrics::counter!("attendance_names_total", "outcome" => "resolved")
                        .increment(1);
                    tracing::info!(
                        extracted = %pending.extracted,
                        roster_name = %name,
                        "Resolved name"
                    );
                    self.present.push(name);
                }
                None => {
                    tracing::warn!(
                        extracted = %pending.extracted,
                        answer = %name,
                        "Answer is not on the roster; skipping"
                    );
                    self.skip(pending);
                }
            },
            Resolution::Skip => self.skip(pending),
        }
    }

    /// Runs every pending name through `resolver`.
    pub(crate) fn resolve_with(&mut self, resolver: &mut dyn NameResolver) -> Result<()> {
        for pending in std::mem::take(&mut self.pending) {
            let resolution = resolver.resolve(&pending, self.roster)?;
            self.apply(&pending, resolution);
        }
        Ok(())
    }

    /// Writes the sheet. Names still pending are recorded as skipped.
    pub(crate) fn commit(mut self, path: &Path) -> Result<AttendanceReport> {
        for pending in std::mem::take(&mut self.pending) {
            self.skip(&pending);
        }

        self.sheet
            .save(path)
            .with_context(|| format!("Failed to save attendance to {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            date = %self.date,
            present = self.present.len(),
            skipped = self.skipped.len(),
            "Attendance updated"
        );

        Ok(AttendanceReport {
            date: self.date,
            present: self.present,
            skipped: self.skipped,
            sheet: self.sheet,
        })
    }

    fn skip(&mut self, pending: &PendingName) {
        metrics::counter!("attendance_names_total", "outcome" => "skipped").increment(1);
        self.skipped.push(pending.extracted.clone());
    }
}
