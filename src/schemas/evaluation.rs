/// Text transcribed from one page of an answer script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageAnswer {
    pub(crate) page_id: String,
    pub(crate) text: String,
}

/// Transcriptions for a whole script, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExtractedAnswers {
    pages: Vec<PageAnswer>,
}

impl ExtractedAnswers {
    pub(crate) fn push(&mut self, page_id: impl Into<String>, text: impl Into<String>) {
        self.pages.push(PageAnswer { page_id: page_id.into(), text: text.into() });
    }

    pub(crate) fn pages(&self) -> &[PageAnswer] {
        &self.pages
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EvaluationRow {
    pub(crate) question_id: String,
    /// Empty when the id is not part of the rubric.
    pub(crate) question: String,
    pub(crate) max_marks: Option<f64>,
    pub(crate) marks_obtained: Option<f64>,
    pub(crate) comments: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EvaluationSummary {
    pub(crate) rows: Vec<EvaluationRow>,
}

impl EvaluationSummary {
    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn total_obtained(&self) -> f64 {
        self.rows.iter().filter_map(|row| row.marks_obtained).sum()
    }

    pub(crate) fn total_max(&self) -> f64 {
        self.rows.iter().filter_map(|row| row.max_marks).sum()
    }
}
