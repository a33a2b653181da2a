pub(crate) mod answer_evaluation;
pub(crate) mod atomic_file;
pub(crate) mod attendance_sheet;
pub(crate) mod chat_completions;
pub(crate) mod evaluation_table;
pub(crate) mod name_matching;
pub(crate) mod pdf_pages;
pub(crate) mod summary_export;
pub(crate) mod vision_ocr;
