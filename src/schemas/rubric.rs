use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::core::config::ConfigError;

const BUILTIN_QUESTIONS: &[(&str, &str, u32)] = &[
    ("1", "What are the two most common supervised tasks?", 1),
    ("2", "What is the purpose of a validation set?", 1),
    (
        "3",
        "How many model parameters are there in a linear regression problem with a single feature variable?",
        1,
    ),
    ("4", "What is the AUC value of a perfect classifier?", 1),
    (
        "5",
        "Out of precision and recall, which one is more important for a spam email detection system?",
        1,
    ),
    (
        "6",
        "What is train-test-split? What do you understand by overfitting and underfitting of training data and how do you prevent them?",
        5,
    ),
    (
        "7",
        "What are bias and variance of a machine learning model? How do you reduce them? What is the bias-variance trade-off?",
        5,
    ),
    (
        "8",
        "Explain the cost-functions associated with linear regression and logistic regression problems. What are the general algorithms that are available to minimize the cost-functions?",
        5,
    ),
    (
        "9",
        "What is the confusion matrix and why is it important? In a classification problem, true negative = 82, false positive =3, false negative=5, true positive=10, determine the following: precision, recall, false negative rate, false positive rate?",
        5,
    ),
    (
        "10",
        "What is ROC and AUC? Draw a roc curve for perfect classifier, practical classifier, and random classifier? What do you understand about the precision-recall trade-off?",
        5,
    ),
    (
        "11",
        "Draw and explain a typical ROC curve for the following cases; each figure represents the probability distribution of negative and positive prediction as function of decision threshold of a classifier.",
        5,
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) prompt: String,
    pub(crate) max_marks: u32,
}

/// Questions and their maximum marks, in exam order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rubric {
    questions: Vec<Question>,
}

impl Rubric {
    pub(crate) fn builtin() -> Self {
        Self {
            questions: BUILTIN_QUESTIONS
                .iter()
                .map(|(id, prompt, max_marks)| Question {
                    id: id.to_string(),
                    prompt: prompt.to_string(),
                    max_marks: *max_marks,
                })
                .collect(),
        }
    }

    /// Reads a rubric file when a path is configured, otherwise the built-in one.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_questions(super::read_json_file(path)?),
            None => Ok(Self::builtin()),
        }
    }

    pub(crate) fn from_questions(questions: Vec<Question>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(questions.len());

        for mut question in questions {
            question.id = question.id.trim().to_string();
            if question.id.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "RUBRIC_PATH",
                    value: format!("question with empty id: {}", question.prompt),
                });
            }
            if !seen.insert(question.id.clone()) {
                return Err(ConfigError::DuplicateEntry { kind: "question id", value: question.id });
            }
            normalized.push(question);
        }

        Ok(Self { questions: normalized })
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub(crate) fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub(crate) fn total_marks(&self) -> u32 {
        self.questions.iter().map(|question| question.max_marks).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_rubric_matches_exam_paper() {
        let rubric = Rubric::builtin();
        assert_eq!(rubric.questions().len(), 11);
        assert_eq!(rubric.get("4").map(|q| q.max_marks), Some(1));
        assert_eq!(rubric.get("11").map(|q| q.max_marks), Some(5));
        assert_eq!(rubric.total_marks(), 35);
        assert!(rubric.get("12").is_none());
    }

    #[test]
    fn load_reads_file_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "b", "prompt": "Second?", "max_marks": 2}},
                {{"id": " a ", "prompt": "First?", "max_marks": 3}}]"#
        )
        .unwrap();

        let rubric = Rubric::load(Some(file.path())).unwrap();
        let ids: Vec<&str> = rubric.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(rubric.total_marks(), 5);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let questions = vec![
            Question { id: "1".to_string(), prompt: "A".to_string(), max_marks: 1 },
            Question { id: "1".to_string(), prompt: "B".to_string(), max_marks: 1 },
        ];
        let err = Rubric::from_questions(questions).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEntry { kind: "question id", .. }));
    }

    #[test]
    fn negative_marks_fail_to_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "1", "prompt": "A", "max_marks": -1}}]"#).unwrap();

        let err = Rubric::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile { .. }));
    }
}
