use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::{Chunk, ChunkId};
use crate::error::McqError;

/// The four option labels every question is expected to carry.
pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

// ── Question ──────────────────────────────────────────────────

/// One multiple-choice question as produced by the model.
///
/// Decoding never fails on a JSON object: missing or `null` fields become
/// empty, scalar values are kept as their JSON text (`4` becomes `"4"`), and
/// an options array is labelled A, B, C... in order. Use
/// [`Question::validate`] to check the shape explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "lenient_text")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_options")]
    pub options: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub correct_answer: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub explanation: String,
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Value::deserialize(de).map(value_text)
}

fn lenient_options<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Object(map) => map.into_iter().map(|(k, v)| (k, value_text(v))).collect(),
        Value::Array(items) => (b'A'..=b'Z')
            .zip(items)
            .map(|(label, v)| (char::from(label).to_string(), value_text(v)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionDefect {
    #[error("question text is empty")]
    EmptyQuestion,
    #[error("expected 4 options, found {0}")]
    OptionCount(usize),
    #[error("unexpected option label '{0}'")]
    UnexpectedLabel(String),
    #[error("correct answer '{0}' is not one of the options")]
    CorrectAnswerNotAnOption(String),
}

impl Question {
    /// Check the record against the MCQ shape: non-empty text, exactly the
    /// labels A..D, and a correct answer naming one of them.
    pub fn validate(&self) -> Result<(), QuestionDefect> {
        if self.question.trim().is_empty() {
            return Err(QuestionDefect::EmptyQuestion);
        }
        if self.options.len() != OPTION_LABELS.len() {
            return Err(QuestionDefect::OptionCount(self.options.len()));
        }
        if let Some(label) = self
            .options
            .keys()
            .find(|k| !OPTION_LABELS.contains(&k.as_str()))
        {
            return Err(QuestionDefect::UnexpectedLabel(label.clone()));
        }
        if !self.options.contains_key(&self.correct_answer) {
            return Err(QuestionDefect::CorrectAnswerNotAnOption(
                self.correct_answer.clone(),
            ));
        }
        Ok(())
    }
}

// ── Failure classification ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No `{ … }` span in the completion.
    NoJsonFound,
    /// A span was found but did not decode as JSON.
    JsonDecodeError,
    /// The generation capability itself failed.
    GenerationFailure,
    /// The generation call exceeded the per-chunk deadline.
    Timeout,
    /// Strict validation rejected a decoded question.
    InvalidQuestion,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::NoJsonFound => "no_json_found",
            FailureKind::JsonDecodeError => "json_decode_error",
            FailureKind::GenerationFailure => "generation_failure",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidQuestion => "invalid_question",
        };
        f.write_str(s)
    }
}

// ── Per-chunk outcomes ────────────────────────────────────────

/// Result of interpreting one completion, before chunk metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub success: bool,
    pub questions: Vec<Question>,
    pub error: Option<String>,
    pub error_kind: Option<FailureKind>,
    pub raw_response: String,
}

impl CompletionOutcome {
    pub fn parsed(questions: Vec<Question>, raw_response: impl Into<String>) -> Self {
        Self {
            success: true,
            questions,
            error: None,
            error_kind: None,
            raw_response: raw_response.into(),
        }
    }

    pub fn failed(
        kind: FailureKind,
        error: impl Into<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            questions: Vec::new(),
            error: Some(error.into()),
            error_kind: Some(kind),
            raw_response: raw_response.into(),
        }
    }
}

/// One generation attempt for one chunk, with the chunk's provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(default)]
    pub raw_response: String,
    pub chunk_id: ChunkId,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default)]
    pub chunk_tokens: usize,
    #[serde(default)]
    pub filename: String,
}

impl GenerationResult {
    pub fn from_outcome(outcome: CompletionOutcome, chunk: &Chunk, filename: &str) -> Self {
        Self {
            success: outcome.success,
            questions: outcome.questions,
            error: outcome.error,
            error_kind: outcome.error_kind,
            raw_response: outcome.raw_response,
            chunk_id: chunk.id,
            chunk_text: chunk.text.clone(),
            chunk_tokens: chunk.token_count,
            filename: filename.to_string(),
        }
    }

    /// Successful and carrying at least one question.
    pub fn has_questions(&self) -> bool {
        self.success && !self.questions.is_empty()
    }
}

// ── Reports ───────────────────────────────────────────────────

/// A question (or a failed-chunk placeholder) with its chunk provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedQuestion {
    pub question_id: String,
    pub filename: String,
    pub chunk_id: ChunkId,
    pub chunk_tokens: usize,
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    pub explanation: String,
    pub generation_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of processing one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub filename: String,
    pub success: bool,
    pub total_chunks: usize,
    pub selected_chunks: usize,
    pub total_questions: usize,
    pub saved_file: Option<String>,
    pub results: Vec<GenerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    /// Report for a document that could not be processed at all.
    pub fn failed(filename: &str, error: &McqError) -> Self {
        Self {
            filename: filename.to_string(),
            success: false,
            total_chunks: 0,
            selected_chunks: 0,
            total_questions: 0,
            saved_file: None,
            results: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Keep the results but note that they were not persisted.
    pub fn save_failed(&mut self, error: &McqError) {
        self.saved_file = None;
        self.error = Some(error.to_string());
    }
}

/// Outcome of one batch request, documents in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: bool,
    pub total_files: usize,
    pub total_questions: usize,
    pub questions_per_pdf: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    pub file_results: Vec<DocumentReport>,
    pub all_questions: Vec<FlattenedQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question {
            question: "What is 2 + 2?".into(),
            options: OPTION_LABELS
                .iter()
                .zip(["3", "4", "5", "22"])
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            correct_answer: "B".into(),
            explanation: "Arithmetic.".into(),
        }
    }

    #[test]
    fn valid_question_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let mut q = sample();
        q.correct_answer = "E".into();
        assert_eq!(
            q.validate(),
            Err(QuestionDefect::CorrectAnswerNotAnOption("E".into()))
        );
    }

    #[test]
    fn three_options_rejected() {
        let mut q = sample();
        q.options.remove("D");
        assert_eq!(q.validate(), Err(QuestionDefect::OptionCount(3)));
    }

    #[test]
    fn lowercase_label_rejected() {
        let mut q = sample();
        let v = q.options.remove("D").unwrap();
        q.options.insert("d".into(), v);
        assert_eq!(q.validate(), Err(QuestionDefect::UnexpectedLabel("d".into())));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let q: Question = serde_json::from_str(r#"{"question": "Why?"}"#).unwrap();
        assert_eq!(q.question, "Why?");
        assert!(q.options.is_empty());
        assert_eq!(q.validate(), Err(QuestionDefect::OptionCount(0)));
    }

    #[test]
    fn wrong_typed_fields_are_kept_as_text() {
        let q: Question = serde_json::from_str(
            r#"{"question": "What is 2 + 2?", "options": {"A": 3, "B": 4, "C": true, "D": null},
                "correct_answer": "B", "explanation": null}"#,
        )
        .unwrap();
        assert_eq!(q.options["A"], "3");
        assert_eq!(q.options["B"], "4");
        assert_eq!(q.options["C"], "true");
        assert_eq!(q.options["D"], "");
        assert_eq!(q.explanation, "");
        assert_eq!(q.validate(), Ok(()));
    }

    #[test]
    fn option_array_is_labelled_in_order() {
        let q: Question = serde_json::from_str(
            r#"{"question": "Pick one", "options": ["x", "y", "z", "w"], "correct_answer": "C"}"#,
        )
        .unwrap();
        assert_eq!(q.options["A"], "x");
        assert_eq!(q.options["D"], "w");
        assert_eq!(q.validate(), Ok(()));
    }

    #[test]
    fn failed_report_carries_the_error() {
        let err = McqError::Extraction {
            filename: "scan.pdf".into(),
            reason: "No text could be extracted from PDF".into(),
        };
        let report = DocumentReport::failed("scan.pdf", &err);
        assert!(!report.success);
        assert_eq!(
            report.error.as_deref(),
            Some("No text could be extracted from PDF")
        );

        let mut report = DocumentReport {
            success: true,
            saved_file: Some("mcq_scan.json".into()),
            error: None,
            ..report
        };
        report.save_failed(&McqError::Storage("disk full".into()));
        assert!(report.success);
        assert!(report.saved_file.is_none());
        assert_eq!(report.error.as_deref(), Some("Storage error: disk full"));
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let s = serde_json::to_string(&FailureKind::JsonDecodeError).unwrap();
        assert_eq!(s, "\"json_decode_error\"");
        assert_eq!(FailureKind::NoJsonFound.to_string(), "no_json_found");
    }

    #[test]
    fn generation_result_omits_absent_error() {
        let chunk = Chunk {
            id: 4,
            text: "Text.".into(),
            token_count: 2,
            start_sentence: 0,
        };
        let r = GenerationResult::from_outcome(
            CompletionOutcome::parsed(vec![sample()], "{}"),
            &chunk,
            "a.pdf",
        );
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("error").is_none());
        assert_eq!(v["chunk_id"], 4);
        assert_eq!(v["filename"], "a.pdf");
        assert!(r.has_questions());
    }
}
