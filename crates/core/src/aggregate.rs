//! Merge per-chunk generation results into document-level views.
//!
//! Every selected chunk is accounted for in the flattened list: one entry per
//! question when generation succeeded, or exactly one placeholder entry when
//! it failed. A "successful" result with zero questions counts as a failure
//! here, so callers can always recover per-chunk provenance from `chunk_id`.

use crate::question::{DocumentReport, FlattenedQuestion, GenerationResult};

/// Error attached to placeholders for results that succeeded without questions.
const NO_QUESTIONS_ERROR: &str = "Model returned no questions";

/// Flatten results into question entries, in result order.
pub fn flatten_results(results: &[GenerationResult]) -> Vec<FlattenedQuestion> {
    let mut flat = Vec::new();

    for result in results {
        if result.has_questions() {
            for (j, q) in result.questions.iter().enumerate() {
                flat.push(FlattenedQuestion {
                    question_id: format!("chunk_{}_q_{}", result.chunk_id, j + 1),
                    filename: result.filename.clone(),
                    chunk_id: result.chunk_id,
                    chunk_tokens: result.chunk_tokens,
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer.clone(),
                    explanation: q.explanation.clone(),
                    generation_success: true,
                    error: None,
                });
            }
        } else {
            let error = result
                .error
                .clone()
                .unwrap_or_else(|| NO_QUESTIONS_ERROR.to_string());
            flat.push(FlattenedQuestion {
                question_id: format!("chunk_{}_failed", result.chunk_id),
                filename: result.filename.clone(),
                chunk_id: result.chunk_id,
                chunk_tokens: result.chunk_tokens,
                question: String::new(),
                options: Default::default(),
                correct_answer: String::new(),
                explanation: String::new(),
                generation_success: false,
                error: Some(error),
            });
        }
    }

    flat
}

/// Build the report for one document from its chunk results.
///
/// `total_questions` counts flattened entries with `generation_success`.
/// `saved_file` is left empty; the caller fills it once storage succeeds.
pub fn aggregate(
    filename: &str,
    total_chunks: usize,
    results: Vec<GenerationResult>,
) -> (DocumentReport, Vec<FlattenedQuestion>) {
    let questions = flatten_results(&results);
    let total_questions = questions.iter().filter(|q| q.generation_success).count();

    let report = DocumentReport {
        filename: filename.to_string(),
        success: true,
        total_chunks,
        selected_chunks: results.len(),
        total_questions,
        saved_file: None,
        results,
        error: None,
    };

    (report, questions)
}
