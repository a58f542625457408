use chrono::{DateTime, Utc};
use mcqgen_core::{preview, Chunk, ChunkId, GenerationResult, Question};
use serde::{Deserialize, Serialize};

/// Characters of question text shown in a summary.
const PREVIEW_CHARS: usize = 100;

/// Generation settings recorded alongside a document's results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_per_pdf: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_chunks: Option<usize>,
    /// 1-based position of the document within its batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source_filename: String,
    pub generation_timestamp: DateTime<Utc>,
    pub total_chunks: usize,
    /// Questions across successful results.
    pub total_questions: usize,
    pub successful_generations: usize,
    pub failed_generations: usize,
    #[serde(flatten)]
    pub params: RecordParams,
}

impl RecordMetadata {
    pub fn summarize(
        source_filename: &str,
        chunks: &[Chunk],
        results: &[GenerationResult],
        params: RecordParams,
    ) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            source_filename: source_filename.to_string(),
            generation_timestamp: Utc::now(),
            total_chunks: chunks.len(),
            total_questions: results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.questions.len())
                .sum(),
            successful_generations: successful,
            failed_generations: results.len() - successful,
            params,
        }
    }
}

/// Everything persisted for one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqRecord {
    pub metadata: RecordMetadata,
    /// All chunks of the document, not only the selected ones.
    pub chunks: Vec<Chunk>,
    pub mcq_results: Vec<GenerationResult>,
}

/// Listing entry for one stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub filename: String,
    pub filepath: String,
    pub source_filename: String,
    /// `None` when the record could not be read.
    pub generation_timestamp: Option<DateTime<Utc>>,
    pub total_questions: usize,
    pub file_size: u64,
}

/// Compact view of one question, pointing back into the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub question_id: String,
    pub chunk_id: ChunkId,
    pub chunk_tokens: usize,
    pub question_preview: String,
    pub correct_answer: String,
    pub generation_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `mcq_results[i].questions[j]`, or `mcq_results[i]` for a failed chunk.
    pub full_question_ref: String,
}

/// All questions of a record without their chunk metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub mcq_results: Vec<Question>,
    pub total_questions: usize,
}

/// Target of a `full_question_ref`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedRef<'a> {
    Result(&'a GenerationResult),
    Question(&'a Question),
}

impl McqRecord {
    pub fn new(
        source_filename: &str,
        chunks: Vec<Chunk>,
        mcq_results: Vec<GenerationResult>,
        params: RecordParams,
    ) -> Self {
        let metadata = RecordMetadata::summarize(source_filename, &chunks, &mcq_results, params);
        Self {
            metadata,
            chunks,
            mcq_results,
        }
    }

    /// Questions from successful results, with the stored total.
    pub fn questions(&self) -> QuestionSet {
        let mcq_results = self
            .mcq_results
            .iter()
            .filter(|r| r.success)
            .flat_map(|r| r.questions.iter().cloned())
            .collect();
        QuestionSet {
            mcq_results,
            total_questions: self.metadata.total_questions,
        }
    }

    /// One summary per question, plus one per result without questions.
    pub fn question_summaries(&self) -> Vec<QuestionSummary> {
        let mut out = Vec::new();

        for (i, result) in self.mcq_results.iter().enumerate() {
            if result.has_questions() {
                for (j, q) in result.questions.iter().enumerate() {
                    out.push(QuestionSummary {
                        question_id: format!("chunk_{}_q_{}", result.chunk_id, j + 1),
                        chunk_id: result.chunk_id,
                        chunk_tokens: result.chunk_tokens,
                        question_preview: preview(&q.question, PREVIEW_CHARS),
                        correct_answer: q.correct_answer.clone(),
                        generation_success: true,
                        error: None,
                        full_question_ref: format!("mcq_results[{i}].questions[{j}]"),
                    });
                }
            } else {
                out.push(QuestionSummary {
                    question_id: format!("chunk_{}_failed", result.chunk_id),
                    chunk_id: result.chunk_id,
                    chunk_tokens: result.chunk_tokens,
                    question_preview: String::new(),
                    correct_answer: String::new(),
                    generation_success: false,
                    error: Some(
                        result
                            .error
                            .clone()
                            .unwrap_or_else(|| "Unknown error".to_string()),
                    ),
                    full_question_ref: format!("mcq_results[{i}]"),
                });
            }
        }

        out
    }

    /// Look up a `full_question_ref`. `None` when malformed or out of range.
    pub fn resolve_ref(&self, reference: &str) -> Option<ResolvedRef<'_>> {
        let rest = reference.strip_prefix("mcq_results[")?;
        let (i, rest) = rest.split_once(']')?;
        let result = self.mcq_results.get(i.parse::<usize>().ok()?)?;

        if rest.is_empty() {
            return Some(ResolvedRef::Result(result));
        }

        let j = rest.strip_prefix(".questions[")?.strip_suffix(']')?;
        result
            .questions
            .get(j.parse::<usize>().ok()?)
            .map(ResolvedRef::Question)
    }
}
