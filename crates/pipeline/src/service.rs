use std::sync::{Arc, Mutex};

use mcqgen_core::config::ChunkingConfig;
use mcqgen_core::{
    aggregate, BatchReport, Chunk, ChunkId, Config, DocumentReport, FlattenedQuestion, McqError,
};
use mcqgen_ingest::{extract_text, segment, tokenizer, ChunkConfig, ChunkSelector, Tokenizer};
use mcqgen_llm::{LlmError, McqGenerator, ModelInfo};
use mcqgen_storage::{McqStore, RecordParams};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::request::{validate_files, BatchRequest, InputFile};

const NO_TEXT: &str = "No text could be extracted from PDF";

/// Whether the generator exists yet, and what it talks to.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub profile: String,
    #[serde(flatten)]
    pub model: ModelInfo,
}

/// Segmentation and selection of one document, without generation.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub filename: String,
    pub total_chunks: usize,
    pub selected: Vec<ChunkId>,
    pub chunks: Vec<Chunk>,
}

/// Where a document sits in its batch, for the stored record.
#[derive(Debug, Clone, Copy)]
struct BatchPosition {
    file_index: usize,
    total_files: usize,
}

/// Owns everything a batch needs: config, tokenizer, selector, record
/// store, and the generator.
///
/// The generator is built on first use and then reused. Documents and chunks
/// are processed one at a time, so it is never called concurrently.
pub struct McqService {
    config: Config,
    tokenizer: Arc<dyn Tokenizer>,
    selector: Mutex<ChunkSelector>,
    store: McqStore,
    generator: OnceCell<McqGenerator>,
}

impl McqService {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        Self::build(config, None)
    }

    /// Service with a ready-made generator (e.g. a custom provider).
    pub fn with_generator(config: Config, generator: McqGenerator) -> Result<Self, PipelineError> {
        Self::build(config, Some(generator))
    }

    fn build(config: Config, generator: Option<McqGenerator>) -> Result<Self, PipelineError> {
        config.validate()?;
        let tokenizer = tokenizer::from_name(&config.tokenizer.kind)?;
        let store = McqStore::new(&config.storage.output_dir)?;
        let selector = ChunkSelector::from_config(&config.selection);
        Ok(Self {
            config,
            tokenizer,
            selector: Mutex::new(selector),
            store,
            generator: OnceCell::new_with(generator),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &McqStore {
        &self.store
    }

    async fn generator(&self) -> Result<&McqGenerator, LlmError> {
        self.generator
            .get_or_try_init(|| async {
                info!("Initializing MCQ generator...");
                McqGenerator::from_config(&self.config)
            })
            .await
    }

    /// Describe the model; reports `loaded = false` until the first batch.
    pub fn model_info(&self) -> ModelStatus {
        let model = match self.generator.get() {
            Some(gen) => gen.describe(),
            None => {
                let endpoint = match self.config.llm.provider.as_str() {
                    "ollama" => self.config.ollama.url.clone(),
                    "llamacpp" => self.config.llamacpp.url.clone(),
                    _ => self
                        .config
                        .llm
                        .openai_base_url
                        .clone()
                        .unwrap_or_else(|| "https://api.openai.com".to_string()),
                };
                ModelInfo {
                    provider: self.config.llm.provider.clone(),
                    model: self.config.llm.model_label(&self.config).to_string(),
                    endpoint,
                }
            }
        };
        ModelStatus {
            loaded: self.generator.initialized(),
            profile: self.config.profile_label().to_string(),
            model,
        }
    }

    fn resolve_chunking(&self, request: &BatchRequest) -> Result<ChunkingConfig, PipelineError> {
        let base = &self.config.chunking;
        let chunking = ChunkingConfig {
            chunk_size: request.chunk_size.unwrap_or(base.chunk_size),
            overlap: request.overlap.unwrap_or(base.overlap),
            questions_per_pdf: request.questions_per_pdf.unwrap_or(base.questions_per_pdf),
            questions_per_chunk: base.questions_per_chunk,
        };
        chunking.validate()?;
        Ok(chunking)
    }

    /// Process every document of a request, in order.
    ///
    /// The request is rejected as a whole if any file fails validation.
    /// After that, a document that yields no text is reported as failed and
    /// the batch carries on.
    pub async fn generate_batch(&self, request: BatchRequest) -> Result<BatchReport, PipelineError> {
        validate_files(&self.config.batch, &request.files)?;
        let chunking = self.resolve_chunking(&request)?;
        self.generator().await?;

        let total_files = request.files.len();
        info!(total_files, "Processing batch");

        let mut file_results = Vec::with_capacity(total_files);
        let mut all_questions = Vec::new();

        for (idx, file) in request.files.iter().enumerate() {
            info!("Processing file {}/{}: {}", idx + 1, total_files, file.filename);
            let position = BatchPosition {
                file_index: idx + 1,
                total_files,
            };
            let (report, questions) = self.process_document(file, &chunking, position).await?;
            file_results.push(report);
            all_questions.extend(questions);
        }

        let total_questions: usize = file_results.iter().map(|r| r.total_questions).sum();
        info!(
            total_questions,
            "Batch complete: {} files processed", total_files
        );

        Ok(BatchReport {
            success: true,
            total_files,
            total_questions,
            questions_per_pdf: chunking.questions_per_pdf,
            chunk_size: chunking.chunk_size,
            overlap: chunking.overlap,
            file_results,
            all_questions,
        })
    }

    async fn process_document(
        &self,
        file: &InputFile,
        chunking: &ChunkingConfig,
        position: BatchPosition,
    ) -> Result<(DocumentReport, Vec<FlattenedQuestion>), PipelineError> {
        let text = match extract_text(&file.bytes, &file.filename) {
            Ok(doc) if !doc.is_blank() => {
                info!(
                    filename = %file.filename,
                    "Extracted {} characters",
                    doc.total_chars()
                );
                doc.full_text()
            }
            Ok(_) => return Ok(extraction_failed(&file.filename, NO_TEXT)),
            Err(e) => return Ok(extraction_failed(&file.filename, &e.to_string())),
        };

        self.run_text(&file.filename, &text, chunking, Some(position))
            .await
    }

    /// Run one already-extracted text through the pipeline with the
    /// configured chunking, outside of any batch.
    pub async fn process_text(
        &self,
        filename: &str,
        text: &str,
    ) -> Result<(DocumentReport, Vec<FlattenedQuestion>), PipelineError> {
        let chunking = self.config.chunking.clone();
        self.generator().await?;
        self.run_text(filename, text, &chunking, None).await
    }

    /// Segment, select, generate, aggregate and store one document's text.
    async fn run_text(
        &self,
        filename: &str,
        text: &str,
        chunking: &ChunkingConfig,
        position: Option<BatchPosition>,
    ) -> Result<(DocumentReport, Vec<FlattenedQuestion>), PipelineError> {
        let chunks = segment(text, self.tokenizer.as_ref(), &ChunkConfig::from(chunking));
        if chunks.is_empty() {
            return Ok(extraction_failed(filename, NO_TEXT));
        }

        let selected = self.select(&chunks, chunking.questions_per_pdf);
        info!(
            filename = %filename,
            "Selected {} chunks from {}",
            selected.len(),
            chunks.len()
        );

        let generator = self.generator().await?;
        let results = generator
            .generate_many(&selected, filename, chunking.questions_per_chunk)
            .await;

        let total_chunks = chunks.len();
        let (mut report, questions) = aggregate(filename, total_chunks, results);

        let params = RecordParams {
            chunk_size: Some(chunking.chunk_size),
            overlap: Some(chunking.overlap),
            questions_per_pdf: Some(chunking.questions_per_pdf),
            selected_chunks: Some(selected.len()),
            file_index: position.map(|p| p.file_index),
            total_files: position.map(|p| p.total_files),
        };
        match self
            .store
            .save(filename, chunks, report.results.clone(), params)
        {
            Ok(key) => report.saved_file = Some(key),
            Err(e) => {
                let err = McqError::Storage(e.to_string());
                error!(filename = %filename, "Failed to save MCQs: {}", err);
                report.save_failed(&err);
            }
        }

        Ok((report, questions))
    }

    fn select(&self, chunks: &[Chunk], wanted: usize) -> Vec<Chunk> {
        let mut selector = self
            .selector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        selector.select(chunks, wanted)
    }

    /// Segment and select without calling the model.
    pub fn preview_chunks(&self, file: &InputFile) -> Result<ChunkPreview, PipelineError> {
        let doc = extract_text(&file.bytes, &file.filename)?;
        let chunking = &self.config.chunking;
        let chunks = segment(
            &doc.full_text(),
            self.tokenizer.as_ref(),
            &ChunkConfig::from(chunking),
        );
        let selected = self
            .select(&chunks, chunking.questions_per_pdf)
            .iter()
            .map(|c| c.id)
            .collect();
        Ok(ChunkPreview {
            filename: file.filename.clone(),
            total_chunks: chunks.len(),
            selected,
            chunks,
        })
    }
}

fn extraction_failed(filename: &str, reason: &str) -> (DocumentReport, Vec<FlattenedQuestion>) {
    let err = McqError::Extraction {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };
    warn!(filename = %filename, "Extraction failed: {}", err);
    (DocumentReport::failed(filename, &err), Vec::new())
}
