use std::time::Duration;

use mcqgen_core::{Chunk, CompletionOutcome, Config, FailureKind, GenerationResult};
use tracing::{debug, info, warn};

use crate::parser::parse_completion;
use crate::prompt::build_prompt;
use crate::provider::{GenerationParams, LlmError, LlmProvider, Message, ModelInfo};
use crate::providers::create_provider;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Turns chunks into question records through one model provider.
///
/// Generation never returns an error: provider failures, timeouts and
/// unparseable completions all become failed outcomes on the chunk.
pub struct McqGenerator {
    provider: Box<dyn LlmProvider>,
    params: GenerationParams,
    timeout: Duration,
    strict: bool,
}

impl McqGenerator {
    pub fn new(provider: Box<dyn LlmProvider>, params: GenerationParams) -> Self {
        Self {
            provider,
            params,
            timeout: DEFAULT_TIMEOUT,
            strict: false,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = create_provider(config)?;
        Ok(Self::new(provider, GenerationParams::from(&config.llm))
            .with_timeout(Duration::from_secs(config.llm.timeout_secs))
            .with_strict_validation(config.llm.strict_validation))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fail a chunk with [`FailureKind::InvalidQuestion`] when any decoded
    /// question is not a well-formed four-option MCQ.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn describe(&self) -> ModelInfo {
        self.provider.describe()
    }

    /// Generate `question_count` questions from one piece of text.
    pub async fn generate(&self, chunk_text: &str, question_count: usize) -> CompletionOutcome {
        let prompt = build_prompt(chunk_text, question_count);
        let messages = vec![Message::user(prompt)];

        info!(
            "Generating MCQ for chunk with {} characters...",
            chunk_text.chars().count()
        );

        let call = self.provider.complete(messages, &self.params);
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("MCQ generation failed: {}", e);
                return CompletionOutcome::failed(
                    FailureKind::GenerationFailure,
                    format!("Generation error: {e}"),
                    "",
                );
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "MCQ generation timed out");
                return CompletionOutcome::failed(
                    FailureKind::Timeout,
                    format!("Generation timed out after {:?}", self.timeout),
                    "",
                );
            }
        };

        debug!("Generated response: {} characters", raw.len());

        let outcome = parse_completion(&raw);
        if self.strict && outcome.success {
            for (i, q) in outcome.questions.iter().enumerate() {
                if let Err(defect) = q.validate() {
                    return CompletionOutcome::failed(
                        FailureKind::InvalidQuestion,
                        format!("Invalid question {i}: {defect}"),
                        outcome.raw_response,
                    );
                }
            }
        }
        outcome
    }

    /// Generate for one chunk and attach its provenance.
    pub async fn generate_for_chunk(
        &self,
        chunk: &Chunk,
        filename: &str,
        question_count: usize,
    ) -> GenerationResult {
        let outcome = self.generate(&chunk.text, question_count).await;
        GenerationResult::from_outcome(outcome, chunk, filename)
    }

    /// Generate for each chunk in turn, one call at a time, in input order.
    pub async fn generate_many(
        &self,
        chunks: &[Chunk],
        filename: &str,
        questions_per_chunk: usize,
    ) -> Vec<GenerationResult> {
        let mut results = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            info!("Processing chunk {}/{}", i + 1, chunks.len());
            let result = self
                .generate_for_chunk(chunk, filename, questions_per_chunk)
                .await;

            if result.success {
                info!(
                    "Successfully generated {} questions for chunk {}",
                    result.questions.len(),
                    i + 1
                );
            } else {
                warn!(
                    "Failed to generate questions for chunk {}: {}",
                    i + 1,
                    result.error.as_deref().unwrap_or("Unknown error")
                );
            }
            results.push(result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    const GOOD: &str = r#"{"questions":[{"question":"Q?","options":{"A":"a","B":"b","C":"c","D":"d"},"correct_answer":"C","explanation":"e"}]}"#;

    /// Replays canned responses and records the prompts it was given.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: std::sync::Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Default::default(),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _params: &GenerationParams,
        ) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        fn describe(&self) -> ModelInfo {
            ModelInfo {
                provider: "scripted".into(),
                model: "test".into(),
                endpoint: "memory".into(),
            }
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(&self, _: Vec<Message>, _: &GenerationParams) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(GOOD.into())
        }

        fn describe(&self) -> ModelInfo {
            ModelInfo {
                provider: "slow".into(),
                model: "test".into(),
                endpoint: "memory".into(),
            }
        }
    }

    fn generator(responses: Vec<Result<String, LlmError>>) -> McqGenerator {
        McqGenerator::new(
            Box::new(ScriptedProvider::new(responses)),
            GenerationParams::default(),
        )
    }

    fn chunk(id: usize, text: &str) -> Chunk {
        Chunk {
            id,
            text: text.into(),
            token_count: 3,
            start_sentence: 0,
        }
    }

    #[tokio::test]
    async fn successful_completion() {
        let out = generator(vec![Ok(GOOD.into())]).generate("text", 1).await;
        assert!(out.success);
        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.raw_response, GOOD);
    }

    #[tokio::test]
    async fn prompt_carries_chunk_text() {
        let provider = ScriptedProvider::new(vec![Ok(GOOD.into())]);
        let prompts = provider.prompts.clone();
        let gen = McqGenerator::new(Box::new(provider), GenerationParams::default());
        gen.generate("Photosynthesis needs light.", 2).await;
        let seen = prompts.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("Photosynthesis needs light."));
        assert!(seen[0].contains("create 2 high-quality"));
    }

    #[tokio::test]
    async fn provider_error_becomes_generation_failure() {
        let err = LlmError::ApiError {
            status: 503,
            body: "overloaded".into(),
        };
        let out = generator(vec![Err(err)]).generate("text", 1).await;
        assert!(!out.success);
        assert_eq!(out.error_kind, Some(FailureKind::GenerationFailure));
        assert!(out.error.unwrap().starts_with("Generation error: "));
        assert_eq!(out.raw_response, "");
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let gen = McqGenerator::new(Box::new(SlowProvider), GenerationParams::default())
            .with_timeout(Duration::from_millis(20));
        let out = gen.generate("text", 1).await;
        assert!(!out.success);
        assert_eq!(out.error_kind, Some(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn strict_validation_rejects_bad_answer() {
        let bad = GOOD.replace(r#""correct_answer":"C""#, r#""correct_answer":"Z""#);

        let lenient = generator(vec![Ok(bad.clone())]).generate("t", 1).await;
        assert!(lenient.success);

        let strict = generator(vec![Ok(bad.clone())])
            .with_strict_validation(true)
            .generate("t", 1)
            .await;
        assert!(!strict.success);
        assert_eq!(strict.error_kind, Some(FailureKind::InvalidQuestion));
        assert_eq!(strict.raw_response, bad);
    }

    #[tokio::test]
    async fn many_keeps_input_order_and_provenance() {
        let gen = generator(vec![
            Ok(GOOD.into()),
            Ok("no json here".into()),
            Ok(GOOD.into()),
        ]);
        let chunks = vec![chunk(7, "seven"), chunk(2, "two"), chunk(5, "five")];
        let results = gen.generate_many(&chunks, "notes.pdf", 1).await;

        let ids: Vec<_> = results.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, vec![7, 2, 5]);
        assert!(results[0].success);
        assert_eq!(results[1].error_kind, Some(FailureKind::NoJsonFound));
        assert_eq!(results[1].chunk_text, "two");
        assert!(results.iter().all(|r| r.filename == "notes.pdf"));
        assert!(results.iter().all(|r| r.chunk_tokens == 3));
    }
}
