use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub chunking: ChunkingConfig,
    pub selection: SelectionConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
    pub tokenizer: TokenizerConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub llamacpp: LlamaCppConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &[
    "LLM_PROVIDER",
    "OPENAI_API_KEY",
    "OLLAMA_URL",
    "LLAMACPP_URL",
    "MCQ_OUTPUT_DIR",
];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `MCQGEN_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("MCQGEN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            chunking: ChunkingConfig::from_env_profiled(p),
            selection: SelectionConfig::from_env_profiled(p),
            batch: BatchConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            tokenizer: TokenizerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            llamacpp: LlamaCppConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        if self.batch.max_files == 0 {
            return Err(ConfigError::ZeroMaxFiles);
        }
        match self.llm.provider.as_str() {
            "ollama" | "openai" | "llamacpp" => {}
            other => {
                return Err(ConfigError::UnknownValue {
                    field: "LLM_PROVIDER",
                    value: other.to_string(),
                })
            }
        }
        match self.tokenizer.kind.as_str() {
            "cl100k" | "char" => {}
            other => {
                return Err(ConfigError::UnknownValue {
                    field: "TOKENIZER",
                    value: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  chunking:    size={}, overlap={}, questions_per_pdf={}",
            self.chunking.chunk_size,
            self.chunking.overlap,
            self.chunking.questions_per_pdf
        );
        tracing::info!(
            "  selection:   min_gap={}, seed={}",
            self.selection.min_gap,
            self.selection
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(entropy)".into())
        );
        tracing::info!(
            "  batch:       max_files={}, max_file_bytes={}",
            self.batch.max_files,
            self.batch.max_file_bytes
        );
        tracing::info!("  storage:     output_dir={}", self.storage.output_dir.display());
        tracing::info!("  tokenizer:   {}", self.tokenizer.kind);
        tracing::info!(
            "  llm:         provider={}, max_tokens={}, timeout={}s",
            self.llm.provider,
            self.llm.max_tokens,
            self.llm.timeout_secs
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "chunking": self.chunking,
            "selection": self.selection,
            "batch": self.batch,
            "storage": { "output_dir": self.storage.output_dir },
            "tokenizer": self.tokenizer.kind,
            "llm": {
                "provider": self.llm.provider,
                "model": self.llm.model_label(self),
                "configured": self.llm.is_configured(),
                "temperature": self.llm.temperature,
                "max_tokens": self.llm.max_tokens,
                "strict_validation": self.llm.strict_validation,
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
            "llamacpp": { "url": self.llamacpp.url },
        })
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Tokens carried from the end of one chunk into the next.
    pub overlap: usize,
    /// Questions requested per document (one chunk per question).
    pub questions_per_pdf: usize,
    /// Questions requested from the model per chunk.
    pub questions_per_chunk: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
            questions_per_pdf: 10,
            questions_per_chunk: 1,
        }
    }
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            chunk_size: profiled_env_parse(p, "CHUNK_SIZE", d.chunk_size),
            overlap: profiled_env_parse(p, "CHUNK_OVERLAP", d.overlap),
            questions_per_pdf: profiled_env_parse(p, "QUESTIONS_PER_PDF", d.questions_per_pdf),
            questions_per_chunk: profiled_env_parse(
                p,
                "QUESTIONS_PER_CHUNK",
                d.questions_per_chunk,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

// ── Selection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Initial minimum index distance between selected chunks.
    pub min_gap: usize,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { min_gap: 3, seed: None }
    }
}

impl SelectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            min_gap: profiled_env_parse(p, "SELECTION_MIN_GAP", 3usize).max(1),
            seed: profiled_env_opt(p, "SELECTION_SEED").and_then(|v| v.parse().ok()),
        }
    }
}

// ── Batch input limits ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_files: usize,
    pub max_file_bytes: u64,
    /// Lowercase extensions without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_files: 3,
            max_file_bytes: 16 * 1024 * 1024,
            allowed_extensions: vec!["pdf".to_string()],
        }
    }
}

impl BatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        let allowed_extensions = profiled_env_opt(p, "ALLOWED_EXTENSIONS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or(d.allowed_extensions);
        Self {
            max_files: profiled_env_parse(p, "MAX_FILES", d.max_files),
            max_file_bytes: profiled_env_parse(p, "MAX_FILE_BYTES", d.max_file_bytes),
            allowed_extensions,
        }
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self
                .allowed_extensions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_mcq"),
        }
    }
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            output_dir: PathBuf::from(profiled_env_or(p, "MCQ_OUTPUT_DIR", "generated_mcq")),
        }
    }
}

// ── Tokenizer ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// "cl100k" or "char"
    pub kind: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: "cl100k".to_string(),
        }
    }
}

impl TokenizerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            kind: profiled_env_or(p, "TOKENIZER", "cl100k").to_lowercase(),
        }
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "openai", "llamacpp"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Per-chunk deadline for one generation call.
    pub timeout_secs: u64,
    /// Fail a chunk when any decoded question has a defective shape.
    pub strict_validation: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 1024,
            timeout_secs: 300,
            strict_validation: false,
        }
    }
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", &d.provider).to_lowercase(),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", &d.openai_model),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", d.temperature),
            top_p: profiled_env_parse(p, "LLM_TOP_P", d.top_p),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", d.max_tokens),
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", d.timeout_secs),
            strict_validation: profiled_env_bool(p, "MCQ_STRICT_VALIDATION", false),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some() || self.openai_base_url.is_some(),
            "ollama" | "llamacpp" => true,
            _ => false,
        }
    }

    /// Model name of the selected provider.
    pub fn model_label<'a>(&'a self, config: &'a Config) -> &'a str {
        match self.provider.as_str() {
            "openai" => &self.openai_model,
            "ollama" => &config.ollama.model,
            "llamacpp" => &config.llamacpp.model,
            _ => "",
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "gemma3:4b".to_string(),
        }
    }
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", &d.url),
            model: profiled_env_or(p, "OLLAMA_MODEL", &d.model),
        }
    }
}

// ── llama.cpp server (quantized GGUF models) ──────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlamaCppConfig {
    pub url: String,
    /// Label reported by model info; the server decides which model runs.
    pub model: String,
}

impl Default for LlamaCppConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            model: "gemma-3-4b-it-Q4_0.gguf".to_string(),
        }
    }
}

impl LlamaCppConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            url: profiled_env_or(p, "LLAMACPP_URL", &d.url),
            model: profiled_env_or(p, "LLAMACPP_MODEL", &d.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn overlap_must_be_below_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 100;
        config.chunking.overlap = 100;
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge {
                chunk_size: 100,
                overlap: 100
            })
        );
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        config.chunking.overlap = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = Config::default();
        config.llm.provider = "carrier-pigeon".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownValue { field: "LLM_PROVIDER", .. })
        ));
    }

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        env::set_var("CFGTESTA_CHUNK_SIZE", "640");
        env::set_var("CFGTESTA_ALLOWED_EXTENSIONS", "pdf, .TXT");
        let config = Config::for_profile("cfgtesta");
        assert_eq!(config.profile, "CFGTESTA");
        assert_eq!(config.chunking.chunk_size, 640);
        assert_eq!(config.batch.allowed_extensions, vec!["pdf", "txt"]);
        env::remove_var("CFGTESTA_CHUNK_SIZE");
        env::remove_var("CFGTESTA_ALLOWED_EXTENSIONS");
    }

    #[test]
    fn allowed_extension_check_is_case_insensitive() {
        let batch = BatchConfig::default();
        assert!(batch.is_allowed("Report.PDF"));
        assert!(!batch.is_allowed("notes.txt"));
        assert!(!batch.is_allowed("no_extension"));
    }

    #[test]
    fn redacted_summary_has_no_api_key() {
        let mut config = Config::default();
        config.llm.provider = "openai".into();
        config.llm.openai_api_key = Some("sk-secret".into());
        let summary = config.redacted_summary().to_string();
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("gpt-4o-mini"));
    }
}
