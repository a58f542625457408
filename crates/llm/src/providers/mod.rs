pub mod llamacpp;
pub mod ollama;
pub mod openai;

use mcqgen_core::Config;

use crate::provider::{LlmError, LlmProvider};

/// Create the appropriate LLM provider based on config.
pub fn create_provider(config: &Config) -> Result<Box<dyn LlmProvider>, LlmError> {
    let llm = &config.llm;
    match llm.provider.as_str() {
        "openai" => {
            if !llm.is_configured() {
                return Err(LlmError::NotConfigured(
                    "OPENAI_API_KEY or OPENAI_BASE_URL must be set".into(),
                ));
            }
            let base_url = llm
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Box::new(openai::OpenAiProvider::new(
                llm.openai_api_key.clone(),
                llm.openai_model.clone(),
                base_url.to_string(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            config.ollama.url.clone(),
            config.ollama.model.clone(),
        ))),
        "llamacpp" => Ok(Box::new(llamacpp::LlamaCppProvider::new(
            config.llamacpp.url.clone(),
            config.llamacpp.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
