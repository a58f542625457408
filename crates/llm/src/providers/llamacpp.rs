use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{GenerationParams, LlmError, LlmProvider, Message, ModelInfo};

/// Stop sequences for instruction-tuned GGUF models served raw.
const STOP_SEQUENCES: &[&str] = &["<end_of_turn>", "\n\n\n"];

/// llama.cpp server `/completion`. Takes a raw prompt, so chat messages are
/// flattened into one string.
pub struct LlamaCppProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl LlamaCppProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn request_body(&self, messages: &[Message], params: &GenerationParams) -> Value {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        json!({
            "prompt": prompt,
            "n_predict": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "stop": STOP_SEQUENCES,
            "stream": false,
        })
    }
}

#[async_trait]
impl LlmProvider for LlamaCppProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/completion", self.url);
        let body = self.request_body(&messages, params);

        debug!("llama.cpp request to {}", url);

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        resp["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("missing content".into()))
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: "llamacpp".into(),
            model: self.model.clone(),
            endpoint: self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_flatten_into_prompt() {
        let p = LlamaCppProvider::new("http://localhost:8080/".into(), "m.gguf".into());
        let msgs = vec![Message::user("first"), Message::user("second")];
        let body = p.request_body(&msgs, &GenerationParams::default());
        assert_eq!(body["prompt"], "first\n\nsecond");
        assert_eq!(body["n_predict"], 1024);
        assert_eq!(body["stop"][0], "<end_of_turn>");
        assert_eq!(p.describe().endpoint, "http://localhost:8080");
    }
}
