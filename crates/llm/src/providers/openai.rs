use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{GenerationParams, LlmError, LlmProvider, Message, ModelInfo};

/// OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_body(&self, messages: &[Message], params: &GenerationParams) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_tokens": params.max_tokens,
        })
    }
}

fn extract_content(resp: &Value) -> Result<String, LlmError> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(&messages, params);

        debug!("OpenAI request to {}", url);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        // Local OpenAI-compatible servers often run without a key.
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request.json(&body).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        extract_content(&resp)
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: "openai".into(),
            model: self.model.clone(),
            endpoint: self.base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_sampling_params() {
        let p = OpenAiProvider::new(None, "gpt-4o-mini".into(), "http://x/".into());
        let params = GenerationParams {
            temperature: 0.5,
            top_p: 0.75,
            max_tokens: 256,
        };
        let body = p.request_body(&[Message::user("hi")], &params);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["top_p"], 0.75);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(p.describe().endpoint, "http://x");
    }

    #[test]
    fn content_extraction() {
        let ok = json!({"choices": [{"message": {"content": "{}"}}]});
        assert_eq!(extract_content(&ok).unwrap(), "{}");
        assert!(matches!(
            extract_content(&json!({"choices": []})),
            Err(LlmError::ParseError(_))
        ));
    }
}
