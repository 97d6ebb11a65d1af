//! Gemini `generateContent` client used as the remote [`BookAdvisor`].

use crate::config::AiConfig;
use crate::services::advisor_service::{AdvisorError, BookAdvisor};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            models: config.models.clone(),
        })
    }

    #[must_use]
    pub fn recommend_prompt(mood: &str) -> String {
        format!(
            "I'm feeling {mood}. Recommend 3 books that would suit my mood. \
             For each book, provide just the title and author."
        )
    }

    #[must_use]
    pub fn describe_prompt(title: &str) -> String {
        format!(
            "Give me a brief summary and key information about the book '{title}'. \
             Keep it to 100 words."
        )
    }

    /// Sends `prompt` to each configured model in turn and returns the first answer.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let mut last_error = AdvisorError::NotConfigured;

        for model in &self.models {
            match self.generate_with(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(model = %model, error = %e, "Model failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn generate_with(&self, model: &str, prompt: &str) -> Result<String, AdvisorError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AdvisorError::Request {
                model: model.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Rejected {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| AdvisorError::Request {
            model: model.to_string(),
            message: format!("invalid response body: {e}"),
        })?;

        debug!(model = %model, "Received generation response");
        extract_text(&body).ok_or_else(|| AdvisorError::EmptyResponse {
            model: model.to_string(),
        })
    }
}

/// Pulls the first candidate's first text part out of a `generateContent` response.
fn extract_text(body: &Value) -> Option<String> {
    let first = body.get("candidates")?.as_array()?.first()?;

    if let Some(reason) = first.get("finishReason").and_then(Value::as_str)
        && reason != "STOP"
    {
        warn!(reason, "Generation stopped early");
    }

    let text = first
        .get("content")?
        .get("parts")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()?
        .trim();

    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl BookAdvisor for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn recommend(&self, mood: &str) -> Result<String, AdvisorError> {
        self.generate(&Self::recommend_prompt(mood)).await
    }

    async fn describe(&self, title: &str) -> Result<String, AdvisorError> {
        self.generate(&Self::describe_prompt(title)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "  1. Dune by Frank Herbert \n"}]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(
            extract_text(&body).as_deref(),
            Some("1. Dune by Frank Herbert")
        );
    }

    #[test]
    fn missing_or_blank_text_is_none() {
        assert_eq!(extract_text(&json!({"candidates": []})), None);
        assert_eq!(extract_text(&json!({"promptFeedback": {}})), None);
        let blank = json!({"candidates": [{"content": {"parts": [{"text": "   "}]}}]});
        assert_eq!(extract_text(&blank), None);
    }

    #[test]
    fn prompts_carry_the_user_input() {
        assert!(GeminiClient::recommend_prompt("gloomy").starts_with("I'm feeling gloomy."));
        assert!(GeminiClient::describe_prompt("Dune").contains("the book 'Dune'"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let config = AiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            models: vec!["m1".to_string()],
            request_timeout_seconds: 2,
            ..AiConfig::default()
        };
        let client = GeminiClient::new(&config, "key".to_string()).unwrap();
        let err = client.recommend("happy").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Request { ref model, .. } if model == "m1"));
    }
}
