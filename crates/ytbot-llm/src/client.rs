//! OpenRouter HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use ytbot_models::Script;

use crate::error::{LlmError, LlmResult};
use crate::prompt::{build_prompt, parse_script, SYSTEM_PROMPT};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::ScriptGenerator;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODELS: [&str; 2] = ["mistralai/mistral-7b-instruct", "mistralai/mistral-small"];

/// Configuration for the LLM client.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// API base URL (without `/chat/completions`)
    pub base_url: String,
    pub api_key: Option<String>,
    /// Models tried in order until one returns a usable script
    pub models: Vec<String>,
    /// Number of scenes requested
    pub scene_count: usize,
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            scene_count: 5,
            temperature: 0.8,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LlmClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            models: std::env::var("OPENROUTER_MODELS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.models),
            scene_count: std::env::var("YTBOT_SCENE_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scene_count),
            temperature: defaults.temperature,
            timeout: Duration::from_secs(
                std::env::var("OPENROUTER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// Script writer backed by OpenRouter (or any OpenAI-compatible endpoint).
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    config: LlmClientConfig,
}

impl OpenRouterClient {
    /// Create a new client. Fails when no API key is configured.
    pub fn new(config: LlmClientConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(LlmError::MissingApiKey("OPENROUTER_API_KEY"))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> LlmResult<Self> {
        Self::new(LlmClientConfig::from_env())
    }

    pub fn config(&self) -> &LlmClientConfig {
        &self.config
    }

    /// Send a single chat completion and return the reply text.
    async fn complete(&self, model: &str, prompt: &str) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat::json_object()),
        };

        debug!("Sending chat completion to {} (model {})", url, model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "YT_BOT")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.first_text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::invalid_response("No content in chat response"))
    }
}

/// One request per model; retrying a transient failure of the whole call is
/// left to the caller.
#[async_trait]
impl ScriptGenerator for OpenRouterClient {
    async fn generate_script(&self, topic: &str) -> LlmResult<Script> {
        let prompt = build_prompt(topic, self.config.scene_count);
        let mut last_error = None;

        for model in &self.config.models {
            info!("Generating script with model: {}", model);
            let reply = match self.complete(model, &prompt).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                    continue;
                }
            };

            match parse_script(&reply, topic) {
                Ok(script) => {
                    info!(
                        "Got script from {}: {} scenes, ~{:.0}s",
                        model,
                        script.scenes.len(),
                        script.estimated_duration_secs()
                    );
                    return Ok(script);
                }
                Err(e) => {
                    warn!("Model {} returned an unusable script: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::invalid_response("No models configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, models: &[&str]) -> LlmClientConfig {
        LlmClientConfig {
            base_url: server.uri(),
            api_key: Some("test-key".to_string()),
            models: models.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    fn chat_reply(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    const SCRIPT: &str = r#"{"title": "Bees", "scenes": [{"narration": "Bees dance.", "search_terms": ["bee hive"]}]}"#;

    #[test]
    fn test_config_defaults() {
        let config = LlmClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.scene_count, 5);
    }

    #[test]
    fn test_missing_api_key() {
        let result = OpenRouterClient::new(LlmClientConfig::default());
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[tokio::test]
    async fn test_generate_script() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(SCRIPT)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(config_for(&server, &["m1"])).unwrap();
        let script = client.generate_script("Honey bees").await.unwrap();

        assert_eq!(script.title, "Bees");
        assert_eq!(script.scenes[0].search_terms, vec!["bee hive".to_string()]);
        assert_eq!(script.tags, vec!["AI".to_string(), "Automation".to_string()]);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(json!({ "model": "broken" })))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(json!({ "model": "working" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(SCRIPT)))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(config_for(&server, &["broken", "working"])).unwrap();
        let script = client.generate_script("Honey bees").await.unwrap();
        assert_eq!(script.scenes.len(), 1);
    }

    #[tokio::test]
    async fn test_all_models_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no credits"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(config_for(&server, &["a", "b"])).unwrap();
        let err = client.generate_script("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_outage_sends_one_request_per_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(config_for(&server, &["model-a", "model-b"])).unwrap();
        let err = client.generate_script("Tides").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unusable_script_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"scenes": []}"#)),
            )
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(config_for(&server, &["a"])).unwrap();
        let err = client.generate_script("x").await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidScript(_)));
    }
}
