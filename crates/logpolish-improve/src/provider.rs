//! LLM provider abstraction for log message rewriting.
//!
//! Supports Anthropic (Claude), Google (Gemini), and GitHub Copilot chat APIs.
//! Uses blocking HTTP via `ureq`; the tool runs one request at a time.

use logpolish_core::config::{ClaudeConfig, CopilotConfig, GeminiConfig};
use logpolish_core::{Credentials, PolishConfig, ProviderKind};
use serde_json::Value;
use std::time::Duration;

/// Errors from LLM provider construction and calls.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("empty response from LLM")]
    EmptyResponse,
    #[error("unknown provider: '{name}'. Available: {available}")]
    UnknownProvider { name: String, available: String },
    #[error("{0} environment variable not set")]
    MissingCredential(String),
    #[error("provider '{0}' is not available in this build (enable the `{0}` feature)")]
    Unavailable(&'static str),
}

/// A completed LLM response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// The text content of the response.
    pub text: String,
    /// Input tokens used (from API response, if reported).
    pub input_tokens: Option<u64>,
    /// Output tokens used (from API response, if reported).
    pub output_tokens: Option<u64>,
}

/// Abstraction over text-generation APIs.
pub trait LlmProvider: Send {
    /// Send a single-turn prompt and return the generated text.
    fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError>;

    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// The model name (for display/logging).
    fn model_name(&self) -> &str;
}

fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::config::Config::builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .http_status_as_error(false)
            .build(),
    )
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Read the body of a response as JSON, turning non-2xx statuses and
/// in-band `error` objects into [`ProviderError::Api`].
fn read_response(mut response: ureq::http::Response<ureq::Body>) -> Result<Value, ProviderError> {
    let status = response.status();
    let json: Result<Value, _> = response.body_mut().read_json();

    if !status.is_success() {
        let message = json
            .ok()
            .as_ref()
            .and_then(api_error_message)
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| "request failed".to_string());
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let json = json.map_err(|e| ProviderError::Parse(e.to_string()))?;

    if let Some(message) = api_error_message(&json) {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(json)
}

fn api_error_message(json: &Value) -> Option<String> {
    let err = json.get("error")?;
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| err.as_str())
        .unwrap_or("unknown error");
    Some(message.to_string())
}

fn usage_field(json: &Value, section: &str, field: &str) -> Option<u64> {
    json.get(section)
        .and_then(|u| u.get(field))
        .and_then(Value::as_u64)
}

// ---------------------------------------------------------------------------
// Anthropic Messages API
// ---------------------------------------------------------------------------

/// Claude provider using the Anthropic Messages API.
#[cfg(feature = "claude")]
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    url: String,
    agent: ureq::Agent,
}

#[cfg(feature = "claude")]
impl ClaudeProvider {
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: String, config: &ClaudeConfig) -> Self {
        Self::with_agent(api_key, config, build_agent(config.timeout_secs))
    }

    fn with_agent(api_key: String, config: &ClaudeConfig, agent: ureq::Agent) -> Self {
        Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            url: join_url(&config.base_url, "/v1/messages"),
            agent,
        }
    }
}

/// Extract the first text block of a Messages API response.
#[cfg(feature = "claude")]
fn claude_text(json: &Value) -> Option<&str> {
    json.get("content")
        .and_then(Value::as_array)
        .and_then(|arr| {
            arr.iter().find_map(|block| block.get("text").and_then(Value::as_str))
        })
}

#[cfg(feature = "claude")]
impl LlmProvider for ClaudeProvider {
    fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .agent
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .send_json(&body)
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let json = read_response(response)?;
        let text = claude_text(&json)
            .ok_or(ProviderError::EmptyResponse)?
            .to_string();

        Ok(LlmResponse {
            text,
            input_tokens: usage_field(&json, "usage", "input_tokens"),
            output_tokens: usage_field(&json, "usage", "output_tokens"),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Google Generative Language API
// ---------------------------------------------------------------------------

/// Gemini provider using the `generateContent` endpoint.
#[cfg(feature = "gemini")]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    url: String,
    agent: ureq::Agent,
}

#[cfg(feature = "gemini")]
impl GeminiProvider {
    pub fn new(api_key: String, config: &GeminiConfig) -> Self {
        Self::with_agent(api_key, config, build_agent(config.timeout_secs))
    }

    fn with_agent(api_key: String, config: &GeminiConfig, agent: ureq::Agent) -> Self {
        let path = format!("/v1beta/models/{}:generateContent", config.model);
        Self {
            api_key,
            model: config.model.clone(),
            url: join_url(&config.base_url, &path),
            agent,
        }
    }
}

/// Concatenate the text parts of the first candidate.
#[cfg(feature = "gemini")]
fn gemini_text(json: &Value) -> Option<String> {
    let parts = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

#[cfg(feature = "gemini")]
impl LlmProvider for GeminiProvider {
    fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError> {
        let body = serde_json::json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ]
        });

        let response = self
            .agent
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .send_json(&body)
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let json = read_response(response)?;
        let text = gemini_text(&json).ok_or(ProviderError::EmptyResponse)?;

        Ok(LlmResponse {
            text,
            input_tokens: usage_field(&json, "usageMetadata", "promptTokenCount"),
            output_tokens: usage_field(&json, "usageMetadata", "candidatesTokenCount"),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// GitHub Copilot chat completions
// ---------------------------------------------------------------------------

/// GitHub Copilot provider using the OpenAI-style chat completions endpoint.
#[cfg(feature = "copilot")]
pub struct CopilotProvider {
    token: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    editor_version: String,
    editor_plugin_version: String,
    url: String,
    agent: ureq::Agent,
}

#[cfg(feature = "copilot")]
impl CopilotProvider {
    const SYSTEM_PROMPT: &'static str = "You are a helpful assistant that improves log messages.";

    pub fn new(token: String, config: &CopilotConfig) -> Self {
        Self::with_agent(token, config, build_agent(config.timeout_secs))
    }

    fn with_agent(token: String, config: &CopilotConfig, agent: ureq::Agent) -> Self {
        Self {
            token,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            editor_version: config.editor_version.clone(),
            editor_plugin_version: config.editor_plugin_version.clone(),
            url: join_url(&config.base_url, "/chat/completions"),
            agent,
        }
    }
}

/// Extract `choices[0].message.content`.
#[cfg(feature = "copilot")]
fn copilot_text(json: &Value) -> Option<&str> {
    json.get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
}

#[cfg(feature = "copilot")]
impl LlmProvider for CopilotProvider {
    fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError> {
        let body = serde_json::json!({
            "messages": [
                {"role": "system", "content": Self::SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let response = self
            .agent
            .post(&self.url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Editor-Version", &self.editor_version)
            .header("Editor-Plugin-Version", &self.editor_plugin_version)
            .send_json(&body)
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let json = read_response(response)?;
        let text = copilot_text(&json)
            .ok_or(ProviderError::EmptyResponse)?
            .to_string();

        Ok(LlmResponse {
            text,
            input_tokens: usage_field(&json, "usage", "prompt_tokens"),
            output_tokens: usage_field(&json, "usage", "completion_tokens"),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Copilot
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Create a provider from its command-line identifier.
///
/// Fails if the identifier is unknown, its credential is unset, or the
/// provider was compiled out.
pub fn create_provider(
    provider_name: &str,
    credentials: &Credentials,
    config: &PolishConfig,
) -> Result<Box<dyn LlmProvider>, ProviderError> {
    let kind: ProviderKind = provider_name
        .parse()
        .map_err(|_| ProviderError::UnknownProvider {
            name: provider_name.to_string(),
            available: available_providers().join(", "),
        })?;

    let api_key = credentials
        .get(kind)
        .ok_or_else(|| ProviderError::MissingCredential(kind.credential_vars().join(" or ")))?
        .to_string();

    match kind {
        #[cfg(feature = "claude")]
        ProviderKind::Claude => Ok(Box::new(ClaudeProvider::new(api_key, &config.claude))),
        #[cfg(feature = "gemini")]
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(api_key, &config.gemini))),
        #[cfg(feature = "copilot")]
        ProviderKind::Copilot => Ok(Box::new(CopilotProvider::new(api_key, &config.copilot))),
        #[allow(unreachable_patterns)]
        other => {
            let _ = (api_key, config);
            Err(ProviderError::Unavailable(other.as_str()))
        }
    }
}

/// List compiled-in provider names.
pub fn available_providers() -> Vec<&'static str> {
    vec![
        #[cfg(feature = "claude")]
        "claude",
        #[cfg(feature = "gemini")]
        "gemini",
        #[cfg(feature = "copilot")]
        "copilot",
    ]
}
