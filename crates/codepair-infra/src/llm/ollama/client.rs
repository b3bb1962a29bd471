//! OllamaProvider -- concrete [`LlmProvider`] for a local Ollama server.
//!
//! Sends requests to the native chat endpoint (`/api/chat`). Supports both
//! non-streaming (`complete`) and NDJSON streaming (`stream`) modes, and
//! lists installed models through `/api/tags`.

use std::time::Duration;

use codepair_core::llm::provider::{EventStream, LlmProvider};
use codepair_types::config::OracleSettings;
use codepair_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, OutputFormat, StopReason, Usage,
};

use super::streaming::create_ollama_stream;
use super::types::{
    OllamaChatRequest, OllamaChatResponse, OllamaErrorBody, OllamaMessage, OllamaModelTag,
    OllamaOptions, OllamaTagsResponse,
};

/// Ollama completion oracle.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `base_url`.
    ///
    /// `timeout` bounds connecting and each wait for more bytes; a reply that
    /// keeps streaming is never cut off.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &OracleSettings) -> Result<Self, LlmError> {
        Self::new(
            settings.endpoint(),
            &settings.model,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// The default model for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`OllamaChatRequest`].
    pub(crate) fn to_ollama_request(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> OllamaChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        OllamaChatRequest {
            model,
            messages,
            stream,
            format: match request.format {
                OutputFormat::Text => None,
                OutputFormat::Json => Some("json".to_string()),
            },
            options: OllamaOptions {
                temperature: request.temperature,
            },
        }
    }

    /// Models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<OllamaModelTag>, LlmError> {
        let url = self.url("/api/tags");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_send_error(&self.base_url, e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::Provider {
                message: format!("{url} not found; is this an Ollama server?"),
            });
        }
        let response = check_status(response, &self.model).await?;

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse model list: {e}"))
        })?;
        Ok(tags.models)
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_ollama_request(request, false);
        let url = self.url("/api/chat");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&self.base_url, e))?;
        let response = check_status(response, &body.model).await?;

        let chat: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        if let Some(error) = chat.error {
            return Err(LlmError::Provider { message: error });
        }

        let stop_reason = chat
            .done_reason
            .as_deref()
            .and_then(|r| r.parse::<StopReason>().ok())
            .unwrap_or(StopReason::EndTurn);

        Ok(CompletionResponse {
            content: chat.message.map(|m| m.content).unwrap_or_default(),
            model: if chat.model.is_empty() { body.model } else { chat.model },
            stop_reason,
            usage: Usage {
                input_tokens: chat.prompt_eval_count.unwrap_or(0),
                output_tokens: chat.eval_count.unwrap_or(0),
            },
        })
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let body = self.to_ollama_request(&request, true);
        create_ollama_stream(self.client.clone(), self.url("/api/chat"), body)
    }
}

/// Map a transport-level `reqwest` failure to an [`LlmError`].
pub(crate) fn map_send_error(endpoint: &str, err: reqwest::Error) -> LlmError {
    if err.is_connect() || err.is_timeout() {
        LlmError::Connection {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    } else {
        LlmError::Provider {
            message: format!("HTTP request failed: {err}"),
        }
    }
}

/// Turn a non-2xx response into an [`LlmError`], passing successes through.
pub(crate) async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OllamaErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);

    Err(match status.as_u16() {
        404 => LlmError::ModelNotFound(model.to_string()),
        400 => LlmError::InvalidRequest(message),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    })
}
