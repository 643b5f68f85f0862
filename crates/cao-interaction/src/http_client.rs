//! HTTP chat-completion client.
//!
//! Posts `{model, messages, temperature}` to `<api_base>/chat/completions`
//! and parses the reply according to the model's [`ResponseShape`].
//!
//! [`ResponseShape`]: cao_core::config::ResponseShape

use std::time::Duration;

use async_trait::async_trait;
use cao_core::config::ResolvedModel;
use cao_core::error::{CaoError, Result};
use cao_core::message::Message;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::completion_client::CompletionClient;
use crate::response;

const TEMPERATURE: f32 = 0.7;

/// Completion client for OpenAI-compatible HTTP backends (DeepSeek, OpenAI,
/// Ollama and friends).
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    model: ResolvedModel,
}

impl HttpCompletionClient {
    /// Builds a client whose requests time out after the model's
    /// `timeout_secs`.
    pub fn new(model: ResolvedModel) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(model.timeout_secs))
            .build()
            .map_err(|err| CaoError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, model })
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<String> {
        let url = self.model.completions_url();
        debug!(%url, messages = body.messages.len(), "Sending completion request");

        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.model.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let payload: serde_json::Value = response.json().await.map_err(|err| {
            CaoError::api(Some(status.as_u16()), format!("malformed response body: {err}"))
        })?;

        response::extract_content(&payload, self.model.response_shape)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model.model,
            messages: &messages,
            temperature: TEMPERATURE,
        };
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

fn map_transport_error(err: reqwest::Error) -> CaoError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    };
    CaoError::api(None, message)
}

fn map_http_error(status: StatusCode, body: &str) -> CaoError {
    CaoError::api(Some(status.as_u16()), response::error_message(body))
}
