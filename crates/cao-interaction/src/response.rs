//! Response payload parsing and normalization.

use cao_core::config::ResponseShape;
use cao_core::error::{CaoError, Result};
use serde::Deserialize;
use serde_json::Value;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pulls the assistant text out of a successful response body.
///
/// `OllamaStyle` reads `message.content` and falls back to the
/// `choices[0].message.content` form, which OpenAI-compatible Ollama
/// endpoints return.
pub fn extract_content(payload: &Value, shape: ResponseShape) -> Result<String> {
    let content = match shape {
        ResponseShape::OpenAiStyle => openai_content(payload),
        ResponseShape::OllamaStyle => ollama_content(payload).or_else(|| openai_content(payload)),
    };

    content.ok_or_else(|| CaoError::api(None, "response contained no message content"))
}

fn openai_content(payload: &Value) -> Option<String> {
    ChatCompletionResponse::deserialize(payload)
        .ok()?
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
}

fn ollama_content(payload: &Value) -> Option<String> {
    OllamaResponse::deserialize(payload).ok()?.message.content
}

/// Error text from a non-2xx body: `error.message` when the body has the
/// usual `{"error": {"message": ...}}` form, otherwise the body itself.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Removes a leading `<think>...</think>` block and the whitespace after it.
///
/// Text without a complete leading block is returned unchanged.
pub fn strip_think_block(text: &str) -> String {
    let Some(after_open) = text.trim_start().strip_prefix(THINK_OPEN) else {
        return text.to_string();
    };
    match after_open.find(THINK_CLOSE) {
        Some(end) => after_open[end + THINK_CLOSE.len()..]
            .trim_start()
            .to_string(),
        None => text.to_string(),
    }
}
