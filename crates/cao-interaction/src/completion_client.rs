use async_trait::async_trait;
use cao_core::error::Result;
use cao_core::message::Message;

/// A chat-completion backend.
///
/// Receives the conversation exactly as `ConversationContext::snapshot`
/// produced it and returns the raw assistant text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;
}
