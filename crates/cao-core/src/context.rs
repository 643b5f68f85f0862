//! Conversation context.
//!
//! The ordered, role-tagged message log a session sends to the completion
//! backend. Owned and mutated by the foreground session loop only.
//!
//! Invariants:
//! - exactly one `system` message, holding the active persona's prompt;
//!   persona switches rewrite it in place
//! - after every assistant turn the log is compacted: once it grows past
//!   [`MAX_CONTEXT_MESSAGES`] it keeps every `system` message plus the
//!   [`RETAINED_MESSAGES`] most recent messages, in order

use tracing::debug;

use crate::message::{Message, MessageRole};
use crate::persona::Persona;

/// Length above which the context is compacted.
pub const MAX_CONTEXT_MESSAGES: usize = 20;

/// Number of most recent messages kept by compaction.
pub const RETAINED_MESSAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    /// Starts a context seeded with the persona's prompt and greeting.
    pub fn start(persona: &Persona) -> Self {
        Self {
            messages: vec![
                Message::system(persona.system_prompt.clone()),
                Message::assistant(persona.greeting.clone()),
            ],
        }
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Appends an assistant turn and compacts the log.
    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
        self.compact();
    }

    /// Replaces the system message's content with the persona's prompt.
    ///
    /// User and assistant turns are left untouched so the backend keeps the
    /// conversation so far under the new instructions.
    pub fn switch_persona(&mut self, persona: &Persona) {
        let prompt = Message::system(persona.system_prompt.clone());
        match self.messages.iter_mut().find(|m| m.is_system()) {
            Some(system) => *system = prompt,
            None => self.messages.insert(0, prompt),
        }
    }

    /// Trims the log to every `system` message plus the most recent
    /// [`RETAINED_MESSAGES`] once it exceeds [`MAX_CONTEXT_MESSAGES`].
    ///
    /// A no-op when the log is within bounds, so compacting twice equals
    /// compacting once.
    pub fn compact(&mut self) {
        let len = self.messages.len();
        if len <= MAX_CONTEXT_MESSAGES {
            return;
        }

        let recent_start = len - RETAINED_MESSAGES;
        let mut index = 0;
        self.messages.retain(|message| {
            let keep = message.is_system() || index >= recent_start;
            index += 1;
            keep
        });

        debug!(
            before = len,
            after = self.messages.len(),
            "Compacted conversation context"
        );
    }

    /// Messages in the exact order to send to the completion backend.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Content of the current system message.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.is_system())
            .map(|m| m.content.as_str())
    }

    pub fn count_role(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
