//! Session engine: command routing and the turn state machine.
//!
//! The engine is the only mutator of the conversation context. The terminal
//! front end feeds it lines, polls it while a completion runs and tells it
//! when a reply has been rendered.

use std::sync::Arc;

use cao_core::context::ConversationContext;
use cao_core::error::{CaoError, Result};
use cao_core::message::Message;
use cao_core::persona::{Persona, PersonaRegistry};
use cao_core::session::SessionState;
use tracing::{debug, info};

use crate::completion_client::CompletionClient;
use crate::dispatcher::{DispatchResult, Dispatcher};

/// Inputs that end the session, compared case-insensitively after trimming.
pub const EXIT_TOKENS: [&str; 4] = ["/exit", "/quit", "exit", "quit"];

/// Prefix of the assistant message that stands in for a failed completion.
pub const APOLOGY_PREFIX: &str = "I hit a problem: ";

/// A classified line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Empty,
    /// `/<key>` alone.
    SwitchPersona { key: String },
    /// `/<key> <message>`: switch, then send `message` in the same turn.
    SwitchAndSend { key: String, message: String },
    /// `/<name>` where `name` is not a persona.
    Unknown { command: String },
    Message(String),
}

impl Command {
    /// Classifies one line of input against the registered personas.
    pub fn parse(input: &str, registry: &PersonaRegistry) -> Self {
        let trimmed = input.trim();
        let lowered = trimmed.to_lowercase();

        if EXIT_TOKENS.contains(&lowered.as_str()) {
            return Self::Exit;
        }
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Message(input.to_string());
        };

        let (name, remainder) = match rest.split_once(char::is_whitespace) {
            Some((name, remainder)) => (name, remainder.trim()),
            None => (rest, ""),
        };

        match registry.get(name) {
            Ok(persona) if remainder.is_empty() => Self::SwitchPersona {
                key: persona.key.clone(),
            },
            Ok(persona) => Self::SwitchAndSend {
                key: persona.key.clone(),
                message: remainder.to_string(),
            },
            Err(_) => Self::Unknown {
                command: format!("/{name}"),
            },
        }
    }
}

/// What the front end should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResult {
    /// Leave the session.
    Terminate,
    /// Nothing changed; prompt again.
    NoOp,
    /// The active persona changed; show a switch notice.
    PersonaSwitched { persona: Persona },
    /// Show an unknown-command notice.
    UnknownCommand { command: String },
    /// A completion is running; poll for the reply.
    Dispatched,
}

pub struct SessionEngine {
    registry: PersonaRegistry,
    active_key: String,
    context: ConversationContext,
    dispatcher: Dispatcher,
    state: SessionState,
}

impl SessionEngine {
    /// Starts a session with `initial_persona` active.
    ///
    /// # Errors
    ///
    /// Returns `CaoError::NotFound` when the persona is not registered.
    pub fn new(
        registry: PersonaRegistry,
        initial_persona: &str,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let persona = registry.get(initial_persona)?;
        let context = ConversationContext::start(persona);
        let active_key = persona.key.clone();

        info!("Session started with persona '{}'", active_key);

        Ok(Self {
            registry,
            active_key,
            context,
            dispatcher: Dispatcher::new(client),
            state: SessionState::AwaitingInput,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    pub fn active_persona(&self) -> &Persona {
        self.registry
            .get(&self.active_key)
            .unwrap_or_else(|_| self.registry.default_persona())
    }

    /// Greeting of the active persona, shown once when the session opens.
    pub fn greeting(&self) -> &str {
        &self.active_persona().greeting
    }

    /// Routes one line of input.
    ///
    /// # Errors
    ///
    /// Returns `CaoError::Internal` when called outside `AwaitingInput`.
    pub fn handle_input(&mut self, input: &str) -> Result<InteractionResult> {
        if self.state != SessionState::AwaitingInput {
            return Err(CaoError::internal(format!(
                "cannot accept input while {}",
                self.state
            )));
        }

        match Command::parse(input, &self.registry) {
            Command::Exit => {
                self.terminate();
                Ok(InteractionResult::Terminate)
            }
            Command::Empty => Ok(InteractionResult::NoOp),
            Command::SwitchPersona { key } => {
                let persona = self.switch_persona(&key)?;
                Ok(InteractionResult::PersonaSwitched { persona })
            }
            Command::SwitchAndSend { key, message } => {
                self.switch_persona(&key)?;
                self.send(message)
            }
            Command::Unknown { command } => {
                debug!("Unknown command {}", command);
                Ok(InteractionResult::UnknownCommand { command })
            }
            Command::Message(message) => self.send(message),
        }
    }

    /// Checks the running completion without blocking.
    ///
    /// Returns the assistant reply once the completion has finished.
    pub fn poll_reply(&mut self) -> Option<String> {
        if self.state != SessionState::Dispatching {
            return None;
        }
        let result = self.dispatcher.poll();
        result.done.then(|| self.complete_turn(result))
    }

    /// Waits for the running completion and returns the assistant reply.
    pub async fn wait_reply(&mut self) -> Option<String> {
        if self.state != SessionState::Dispatching {
            return None;
        }
        let result = self.dispatcher.wait().await;
        Some(self.complete_turn(result))
    }

    /// Records a finished dispatch as the assistant turn.
    ///
    /// A failed dispatch becomes an assistant message starting with
    /// [`APOLOGY_PREFIX`].
    pub fn complete_turn(&mut self, result: DispatchResult) -> String {
        let reply = match (result.text, result.error) {
            (Some(text), _) => text,
            (None, Some(error)) => format!("{APOLOGY_PREFIX}{error}"),
            (None, None) => format!("{APOLOGY_PREFIX}the backend returned nothing"),
        };

        self.context.append_assistant(reply.clone());
        self.state = SessionState::Rendering;
        reply
    }

    /// Marks the last reply as shown and accepts input again.
    pub fn mark_rendered(&mut self) {
        if self.state == SessionState::Rendering {
            self.state = SessionState::AwaitingInput;
        }
    }

    /// Ends the session, abandoning any running completion.
    pub fn terminate(&mut self) {
        self.dispatcher.abandon();
        self.state = SessionState::Terminated;
        info!("Session terminated");
    }

    fn switch_persona(&mut self, key: &str) -> Result<Persona> {
        let persona = self.registry.get(key)?.clone();
        self.context.switch_persona(&persona);
        self.active_key = persona.key.clone();
        debug!("Switched persona to '{}'", self.active_key);
        Ok(persona)
    }

    /// Dispatches `message` and records it as the user turn.
    ///
    /// The context is left untouched when the dispatch is refused.
    fn send(&mut self, message: String) -> Result<InteractionResult> {
        let mut snapshot = self.context.snapshot();
        snapshot.push(Message::user(message.as_str()));
        self.dispatcher.dispatch(snapshot)?;

        self.context.append_user(message);
        self.state = SessionState::Dispatching;
        Ok(InteractionResult::Dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    fn registry() -> PersonaRegistry {
        PersonaRegistry::builtin()
    }

    /// Records what it was asked, then never answers.
    #[derive(Default)]
    struct Stalled {
        seen: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl CompletionClient for Stalled {
        async fn complete(&self, messages: Vec<Message>) -> Result<String> {
            self.seen.lock().unwrap().push(messages);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_dispatched_snapshot_ends_with_the_new_message() {
        let client = Arc::new(Stalled::default());
        let mut engine = SessionEngine::new(registry(), "default", client.clone()).unwrap();

        engine.handle_input("hello").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].last(), Some(&Message::user("hello")));
        assert_eq!(engine.context().last(), Some(&Message::user("hello")));
        engine.terminate();
    }

    #[tokio::test]
    async fn test_refused_dispatch_leaves_context_untouched() {
        let mut engine =
            SessionEngine::new(registry(), "default", Arc::new(Stalled::default())).unwrap();
        // A completion the engine does not know about keeps the dispatcher busy.
        engine.dispatcher.dispatch(engine.context.snapshot()).unwrap();
        let before = engine.context().messages().to_vec();

        let err = engine.handle_input("second question").unwrap_err();

        assert!(matches!(err, CaoError::Internal(_)));
        assert_eq!(engine.context().messages(), before.as_slice());
        assert_eq!(engine.state(), SessionState::AwaitingInput);
        engine.terminate();
    }

    #[test]
    fn test_exit_tokens_ignore_case_and_whitespace() {
        for input in ["exit", "QUIT", "  /Exit  ", "/quit\t"] {
            assert_eq!(Command::parse(input, &registry()), Command::Exit, "{input:?}");
        }
        assert_eq!(
            Command::parse("exit now", &registry()),
            Command::Message("exit now".to_string())
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Command::parse("", &registry()), Command::Empty);
        assert_eq!(Command::parse(" \t ", &registry()), Command::Empty);
    }

    #[test]
    fn test_persona_switch_forms() {
        assert_eq!(
            Command::parse("/frontend", &registry()),
            Command::SwitchPersona {
                key: "frontend".to_string()
            }
        );
        assert_eq!(
            Command::parse("/frontend   what is a closure?  ", &registry()),
            Command::SwitchAndSend {
                key: "frontend".to_string(),
                message: "what is a closure?".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/bogus arg", &registry()),
            Command::Unknown {
                command: "/bogus".to_string()
            }
        );
        assert_eq!(
            Command::parse("/", &registry()),
            Command::Unknown {
                command: "/".to_string()
            }
        );
    }

    #[test]
    fn test_plain_message_is_kept_verbatim() {
        assert_eq!(
            Command::parse("  why does make fail?", &registry()),
            Command::Message("  why does make fail?".to_string())
        );
    }
}
