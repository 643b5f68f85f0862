//! Session-level types shared by the engine and the terminal front end.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::config::ResolvedModel;
use crate::persona::DEFAULT_PERSONA_KEY;

/// How assistant replies are framed on screen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RenderMode {
    /// Fixed "AI Analysis" title, up to 100 columns wide.
    Normal,
    /// Persona-titled speech bubble.
    #[default]
    Chat,
}

/// Where the session loop currently is.
///
/// ```text
/// AwaitingInput --plain message--> Dispatching --reply--> Rendering --> AwaitingInput
/// AwaitingInput --/persona, unknown command, empty--> AwaitingInput
/// any --exit token, Ctrl-C, EOF--> Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SessionState {
    #[default]
    AwaitingInput,
    Dispatching,
    Rendering,
    Terminated,
}

impl SessionState {
    pub fn is_terminated(self) -> bool {
        self == Self::Terminated
    }
}

/// Everything a session needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: ResolvedModel,
    pub render_mode: RenderMode,
    pub initial_persona: String,
    pub debug: bool,
}

impl SessionConfig {
    pub fn new(model: ResolvedModel) -> Self {
        Self {
            model,
            render_mode: RenderMode::default(),
            initial_persona: DEFAULT_PERSONA_KEY.to_string(),
            debug: false,
        }
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn with_initial_persona(mut self, key: impl Into<String>) -> Self {
        self.initial_persona = key.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
