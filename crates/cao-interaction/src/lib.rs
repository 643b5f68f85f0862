//! The cao conversation engine.
//!
//! [`SessionEngine`] routes each line of input, owns the conversation
//! context and hands completions to a [`Dispatcher`], which runs exactly one
//! [`CompletionClient`] request at a time on a background task.

pub mod completion_client;
pub mod dispatcher;
pub mod http_client;
pub mod response;
pub mod session;

pub use completion_client::CompletionClient;
pub use dispatcher::{DispatchResult, Dispatcher};
pub use http_client::HttpCompletionClient;
pub use session::{Command, InteractionResult, SessionEngine};
