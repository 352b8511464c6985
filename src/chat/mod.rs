//! Chat completion support for the coach.
//!
//! - `conversation`: message types and history
//! - `config`: provider presets and API settings
//! - `backend`: the [`ChatBackend`] trait and its implementations
//! - `prompts`: fixed prompt and notification text

pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prompts;

pub use backend::{ChatBackend, MockChatBackend, OpenAiCompatibleBackend};
pub use config::{ChatProvider, ChatSettings};
pub use conversation::{ChatMessage, Conversation, Role};
pub use error::ChatError;
