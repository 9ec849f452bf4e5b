//! # shora-core
//!
//! Core types for the SHORA safety companion: [`Message`], [`UserProfile`], [`ConversationState`],
//! quiz items, the append-only [`Transcript`], error types and tracing initialisation.
//! Transport-agnostic; used by shora-gateway, shora-chat and the CLI.

pub mod error;
pub mod logger;
pub mod transcript;
pub mod types;

pub use error::{Result, ShoraError};
pub use logger::init_tracing;
pub use transcript::Transcript;
pub use types::{
    Button, ConversationState, InteractionMode, Message, MessageId, MessageKind, QuizItem,
    QuizOption, Speaker, UserProfile, Verdict,
};
