//! # shora-chat
//!
//! The SHORA safety conversation: onboarding, free chat with the bot backend, incident
//! reporting, quiz, server reminders and the daily tip.
//!
//! - [`Conversation`]: synchronous state machine returning [`Effect`]s
//! - [`ChatSession`] / [`SessionHandle`]: tokio runtime that performs those effects
//! - [`render`]: projection into [`Entry`] values for a front-end

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod effect;
pub mod keywords;
pub mod ledger;
pub mod render;
pub mod session;
mod watcher;

pub use catalog::{FixedPicker, Picker, RandomPicker};
pub use config::{ChatConfig, Timings};
pub use conversation::Conversation;
pub use effect::{BackendCall, Effect, Outcome, Timer};
pub use ledger::{FileTipLedger, MemoryTipLedger, TipLedger};
pub use render::{format_entry, format_header, render, snapshot, Badge, Entry, EntryBody, Snapshot};
pub use session::{ChatSession, SessionHandle};
