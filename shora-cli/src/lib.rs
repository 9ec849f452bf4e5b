//! # shora-cli
//!
//! Argument parsing, config loading and the terminal chat front-end of the `shora` binary.

pub mod cli;
pub mod repl;

pub use cli::{parse_input, Cli, Commands, Input};
pub use repl::{run_chat, TranscriptPrinter};
