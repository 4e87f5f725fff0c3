//! A small interactive command interpreter.
//!
//! Input lines are split on whitespace and dispatched either to a builtin
//! implemented in Rust (file utilities such as `cat`, `sort`, `uniq`, `cmp` and
//! `more`, process control with `ps` and `kill`, and `history`) or to an external
//! program found on `PATH`. A line of the form `cmd1 | cmd2` runs both programs
//! with the first one's output piped into the second.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the command
//! traits, the environment and the building blocks used by the builtins.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod procfs;
pub mod textutil;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use io_adapters::{MemReader, MemWriter};
