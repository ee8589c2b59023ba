//! A tiny interactive command interpreter.
//!
//! Each input line is split on whitespace into a command name and its arguments.
//! A handful of builtins (`cd`, `help`, `exit`) run in-process; anything else is
//! launched as a child process found through `PATH`, and the interpreter waits for
//! it before prompting again.
//!
//! The main entry point is [`Interpreter`]. It reads lines from a [`LineSource`],
//! tokenizes them with [`split_into_tokens`] and dispatches the result. Operating
//! system side effects go through the [`Host`] held by the [`Environment`], so the
//! loop can be embedded or tested without touching the real process state.

pub mod builtin;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod reader;

/// Name used as the prefix of every diagnostic written to the error channel.
pub const PROGRAM_NAME: &str = "lish";

pub use builtin::Builtin;
pub use env::{Environment, Host, NativeHost};
pub use error::ShellError;
pub use interpreter::{Flow, Interpreter, Termination};
pub use lexer::{Tokens, split_into_tokens};
pub use reader::{Line, LineSource};
