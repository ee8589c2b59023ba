use std::io::{self, IsTerminal};

use argh::FromArgs;

use crate::Interpreter;

/// Default tracing filter; only warnings and errors reach stderr.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(FromArgs, Debug, PartialEq)]
/// A minimal interactive shell: runs one command per line, with the builtins cd, help and exit.
pub struct Options {
    #[argh(option, default = "Interpreter::DEFAULT_PROMPT.to_string()")]
    /// text printed before every input line (default "> ")
    pub prompt: String,

    #[argh(option, default = "DEFAULT_LOG_FILTER.to_string()")]
    /// log filter for diagnostics written to stderr, e.g. "debug" (default "warn")
    pub log: String,

    #[argh(switch)]
    /// read plain lines from stdin even when it is a terminal
    pub no_editor: bool,
}

impl Options {
    /// Whether input should go through the interactive line editor.
    pub fn use_editor(&self) -> bool {
        !self.no_editor && io::stdin().is_terminal()
    }
}
