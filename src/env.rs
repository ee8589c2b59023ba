use std::env as stdenv;
use std::io::{self, Write};
use std::path::Path;

use crate::external::{Completion, ExternalCommand, LaunchError};
use crate::lexer::Tokens;

/// Operating system capabilities the interpreter calls into.
///
/// The OS stays the authority on process state such as the working directory; the
/// interpreter never keeps its own copy.
pub trait Host {
    /// Change the working directory of the interpreter process.
    fn change_dir(&mut self, dir: &Path) -> io::Result<()>;

    /// Run the program named by the first token, with all tokens as its argument
    /// vector, and wait until it terminates.
    fn launch(&mut self, tokens: &Tokens<'_>) -> Result<Completion, LaunchError>;
}

/// [`Host`] backed by the real process: `chdir(2)` and fork/exec/wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeHost;

impl Host for NativeHost {
    fn change_dir(&mut self, dir: &Path) -> io::Result<()> {
        stdenv::set_current_dir(dir)
    }

    fn launch(&mut self, tokens: &Tokens<'_>) -> Result<Completion, LaunchError> {
        ExternalCommand::new(tokens)?.execute()
    }
}

/// What a command can see and touch while it runs.
///
/// The environment contains:
/// - `stdout`: where prompts and builtin output go.
/// - `stderr`: where diagnostics go.
/// - `host`: the OS capabilities used by `cd` and external commands.
pub struct Environment {
    pub stdout: Box<dyn Write>,
    pub stderr: Box<dyn Write>,
    pub host: Box<dyn Host>,
}

impl Environment {
    /// The interpreter process's own streams and the native host.
    pub fn new() -> Self {
        Self::with_streams(Box::new(io::stdout()), Box::new(io::stderr()), Box::new(NativeHost))
    }

    pub fn with_streams(
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
        host: Box<dyn Host>,
    ) -> Self {
        Self {
            stdout,
            stderr,
            host,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
