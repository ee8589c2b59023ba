use std::io::Write;

use tracing::{debug, warn};

use crate::PROGRAM_NAME;
use crate::builtin::Builtin;
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::{self, Tokens};
use crate::reader::{Line, LineSource};

/// Continuation signal returned by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the read-eval loop.
    Stop,
}

/// Why [`Interpreter::repl`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The `exit` builtin was run.
    Stopped,
    /// The line source ran dry.
    EndOfInput,
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// Example
/// ```
/// use lish::{Environment, Flow, Interpreter};
/// let mut sh = Interpreter::new(Environment::new());
/// assert_eq!(sh.run_line("exit").unwrap(), Flow::Stop);
/// ```
pub struct Interpreter {
    env: Environment,
    prompt: String,
}

impl Interpreter {
    pub const DEFAULT_PROMPT: &'static str = "> ";

    pub fn new(env: Environment) -> Self {
        Self {
            env,
            prompt: Self::DEFAULT_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Dispatch one tokenized command.
    ///
    /// An empty command does nothing. Builtins decide the returned signal; external
    /// programs always yield [`Flow::Continue`], whatever their exit status.
    pub fn execute(&mut self, tokens: &Tokens<'_>) -> Flow {
        let Some(name) = tokens.command() else {
            return Flow::Continue;
        };
        match Builtin::lookup(name) {
            Some(builtin) => {
                debug!(builtin = builtin.name(), "running builtin");
                builtin.execute(tokens.as_slice(), &mut self.env)
            }
            None => {
                self.launch(tokens);
                Flow::Continue
            }
        }
    }

    fn launch(&mut self, tokens: &Tokens<'_>) {
        // Anything still buffered would otherwise be written twice, once by the child.
        if let Err(err) = self.env.stdout.flush() {
            warn!(error = %err, "could not flush output before launch");
        }
        match self.env.host.launch(tokens) {
            Ok(completion) => debug!(?completion, "external command finished"),
            Err(err) => {
                if let Err(write_err) = writeln!(self.env.stderr, "{PROGRAM_NAME}: {err}") {
                    warn!(error = %write_err, original = %err, "could not report launch failure");
                }
            }
        }
    }

    /// Tokenize and dispatch a single line of text.
    pub fn run_line(&mut self, text: impl Into<Vec<u8>>) -> Result<Flow, ShellError> {
        let line = Line::new(text);
        let tokens = lexer::split_into_tokens(&line)?;
        Ok(self.execute(&tokens))
    }

    /// Read-eval loop: prompt, read, tokenize, dispatch, until `exit` or end of input.
    ///
    /// Only allocation and input failures are returned as errors; everything else is
    /// reported on the error channel and the loop continues.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<Termination, ShellError> {
        loop {
            let Some(line) = source.read_line(&self.prompt)? else {
                debug!("end of input");
                return Ok(Termination::EndOfInput);
            };
            let tokens = lexer::split_into_tokens(&line)?;
            let flow = self.execute(&tokens);
            drop(tokens);
            drop(line);

            if flow == Flow::Stop {
                return Ok(Termination::Stopped);
            }
        }
    }
}
