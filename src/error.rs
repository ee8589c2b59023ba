use std::collections::TryReserveError;
use std::io;

use rustyline::error::ReadlineError;

/// Errors that end the read-eval loop.
///
/// Everything else (bad `cd` targets, programs that cannot be launched) is reported
/// where it happens and the loop keeps going.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// A line or token buffer could not grow.
    #[error("allocation error")]
    Allocation(#[from] TryReserveError),
    /// The input stream failed for a reason other than end-of-input.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    /// The terminal line editor failed.
    #[error("line editor failure: {0}")]
    Editor(#[from] ReadlineError),
}
