use std::ffi::{CString, NulError};

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};
use tracing::debug;

use crate::PROGRAM_NAME;
use crate::lexer::Tokens;

/// How a launched program ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The program exited normally with this status code.
    Exited(i32),
    /// The program was terminated by a signal.
    Signaled(Signal),
}

/// Reasons a program could not be launched or waited for.
///
/// Failure to find or execute the program itself happens in the child and is
/// reported there; the parent only sees a non-zero [`Completion::Exited`].
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no command given")]
    EmptyCommand,
    #[error("argument contains a NUL byte")]
    Nul(#[from] NulError),
    #[error("fork failed: {0}")]
    Fork(Errno),
    #[error("waiting for process {pid} failed: {errno}")]
    Wait { pid: Pid, errno: Errno },
}

/// A program to run in a child process, resolved through `PATH` by `execvp`.
pub struct ExternalCommand {
    argv: Vec<CString>,
    exec_failure_prefix: Vec<u8>,
}

impl ExternalCommand {
    /// Prepare `tokens` (program name first) for launching.
    pub fn new(tokens: &Tokens<'_>) -> Result<Self, LaunchError> {
        let program = tokens.command().ok_or(LaunchError::EmptyCommand)?;
        let argv = tokens.to_argv()?;
        // Built here so the child never allocates between fork and exec.
        let mut exec_failure_prefix = format!("{PROGRAM_NAME}: ").into_bytes();
        exec_failure_prefix.extend_from_slice(program);
        exec_failure_prefix.extend_from_slice(b": ");
        Ok(Self {
            argv,
            exec_failure_prefix,
        })
    }

    /// Fork, exec the program in the child and block until it has terminated.
    pub fn execute(self) -> Result<Completion, LaunchError> {
        // SAFETY: the child only calls execvp, write and _exit before the image is
        // replaced or the process ends.
        match unsafe { fork() } {
            Err(errno) => Err(LaunchError::Fork(errno)),
            Ok(ForkResult::Child) => self.replace_image(),
            Ok(ForkResult::Parent { child }) => {
                debug!(%child, program = ?self.argv[0], "launched");
                wait_for_termination(child)
            }
        }
    }

    fn replace_image(&self) -> ! {
        let errno = match execvp(&self.argv[0], &self.argv) {
            Err(errno) => errno,
            Ok(never) => match never {},
        };
        write_stderr(&self.exec_failure_prefix);
        write_stderr(errno.desc().as_bytes());
        write_stderr(b"\n");
        // SAFETY: _exit skips atexit handlers and stdio flushing, which belong to
        // the parent.
        unsafe { libc::_exit(1) }
    }
}

fn write_stderr(bytes: &[u8]) {
    // SAFETY: the pointer and length come from a live slice.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Wait on `child` until it has exited or been killed.
///
/// A stopped child is not finished, so the wait is repeated until a terminal state
/// is observed.
fn wait_for_termination(child: Pid) -> Result<Completion, LaunchError> {
    loop {
        match waitpid(child, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(%child, code, "process exited");
                return Ok(Completion::Exited(code));
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(%child, ?signal, "process killed by signal");
                return Ok(Completion::Signaled(signal));
            }
            Ok(status) => debug!(%child, ?status, "process not finished yet"),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(LaunchError::Wait { pid: child, errno }),
        }
    }
}
