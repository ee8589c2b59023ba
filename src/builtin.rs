use std::ffi::OsStr;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::PROGRAM_NAME;
use crate::env::Environment;
use crate::interpreter::Flow;

/// Built-in commands, handled inside the interpreter process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    ChangeDirectory,
    Help,
    Exit,
}

impl Builtin {
    /// Every builtin, in lookup order.
    pub const ALL: [Builtin; 3] = [Builtin::ChangeDirectory, Builtin::Help, Builtin::Exit];

    /// Name the command is invoked by.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::ChangeDirectory => "cd",
            Builtin::Help => "help",
            Builtin::Exit => "exit",
        }
    }

    /// Find the builtin called exactly `name` (case-sensitive).
    pub fn lookup(name: &[u8]) -> Option<Builtin> {
        Self::ALL
            .into_iter()
            .find(|builtin| builtin.name().as_bytes() == name)
    }

    /// Run the builtin. `args` is the whole command line, `args[0]` included.
    ///
    /// Failures are reported on the error channel; they never stop the interpreter.
    pub fn execute(self, args: &[&[u8]], env: &mut Environment) -> Flow {
        let result = match self {
            Builtin::ChangeDirectory => change_directory(args, env),
            Builtin::Help => help(&mut env.stdout),
            Builtin::Exit => return Flow::Stop,
        };
        if let Err(err) = result {
            report(env, &err);
        }
        Flow::Continue
    }
}

fn report(env: &mut Environment, err: &anyhow::Error) {
    if let Err(write_err) = writeln!(env.stderr, "{PROGRAM_NAME}: {err:#}") {
        warn!(error = %write_err, original = %err, "could not report builtin failure");
    }
}

fn change_directory(args: &[&[u8]], env: &mut Environment) -> Result<()> {
    let Some(&target) = args.get(1) else {
        bail!("expected argument to \"cd\"");
    };
    env.host
        .change_dir(Path::new(OsStr::from_bytes(target)))
        .with_context(|| format!("cd: {}", String::from_utf8_lossy(target)))
}

fn help(stdout: &mut dyn Write) -> Result<()> {
    writeln!(stdout, "{PROGRAM_NAME}: a minimal interactive shell")?;
    writeln!(stdout, "Type program names and arguments, and hit enter.")?;
    writeln!(stdout, "The following are built in:")?;
    for builtin in Builtin::ALL {
        writeln!(stdout, "  {}", builtin.name())?;
    }
    writeln!(stdout, "Use the man command for information on other programs.")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::{RecordingHost, capturing_env};
    use crate::lexer::Tokens;
    use std::path::PathBuf;

    fn run(builtin: Builtin, args: &[&str], env: &mut Environment) -> Flow {
        builtin.execute(Tokens::from_words(args).as_slice(), env)
    }

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        assert_eq!(Builtin::lookup(b"cd"), Some(Builtin::ChangeDirectory));
        assert_eq!(Builtin::lookup(b"help"), Some(Builtin::Help));
        assert_eq!(Builtin::lookup(b"exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup(b"Exit"), None);
        assert_eq!(Builtin::lookup(b"cd "), None);
        assert_eq!(Builtin::lookup(b"ls"), None);
    }

    #[test]
    fn test_cd_changes_to_first_argument() {
        let host = RecordingHost::default();
        let dirs = host.dirs.clone();
        let (mut env, _, err) = capturing_env(host);

        let flow = run(Builtin::ChangeDirectory, &["cd", "/tmp", "ignored"], &mut env);

        assert_eq!(flow, Flow::Continue);
        assert_eq!(*dirs.borrow(), vec![PathBuf::from("/tmp")]);
        assert_eq!(err.text(), "");
    }

    #[test]
    fn test_cd_passes_non_utf8_names_through() {
        let host = RecordingHost::default();
        let dirs = host.dirs.clone();
        let (mut env, _, _) = capturing_env(host);

        let args = [b"cd".as_slice(), b"caf\xe9".as_slice()];
        Builtin::ChangeDirectory.execute(&args, &mut env);

        assert_eq!(dirs.borrow()[0].as_os_str().as_bytes(), b"caf\xe9");
    }

    #[test]
    fn test_cd_without_argument_is_a_usage_error() {
        let host = RecordingHost::default();
        let dirs = host.dirs.clone();
        let (mut env, _, err) = capturing_env(host);

        let flow = run(Builtin::ChangeDirectory, &["cd"], &mut env);

        assert_eq!(flow, Flow::Continue);
        assert!(dirs.borrow().is_empty());
        assert_eq!(err.text(), "lish: expected argument to \"cd\"\n");
    }

    #[test]
    fn test_cd_failure_reports_os_error() {
        let host = RecordingHost {
            missing_dirs: true,
            ..Default::default()
        };
        let (mut env, _, err) = capturing_env(host);

        let flow = run(Builtin::ChangeDirectory, &["cd", "/nope"], &mut env);

        assert_eq!(flow, Flow::Continue);
        let err = err.text();
        assert!(err.starts_with("lish: cd: /nope: "), "got {err:?}");
        assert!(err.contains("not found"), "got {err:?}");
    }

    #[test]
    fn test_help_lists_every_builtin() {
        let (mut env, out, err) = capturing_env(RecordingHost::default());

        let flow = run(Builtin::Help, &["help", "me"], &mut env);

        assert_eq!(flow, Flow::Continue);
        let out = out.text();
        assert!(out.starts_with("lish: a minimal interactive shell\n"));
        assert!(out.contains("  cd\n  help\n  exit\n"));
        assert_eq!(err.text(), "");
    }

    #[test]
    fn test_exit_stops_regardless_of_arguments() {
        let (mut env, out, err) = capturing_env(RecordingHost::default());
        assert_eq!(run(Builtin::Exit, &["exit"], &mut env), Flow::Stop);
        assert_eq!(run(Builtin::Exit, &["exit", "now", "3"], &mut env), Flow::Stop);
        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "");
    }
}
