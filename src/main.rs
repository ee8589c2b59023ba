use std::io;
use std::process::ExitCode;

use lish::config::{DEFAULT_LOG_FILTER, Options};
use lish::reader::{EditorReader, StreamReader};
use lish::{Environment, Interpreter, LineSource, PROGRAM_NAME, ShellError, Termination};
use tracing_subscriber::EnvFilter;

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("{PROGRAM_NAME}: invalid log filter {filter:?}: {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(options: &Options) -> Result<Termination, ShellError> {
    let mut interpreter = Interpreter::new(Environment::new()).with_prompt(options.prompt.as_str());
    let mut source: Box<dyn LineSource> = if options.use_editor() {
        Box::new(EditorReader::new()?)
    } else {
        Box::new(StreamReader::new(io::stdin().lock(), io::stdout()))
    };
    interpreter.repl(source.as_mut())
}

fn main() -> ExitCode {
    let options: Options = argh::from_env();
    init_tracing(&options.log);

    match run(&options) {
        Ok(termination) => {
            tracing::debug!(?termination, "shell finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{PROGRAM_NAME}: {err}");
            ExitCode::FAILURE
        }
    }
}
