use std::collections::TryReserveError;
use std::io::{self, BufRead, Write};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, trace};

use crate::error::ShellError;

/// Initial capacity of a line buffer, and the amount it grows by each time it fills up.
pub const LINE_BUFSIZE: usize = 1024;

/// One line of input with its terminator stripped.
///
/// The bytes are kept exactly as read, so arguments reach launched programs
/// unchanged whatever their encoding. A fresh `Line` is read on every loop
/// iteration; tokens borrow from it and are dropped before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Capacity of the backing buffer, in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

/// Somewhere lines come from.
pub trait LineSource {
    /// Display `prompt` and read the next line.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<Line>, ShellError>;
}

/// Grow `buffer` so its capacity is exactly `increment` elements larger.
pub(crate) fn grow_by<T>(buffer: &mut Vec<T>, increment: usize) -> Result<(), TryReserveError> {
    let additional = buffer.capacity() - buffer.len() + increment;
    buffer.try_reserve_exact(additional)?;
    trace!(capacity = buffer.capacity(), "buffer grown");
    Ok(())
}

/// Reads lines from any buffered byte stream, writing prompts to `prompt_out`.
///
/// Used for redirected input and in tests. A trailing fragment that is not
/// terminated by `\n` is treated as end-of-input and discarded.
pub struct StreamReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.prompt_out)
    }
}

impl<R: BufRead, W: Write> LineSource for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Line>, ShellError> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;
        Ok(read_raw_line(&mut self.input)?.map(Line::new))
    }
}

fn read_raw_line<R: BufRead>(input: &mut R) -> Result<Option<Vec<u8>>, ShellError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(LINE_BUFSIZE)?;

    loop {
        let available = match input.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if available.is_empty() {
            if !buffer.is_empty() {
                debug!(len = buffer.len(), "discarding unterminated line at end of input");
            }
            return Ok(None);
        }

        let (chunk, terminated) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (&available[..end], true),
            None => (available, false),
        };
        for &byte in chunk {
            if buffer.len() == buffer.capacity() {
                grow_by(&mut buffer, LINE_BUFSIZE)?;
            }
            buffer.push(byte);
        }

        let consumed = chunk.len() + usize::from(terminated);
        input.consume(consumed);
        if terminated {
            return Ok(Some(buffer));
        }
    }
}

/// Interactive line source backed by a rustyline editor. Nothing is added to history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Line>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(text) => Ok(Some(Line::new(text))),
            Err(ReadlineError::Eof) => Ok(None),
            // Ctrl-C abandons the current line only
            Err(ReadlineError::Interrupted) => {
                debug!("line interrupted");
                Ok(Some(Line::default()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    fn reader(input: &str) -> StreamReader<Cursor<Vec<u8>>, Vec<u8>> {
        StreamReader::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_reads_lines_and_strips_terminator() {
        let mut src = reader("echo hi\n\nexit\n");
        assert_eq!(src.read_line("> ").unwrap(), Some(Line::new("echo hi")));
        assert_eq!(src.read_line("> ").unwrap(), Some(Line::new("")));
        assert_eq!(src.read_line("> ").unwrap(), Some(Line::new("exit")));
        assert_eq!(src.read_line("> ").unwrap(), None);
    }

    #[test]
    fn test_prompt_is_written_before_each_read() {
        let mut src = reader("a\n");
        src.read_line("$ ").unwrap();
        src.read_line("$ ").unwrap();
        let (_, prompts) = src.into_inner();
        assert_eq!(prompts, b"$ $ ");
    }

    #[test]
    fn test_unterminated_fragment_is_end_of_input() {
        let mut src = reader("ls -l");
        assert_eq!(src.read_line("> ").unwrap(), None);
    }

    #[test]
    fn test_carriage_return_is_kept_for_the_tokenizer() {
        let mut src = reader("pwd\r\n");
        assert_eq!(src.read_line("").unwrap(), Some(Line::new("pwd\r")));
    }

    #[test]
    fn test_line_buffer_grows_in_fixed_increments() {
        let exact = "x".repeat(LINE_BUFSIZE) + "\n";
        let line = reader(&exact).read_line("").unwrap().unwrap();
        assert_eq!(line.as_bytes().len(), LINE_BUFSIZE);
        assert_eq!(line.capacity(), LINE_BUFSIZE);

        let long = "y".repeat(LINE_BUFSIZE * 2 + 10) + "\n";
        let line = reader(&long).read_line("").unwrap().unwrap();
        assert_eq!(line.as_bytes().len(), LINE_BUFSIZE * 2 + 10);
        assert_eq!(line.capacity(), LINE_BUFSIZE * 3);
    }

    #[test]
    fn test_line_spanning_many_small_reads() {
        // A tiny BufReader forces the line to arrive in several fill_buf chunks.
        let text = "a".repeat(100) + " " + &"b".repeat(100) + "\nrest\n";
        let inner = BufReader::with_capacity(7, Cursor::new(text.clone().into_bytes()));
        let mut src = StreamReader::new(inner, Vec::new());
        let line = src.read_line("").unwrap().unwrap();
        assert_eq!(line.as_bytes(), &text.as_bytes()[..201]);
        assert_eq!(src.read_line("").unwrap(), Some(Line::new("rest")));
    }

    #[test]
    fn test_non_utf8_bytes_are_kept_verbatim() {
        let mut src = StreamReader::new(Cursor::new(b"od caf\xe9 \xff\n".to_vec()), Vec::new());
        let line = src.read_line("").unwrap().unwrap();
        assert_eq!(line.as_bytes(), b"od caf\xe9 \xff");
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_read_failure_is_an_io_error() {
        let mut src = StreamReader::new(BufReader::new(Failing), Vec::new());
        assert!(matches!(src.read_line(""), Err(ShellError::Io(_))));
    }
}
