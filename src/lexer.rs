use std::ffi::{CString, NulError};

use tracing::trace;

use crate::error::ShellError;
use crate::reader::{Line, grow_by};

/// Initial capacity of a token list, and the amount it grows by each time it fills up.
pub const TOKEN_BUFSIZE: usize = 64;

/// Bytes that separate tokens: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [u8; 5] = [b' ', b'\t', b'\r', b'\n', 0x07];

/// The tokens of one line, borrowed from that line.
///
/// The end of the list marks the end of the arguments; [`Tokens::to_argv`] produces
/// the NUL-terminated form the exec primitive needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens<'a> {
    words: Vec<&'a [u8]>,
}

impl<'a> Tokens<'a> {
    /// The command name, i.e. the first token.
    pub fn command(&self) -> Option<&'a [u8]> {
        self.words.first().copied()
    }

    pub fn as_slice(&self) -> &[&'a [u8]] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Convert to an argument vector of C strings, command name first.
    pub fn to_argv(&self) -> Result<Vec<CString>, NulError> {
        self.words.iter().map(|word| CString::new(*word)).collect()
    }

    #[cfg(test)]
    pub(crate) fn from_words<W: AsRef<[u8]> + ?Sized>(words: &[&'a W]) -> Self {
        Self {
            words: words.iter().map(|word| W::as_ref(*word)).collect(),
        }
    }
}

fn is_delimiter(byte: &u8) -> bool {
    DELIMITERS.contains(byte)
}

/// Split `line` into tokens.
///
/// Tokenization is naive: no quoting, escaping or expansion, and runs of
/// delimiters collapse into one boundary. An empty line, or one holding only
/// delimiters, yields no tokens.
pub fn split_into_tokens(line: &Line) -> Result<Tokens<'_>, ShellError> {
    let mut words = Vec::new();
    words.try_reserve_exact(TOKEN_BUFSIZE)?;

    for word in line.as_bytes().split(is_delimiter).filter(|w| !w.is_empty()) {
        if words.len() == words.capacity() {
            grow_by(&mut words, TOKEN_BUFSIZE)?;
        }
        words.push(word);
    }

    trace!(count = words.len(), "tokenized line");
    Ok(Tokens { words })
}
