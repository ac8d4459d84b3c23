//! Line-buffered character source for the parser.
//!
//! The scanner holds one line at a time (with its trailing `\n`
//! retained, so the comment skipper can see line ends) and exposes a
//! one-character lookahead over it. File input is read lazily line by
//! line and the handle is dropped at end of input; string and byte
//! input is held whole in the buffer.
//!
//! Scanner operations never fail. When the parser needs a character
//! that is not there, it checks [`valid`](Scanner::valid) (or gets
//! `None`) and produces the error itself.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{RefJsonError, Result};

/// A character source with one-char lookahead and nonessential-input
/// skipping.
pub struct Scanner {
    reader: Option<BufReader<File>>,
    buffer: Vec<u8>,
    pos: Option<usize>,
    line: usize,
}

impl Scanner {
    /// Scan an in-memory string.
    pub fn from_string(input: impl Into<String>) -> Self {
        Scanner {
            reader: None,
            buffer: input.into().into_bytes(),
            pos: Some(0),
            line: 0,
        }
    }

    /// Scan a byte buffer, which must be valid UTF-8.
    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        match std::str::from_utf8(input) {
            Ok(text) => Ok(Self::from_string(text)),
            Err(_) => Err(RefJsonError::Parse {
                line: 1,
                column: 1,
                message: "input is not valid UTF-8".to_string(),
            }),
        }
    }

    /// Open a file and scan it line by line. The scanner owns the
    /// handle and drops it at end of input.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RefJsonError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scanner = Scanner {
            reader: Some(BufReader::new(file)),
            buffer: Vec::new(),
            pos: None,
            line: 0,
        };
        scanner.load_line();
        Ok(scanner)
    }

    /// Refill the buffer with the next line; on end of input the
    /// position becomes the exhausted sentinel and the handle is
    /// dropped. Read failures count as end of input.
    fn load_line(&mut self) {
        self.buffer.clear();
        self.pos = None;
        let Some(reader) = self.reader.as_mut() else {
            return;
        };
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.reader = None;
            }
            Ok(_) => {
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                self.buffer = line.into_bytes();
                self.pos = Some(0);
            }
        }
    }

    /// There is a current character.
    pub fn valid(&self) -> bool {
        matches!(self.pos, Some(pos) if pos < self.buffer.len())
    }

    /// The current character, if any.
    pub fn peek(&self) -> Option<u8> {
        self.pos.and_then(|pos| self.buffer.get(pos).copied())
    }

    /// Advance one character, refilling the buffer at line end.
    pub fn next(&mut self) {
        if let Some(pos) = self.pos {
            self.pos = Some(pos + 1);
            if pos + 1 >= self.buffer.len() {
                self.line += 1;
                self.load_line();
            }
        }
    }

    /// Consume and return the current character.
    pub fn get(&mut self) -> Option<u8> {
        let current = self.peek();
        if current.is_some() {
            self.next();
        }
        current
    }

    /// Non-consuming lookahead by one within the current line.
    pub fn check_ahead(&self, expected: u8) -> bool {
        match self.pos {
            Some(pos) => self.buffer.get(pos + 1) == Some(&expected),
            None => false,
        }
    }

    /// Skip ASCII whitespace and whole `//…` line comments,
    /// repeatedly, until a significant character or end of input.
    pub fn nonessential(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.next();
            }
            if self.peek() == Some(b'/') && self.check_ahead(b'/') {
                while let Some(c) = self.get() {
                    if c == b'\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    /// Skip nonessential input, consume one `separator` if present
    /// along with trailing nonessential input, and report whether it
    /// consumed.
    pub fn separator(&mut self, separator: u8) -> bool {
        self.nonessential();
        if self.peek() == Some(separator) {
            self.next();
            self.nonessential();
            true
        } else {
            false
        }
    }

    /// 0-based line of the current character.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column of the current character.
    pub fn column(&self) -> usize {
        self.pos.unwrap_or(0)
    }
}
