use tracing::trace;

use crate::arena::{Arena, ValueId};
use crate::types::value::Value;
use crate::{Error, ParseOptions};

use super::parser::{parse_value_at, skip_insignificant};

/// Reads a stream of whitespace-separated values one at a time.
///
/// The scanner owns a copy of its input, so the caller's buffer may be
/// reused right after [`Scanner::init`]. Each call to [`Scanner::next`]
/// recycles the arena, which invalidates the previous value.
#[derive(Debug, Default)]
pub struct Scanner {
    input: String,
    pos: usize,
    arena: Arena,
    options: ParseOptions,
    current: Option<ValueId>,
    err: Option<Error>,
    done: bool,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Restarts the scanner on a copy of `text`.
    pub fn init(&mut self, text: &str) {
        self.input.clear();
        self.input.push_str(text);
        self.pos = 0;
        self.current = None;
        self.err = None;
        self.done = false;
        self.arena.reset();
    }

    /// Like [`Scanner::init`]; invalid UTF-8 surfaces from [`Scanner::error`]
    /// on the first call to [`Scanner::next`].
    pub fn init_bytes(&mut self, bytes: &[u8]) {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.init(text),
            Err(err) => {
                self.init("");
                self.err = Some(Error::utf8(err));
            }
        }
    }

    /// Advances to the next value. Returns false at end of input or on the
    /// first error; both are sticky until the next `init`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.current = None;
        if self.done || self.err.is_some() {
            return false;
        }
        let start = match skip_insignificant(&self.input, self.pos) {
            Ok(start) => start,
            Err(err) => {
                self.err = Some(err);
                return false;
            }
        };
        if start >= self.input.len() {
            self.pos = start;
            self.done = true;
            return false;
        }
        self.arena.reset();
        match parse_value_at(&self.input, start, &mut self.arena, &self.options) {
            Ok((value, end)) => {
                trace!(start, end, "scanned value");
                self.pos = end;
                self.current = Some(value);
                true
            }
            Err(err) => {
                self.err = Some(err);
                false
            }
        }
    }

    /// The error that stopped scanning. Reaching the end of input is not an
    /// error.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// The value produced by the last successful [`Scanner::next`].
    pub fn value(&self) -> Option<Value<'_>> {
        self.current.map(|id| self.arena.value(id))
    }
}
