use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::arena::Arena;
use crate::types::value::Value;
use crate::{Error, ParseOptions, Result};

pub mod include;
mod parser;
pub(crate) mod pool;
mod scanner;

pub use scanner::Scanner;

/// Reusable config parser.
///
/// A parser owns the arena its results live in, so the [`Value`] returned by
/// a parse borrows the parser and is invalidated by the next parse. Parsers
/// are cheap to keep around; capacity grown by one parse is reused by the
/// next. A parser is not meant to be shared between threads; use
/// [`crate::ParserPool`] for that.
#[derive(Debug, Default)]
pub struct Parser {
    arena: Arena,
    options: ParseOptions,
    source: String,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    /// Drops the previous result while keeping allocated capacity.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.source.clear();
    }

    /// Parses `text` as a document. Includes resolve against the configured
    /// include directory, or the working directory when none is set.
    pub fn parse(&mut self, text: &str) -> Result<Value<'_>> {
        let base_dir = self.options.include_dir.clone();
        self.arena.reset();
        match parser::parse_document(text, &mut self.arena, &self.options, base_dir) {
            Ok(root) => Ok(self.arena.value(root)),
            Err(err) => {
                self.arena.reset();
                Err(err)
            }
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<Value<'_>> {
        let text = std::str::from_utf8(bytes).map_err(Error::utf8)?;
        self.parse(text)
    }

    /// Reads `reader` to the end and parses the result.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<Value<'_>> {
        let mut source = std::mem::take(&mut self.source);
        source.clear();
        let result = reader.read_to_string(&mut source);
        self.source = source;
        if let Err(err) = result {
            return Err(Error::read(err));
        }
        let base_dir = self.options.include_dir.clone();
        self.arena.reset();
        match parser::parse_document(&self.source, &mut self.arena, &self.options, base_dir) {
            Ok(root) => Ok(self.arena.value(root)),
            Err(err) => {
                self.arena.reset();
                Err(err)
            }
        }
    }

    /// Reads and parses the file at `path`. Relative includes resolve against
    /// the file's directory unless an include directory is configured.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Value<'_>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "parsing config file");
        let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
        let text = std::str::from_utf8(&bytes).map_err(|err| Error::utf8(err).in_file(path))?;
        let base_dir = match &self.options.include_dir {
            Some(dir) => Some(dir.clone()),
            None => path.parent().map(Path::to_path_buf),
        };
        self.arena.reset();
        match parser::parse_document(text, &mut self.arena, &self.options, base_dir) {
            Ok(root) => Ok(self.arena.value(root)),
            Err(err) => {
                self.arena.reset();
                Err(err.in_file(path))
            }
        }
    }
}
