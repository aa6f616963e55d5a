use std::fs;
use std::path::{Path, PathBuf};

use memchr::{memchr, memchr2, memmem};
use smallvec::SmallVec;
use tracing::debug;

use crate::arena::{Arena, Span, ValueId};
use crate::error::{start_end_string, Location};
use crate::num::number::is_valid_literal;
use crate::text::string::{is_name_char, is_name_start, unescape_into, UnescapeError};
use crate::types::value::Type;
use crate::{Error, IncludePolicy, ParseOptions, Result};

use super::include::resolve_pattern;

const INCLUDE_DIRECTIVE: &str = "@include";
const BOM: &str = "\u{feff}";

/// Parses a whole document into `arena` and returns its root object.
pub(crate) fn parse_document(
    src: &str,
    arena: &mut Arena,
    options: &ParseOptions,
    base_dir: Option<PathBuf>,
) -> Result<ValueId> {
    let mut cursor = Cursor::new(src, arena, options, base_dir);
    cursor.parse_document()
}

/// Parses exactly one value starting at `pos`. Returns the value and the
/// offset just past it.
pub(crate) fn parse_value_at(
    src: &str,
    pos: usize,
    arena: &mut Arena,
    options: &ParseOptions,
) -> Result<(ValueId, usize)> {
    let mut cursor = Cursor::new(src, arena, options, None);
    cursor.pos = pos;
    let value = cursor.parse_value()?;
    Ok((value, cursor.pos))
}

/// Skips whitespace and comments from `pos`.
pub(crate) fn skip_insignificant(src: &str, mut pos: usize) -> Result<usize> {
    let bytes = src.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' => pos += 1,
            b'#' => pos = line_end(bytes, pos),
            b'/' if bytes.get(pos + 1) == Some(&b'/') => pos = line_end(bytes, pos),
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                match memmem::find(&bytes[pos + 2..], b"*/") {
                    Some(offset) => pos += offset + 4,
                    None => return Err(syntax_error(src, pos, "unterminated comment")),
                }
            }
            _ => break,
        }
    }
    Ok(pos)
}

fn line_end(bytes: &[u8], pos: usize) -> usize {
    memchr(b'\n', &bytes[pos..]).map_or(bytes.len(), |offset| pos + offset + 1)
}

fn syntax_error(src: &str, pos: usize, message: &str) -> Error {
    let tail = src.get(pos..).unwrap_or("");
    Error::syntax(format!(
        "cannot parse config: {message}; unparsed tail: {:?}",
        start_end_string(tail)
    ))
    .with_location(Location::from_offset(src, pos))
}

#[derive(Debug, Clone, Copy)]
enum Container {
    Object(ValueId),
    Array(ValueId),
}

enum Name<'s> {
    /// Bare name, possibly dotted.
    Path(&'s str),
    /// Quoted name, unescaped into the arena buffer.
    Quoted(Span),
    /// Quoted name already held by the enclosing group, at this position.
    Existing(usize),
}

struct Cursor<'s, 'a> {
    src: &'s str,
    pos: usize,
    arena: &'a mut Arena,
    options: &'a ParseOptions,
    base_dir: Option<PathBuf>,
    depth: usize,
    include_depth: usize,
}

impl<'s, 'a> Cursor<'s, 'a> {
    fn new(
        src: &'s str,
        arena: &'a mut Arena,
        options: &'a ParseOptions,
        base_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            src,
            pos: 0,
            arena,
            options,
            base_dir,
            depth: 0,
            include_depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> Result<()> {
        self.pos = skip_insignificant(self.src, self.pos)?;
        Ok(())
    }

    fn error(&self, message: &str) -> Error {
        syntax_error(self.src, self.pos, message)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.error(&format!(
                "too big depth for nested config; exceeds {}",
                self.options.max_depth
            )));
        }
        Ok(())
    }

    fn parse_document(&mut self) -> Result<ValueId> {
        if self.src.starts_with(BOM) {
            self.pos = BOM.len();
        }
        self.skip_ws()?;
        if self.peek() == Some(b'{') {
            let root = self.parse_value()?;
            self.skip_ws()?;
            if self.pos < self.src.len() {
                return Err(self.error("unexpected trailing content after root group"));
            }
            return Ok(root);
        }
        let root = self.arena.new_object();
        self.parse_settings(root, None)?;
        Ok(root)
    }

    /// Parses settings into `object` until `closing` (consumed) or, when
    /// `closing` is `None`, until end of input.
    fn parse_settings(&mut self, object: ValueId, closing: Option<u8>) -> Result<()> {
        loop {
            self.skip_ws()?;
            match self.peek() {
                None if closing.is_none() => return Ok(()),
                None => return Err(self.error("missing '}' at end of group")),
                Some(byte) if Some(byte) == closing => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'@') => self.parse_include(Container::Object(object))?,
                Some(b'}' | b')' | b']') => {
                    return Err(self.error("unbalanced closing delimiter"));
                }
                Some(_) => self.parse_setting(object)?,
            }
        }
    }

    fn parse_setting(&mut self, object: ValueId) -> Result<()> {
        let name = self.parse_name(object)?;
        self.skip_ws()?;
        match self.peek() {
            Some(b'=' | b':') => self.pos += 1,
            _ => return Err(self.error("missing '=' or ':' after setting name")),
        }
        self.skip_ws()?;
        let value = self.parse_value()?;
        self.assign(object, name, value);
        self.skip_ws()?;
        match self.peek() {
            Some(b';' | b',') => self.pos += 1,
            _ if self.options.strict => return Err(self.error("missing ';' after setting")),
            _ => {}
        }
        Ok(())
    }

    fn parse_name(&mut self, object: ValueId) -> Result<Name<'s>> {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.pos;
        match self.peek() {
            Some(b'"') => {
                let begin = self.arena.buf.len();
                let (raw, body) = self.scan_quoted()?;
                self.unescape_raw(raw, body)?;
                let span = Span {
                    start: begin,
                    end: self.arena.buf.len(),
                };
                match self.arena.pair_index(object, self.arena.text(span)).flatten() {
                    Some(index) => {
                        self.arena.buf.truncate(begin);
                        Ok(Name::Existing(index))
                    }
                    None => Ok(Name::Quoted(span)),
                }
            }
            Some(byte) if is_name_start(byte) => {
                let mut end = start;
                while end < bytes.len() && (is_name_char(bytes[end]) || bytes[end] == b'.') {
                    end += 1;
                }
                let name = &src[start..end];
                let well_formed = name.split('.').all(|segment| {
                    segment
                        .as_bytes()
                        .first()
                        .is_some_and(|&first| is_name_start(first))
                });
                if !well_formed {
                    return Err(self.error("invalid setting name"));
                }
                self.pos = end;
                Ok(Name::Path(name))
            }
            _ => Err(self.error("expected setting name")),
        }
    }

    fn assign(&mut self, object: ValueId, name: Name<'s>, value: ValueId) {
        match name {
            Name::Quoted(span) => self.insert_pair(object, None, |_| span, value),
            Name::Existing(index) => {
                self.insert_pair(object, Some(index), |_| Span::default(), value)
            }
            Name::Path(path) => {
                let segments: SmallVec<[&str; 4]> = path.split('.').collect();
                let Some((last, parents)) = segments.split_last() else {
                    return;
                };
                let mut target = object;
                for segment in parents {
                    target = self.descend(target, segment);
                }
                let index = self.arena.pair_index(target, last).flatten();
                self.insert_pair(target, index, |arena| arena.push_text(last), value);
            }
        }
    }

    /// Returns the group stored under `key`, replacing a non-group entry or
    /// creating the group when absent.
    fn descend(&mut self, object: ValueId, key: &str) -> ValueId {
        match self.arena.pair_index(object, key).flatten() {
            Some(index) => {
                let existing = self
                    .arena
                    .pair_value(object, index)
                    .unwrap_or(ValueId::NULL);
                if self.arena.value(existing).value_type() == Type::Object {
                    return existing;
                }
                let fresh = self.arena.new_object();
                self.arena.replace_pair_value(object, index, fresh);
                fresh
            }
            None => {
                let fresh = self.arena.new_object();
                let key = self.arena.push_text(key);
                self.arena.push_pair(object, key, fresh);
                fresh
            }
        }
    }

    fn insert_pair(
        &mut self,
        object: ValueId,
        index: Option<usize>,
        key: impl FnOnce(&mut Arena) -> Span,
        value: ValueId,
    ) {
        match index {
            Some(index) => self.arena.replace_pair_value(object, index, value),
            None => {
                let key = key(&mut *self.arena);
                self.arena.push_pair(object, key, value);
            }
        }
    }

    fn parse_value(&mut self) -> Result<ValueId> {
        match self.peek() {
            None => Err(self.error("unexpected end of input; expected a value")),
            Some(b'{') => {
                self.enter()?;
                self.pos += 1;
                let object = self.arena.new_object();
                self.parse_settings(object, Some(b'}'))?;
                self.depth -= 1;
                Ok(object)
            }
            Some(b'(') => self.parse_sequence(b')', false),
            Some(b'[') => self.parse_sequence(b']', self.options.strict),
            Some(b'"') => self.parse_string(),
            Some(b'0'..=b'9' | b'+' | b'-' | b'.') => self.parse_number(),
            Some(byte) if is_name_start(byte) => self.parse_keyword(),
            Some(_) => Err(self.error("unexpected token")),
        }
    }

    fn parse_sequence(&mut self, closing: u8, homogeneous: bool) -> Result<ValueId> {
        self.enter()?;
        self.pos += 1;
        let array = self.arena.new_array();
        self.parse_elements(array, Some(closing))?;
        if homogeneous {
            self.check_homogeneous(array)?;
        }
        self.depth -= 1;
        Ok(array)
    }

    /// Parses comma-separated elements into `array`. A trailing comma is
    /// accepted.
    fn parse_elements(&mut self, array: ValueId, closing: Option<u8>) -> Result<()> {
        loop {
            self.skip_ws()?;
            match self.peek() {
                None => return self.end_of_elements(closing),
                Some(byte) if Some(byte) == closing => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'@') => self.parse_include(Container::Array(array))?,
                Some(_) => {
                    let value = self.parse_value()?;
                    self.arena.push(array, value);
                }
            }
            self.skip_ws()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(byte) if Some(byte) == closing => {}
                None => return self.end_of_elements(closing),
                Some(_) => return Err(self.error("missing ',' between list elements")),
            }
        }
    }

    fn end_of_elements(&self, closing: Option<u8>) -> Result<()> {
        match closing {
            None => Ok(()),
            Some(byte) => Err(self.error(&format!(
                "missing '{}' at end of list",
                byte as char
            ))),
        }
    }

    fn check_homogeneous(&self, array: ValueId) -> Result<()> {
        let Some(items) = self.arena.value(array).array() else {
            return Ok(());
        };
        let mut expected = None;
        for item in items.iter() {
            let kind = match item.value_type() {
                Type::True | Type::False => Type::True,
                kind @ (Type::Number | Type::String) => kind,
                _ => return Err(self.error("array elements must be scalar values")),
            };
            if *expected.get_or_insert(kind) != kind {
                return Err(self.error("array elements must share one type"));
            }
        }
        Ok(())
    }

    /// Scans the quoted literal at the cursor. Returns the raw body and its
    /// offset in the source; the cursor ends past the closing quote.
    fn scan_quoted(&mut self) -> Result<(&'s str, usize)> {
        let src = self.src;
        let bytes = src.as_bytes();
        let open = self.pos;
        let mut idx = open + 1;
        loop {
            let found = bytes
                .get(idx..)
                .and_then(|rest| memchr2(b'"', b'\\', rest));
            let Some(offset) = found else {
                return Err(self.error("unterminated string"));
            };
            let pos = idx + offset;
            if bytes[pos] == b'\\' {
                idx = pos + 2;
                continue;
            }
            self.pos = pos + 1;
            return Ok((&src[open + 1..pos], open + 1));
        }
    }

    fn unescape_raw(&mut self, raw: &str, body: usize) -> Result<()> {
        let src = self.src;
        unescape_into(&mut self.arena.buf, raw).map_err(|err| unescape_error(src, err, body))
    }

    /// Parses a string literal, concatenating adjacent literals.
    fn parse_string(&mut self) -> Result<ValueId> {
        let start = self.arena.buf.len();
        loop {
            let (raw, body) = self.scan_quoted()?;
            self.unescape_raw(raw, body)?;
            let after = self.pos;
            self.skip_ws()?;
            if self.peek() != Some(b'"') {
                self.pos = after;
                break;
            }
        }
        let span = Span {
            start,
            end: self.arena.buf.len(),
        };
        Ok(self.arena.new_parsed_string(span))
    }

    fn parse_number(&mut self) -> Result<ValueId> {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.pos;
        let mut end = start;
        if matches!(bytes[end], b'+' | b'-') {
            end += 1;
        }
        let digits_start = end;
        while end < bytes.len() {
            let byte = bytes[end];
            let exponent_sign = matches!(byte, b'+' | b'-')
                && matches!(bytes[end - 1], b'e' | b'E')
                && !is_hex_prefixed(&bytes[digits_start..end]);
            if byte.is_ascii_alphanumeric() || byte == b'.' || exponent_sign {
                end += 1;
            } else {
                break;
            }
        }
        let token = &src[start..end];
        if !is_valid_literal(token) {
            return Err(self.error(&format!("cannot parse number {token:?}")));
        }
        let span = self.arena.push_text(token);
        self.pos = end;
        Ok(self.arena.new_parsed_number(span))
    }

    fn parse_keyword(&mut self) -> Result<ValueId> {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.pos;
        let mut end = start;
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
        let word = &src[start..end];
        let value = if word.eq_ignore_ascii_case("true") {
            ValueId::TRUE
        } else if word.eq_ignore_ascii_case("false") {
            ValueId::FALSE
        } else if word == "null" {
            ValueId::NULL
        } else {
            return Err(self.error(&format!("unexpected identifier {word:?}; expected a value")));
        };
        self.pos = end;
        Ok(value)
    }

    fn parse_include(&mut self, container: Container) -> Result<()> {
        let src = self.src;
        let at = self.pos;
        let known = src[at..].starts_with(INCLUDE_DIRECTIVE)
            && !src
                .as_bytes()
                .get(at + INCLUDE_DIRECTIVE.len())
                .is_some_and(|&byte| is_name_char(byte));
        if !known {
            return Err(self.error("unknown directive"));
        }
        self.pos += INCLUDE_DIRECTIVE.len();
        self.skip_ws()?;
        if self.peek() != Some(b'"') {
            return Err(self.error("missing quoted file pattern after @include"));
        }
        let (raw, body) = self.scan_quoted()?;
        let mut pattern = String::with_capacity(raw.len());
        unescape_into(&mut pattern, raw).map_err(|err| unescape_error(src, err, body))?;
        let after = self.pos;
        self.skip_ws()?;
        if self.peek() == Some(b';') {
            self.pos += 1;
        } else {
            self.pos = after;
        }
        self.splice_include(&pattern, container, at)
    }

    /// Parses every file matching `pattern`, in sorted order, straight into
    /// `container` as if its content had been written at the directive.
    fn splice_include(&mut self, pattern: &str, container: Container, at: usize) -> Result<()> {
        let location = Location::from_offset(self.src, at);
        if self.include_depth >= self.options.max_include_depth {
            return Err(Error::include(format!(
                "cannot resolve @include {pattern:?}: include depth exceeds {}",
                self.options.max_include_depth
            ))
            .with_location(location));
        }
        let base_dir = self
            .options
            .include_dir
            .as_deref()
            .or(self.base_dir.as_deref());
        let files = resolve_pattern(pattern, base_dir);
        debug!(pattern, matches = files.len(), "resolved include");
        if files.is_empty() && (self.options.require_include_match || !pattern.contains('*')) {
            return Err(Error::include(format!(
                "cannot resolve @include {pattern:?}: no matching files"
            ))
            .with_location(location));
        }
        for path in &files {
            let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
            let text = std::str::from_utf8(&bytes).map_err(|err| Error::utf8(err).in_file(path))?;
            debug!(path = %path.display(), "splicing include");
            let nested_base = match self.options.include_dir {
                Some(_) => None,
                None => path.parent().map(Path::to_path_buf),
            };
            let mut nested = Cursor {
                src: text,
                pos: 0,
                arena: &mut *self.arena,
                options: self.options,
                base_dir: nested_base,
                depth: self.depth,
                include_depth: self.include_depth + 1,
            };
            nested
                .splice(container)
                .map_err(|err| err.in_file(path))?;
        }
        Ok(())
    }

    fn splice(&mut self, container: Container) -> Result<()> {
        if self.src.starts_with(BOM) {
            self.pos = BOM.len();
        }
        match container {
            Container::Array(array) => self.parse_elements(array, None),
            Container::Object(object) => match self.options.include_policy {
                IncludePolicy::LastWriteWins => self.parse_settings(object, None),
                IncludePolicy::HostWins => {
                    let fragment = self.arena.new_object();
                    self.parse_settings(fragment, None)?;
                    self.arena.merge_absent(object, fragment);
                    Ok(())
                }
            },
        }
    }
}

fn is_hex_prefixed(digits: &[u8]) -> bool {
    digits.len() >= 2 && digits[0] == b'0' && matches!(digits[1], b'x' | b'X')
}

fn unescape_error(src: &str, err: UnescapeError, body: usize) -> Error {
    let (offset, message) = match err {
        UnescapeError::InvalidEscape(offset) => (offset, "invalid escape sequence in string"),
        UnescapeError::InvalidUtf8(offset) => (offset, "escaped bytes are not valid utf-8"),
    };
    syntax_error(src, body + offset, message)
}
