use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file could not be read.
    Io,
    /// Malformed input: bad token, unbalanced delimiter, bad literal.
    Syntax,
    /// An include directive could not be resolved.
    Include,
    /// Input bytes are not valid UTF-8.
    Utf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Computes the 1-based line and column of `offset` inside `input`.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let head = &input.as_bytes()[..offset];
        let line = memchr::memchr_iter(b'\n', head).count() + 1;
        let line_start = memchr::memrchr(b'\n', head).map_or(0, |idx| idx + 1);
        Self {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
    pub path: Option<PathBuf>,
    #[source]
    source: Option<Arc<io::Error>>,
}

impl Error {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            location: None,
            path: None,
            source: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message.into())
    }

    pub fn include(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Include, message.into())
    }

    pub fn utf8(err: std::str::Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8, format!("invalid utf-8: {err}"))
    }

    pub fn io(path: &Path, err: io::Error) -> Self {
        let mut error = Self::new(
            ErrorKind::Io,
            format!("cannot read {}: {err}", path.display()),
        );
        error.path = Some(path.to_path_buf());
        error.source = Some(Arc::new(err));
        error
    }

    /// Read failure on a stream that has no path.
    pub fn read(err: io::Error) -> Self {
        let mut error = Self::new(ErrorKind::Io, format!("read failed: {err}"));
        error.source = Some(Arc::new(err));
        error
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches the file the error was found in, keeping an already-set path
    /// so the innermost include wins.
    pub fn in_file(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_path_buf());
        }
        self
    }

    pub fn is_io(&self) -> bool {
        self.kind == ErrorKind::Io
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax | ErrorKind::Include)
    }
}

pub(crate) const MAX_START_END_STRING_LEN: usize = 80;
const START_END_HALF: usize = MAX_START_END_STRING_LEN / 2;

/// Bounded preview of `s` for diagnostics: long inputs keep their first and
/// last 40 bytes around a `...` marker.
pub(crate) fn start_end_string(s: &str) -> String {
    if s.len() <= MAX_START_END_STRING_LEN {
        return s.to_string();
    }
    let mut head = START_END_HALF;
    while !s.is_char_boundary(head) {
        head -= 1;
    }
    let mut tail = s.len() - START_END_HALF;
    while !s.is_char_boundary(tail) {
        tail += 1;
    }
    format!("{}...{}", &s[..head], &s[tail..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alphabet(n: usize) -> String {
        (0..n).map(|i| (b'a' + (i % 26) as u8) as char).collect()
    }

    #[rstest]
    #[case("", "")]
    #[case("foo", "foo")]
    fn test_start_end_string_short(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(start_end_string(input), expected);
    }

    #[rstest]
    fn test_start_end_string_limits() {
        let exact = alphabet(MAX_START_END_STRING_LEN);
        assert_eq!(start_end_string(&exact), exact);

        assert_eq!(
            start_end_string(&alphabet(MAX_START_END_STRING_LEN + 1)),
            "abcdefghijklmnopqrstuvwxyzabcdefghijklmn...pqrstuvwxyzabcdefghijklmnopqrstuvwxyzabc"
        );
        assert_eq!(
            start_end_string(&alphabet(100 * MAX_START_END_STRING_LEN)),
            "abcdefghijklmnopqrstuvwxyzabcdefghijklmn...efghijklmnopqrstuvwxyzabcdefghijklmnopqr"
        );
    }

    #[rstest]
    fn test_start_end_string_multibyte() {
        let s = "é".repeat(60);
        let preview = start_end_string(&s);
        assert!(preview.contains("..."));
        assert!(preview.len() <= MAX_START_END_STRING_LEN + 3);
    }

    #[rstest]
    #[case("abc", 0, 1, 1)]
    #[case("abc", 2, 1, 3)]
    #[case("a\nbc", 3, 2, 2)]
    #[case("a\n\nx", 3, 3, 1)]
    fn test_location_from_offset(
        #[case] input: &str,
        #[case] offset: usize,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        let location = Location::from_offset(input, offset);
        assert_eq!(location.line, line);
        assert_eq!(location.column, column);
    }

    #[rstest]
    fn test_io_error_is_distinct() {
        let err = Error::io(
            Path::new("missing.cfg"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_io());
        assert!(!err.is_syntax());
        assert!(std::error::Error::source(&err).is_some());
        assert!(Error::syntax("x").is_syntax());
        assert!(Error::include("x").is_syntax());
    }
}
