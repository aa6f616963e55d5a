use std::path::PathBuf;

pub const DEFAULT_MAX_DEPTH: usize = 300;
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;

/// How a setting spliced in from an included file interacts with a key the
/// enclosing group already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludePolicy {
    /// Included settings overwrite earlier keys in place, and later keys in
    /// the host overwrite included ones. Same rule as a duplicate key.
    #[default]
    LastWriteWins,
    /// An included setting never replaces a key that is already present.
    HostWins,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub max_include_depth: usize,
    pub include_dir: Option<PathBuf>,
    pub include_policy: IncludePolicy,
    pub strict: bool,
    pub require_include_match: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }

    pub fn with_include_dir(mut self, include_dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(include_dir.into());
        self
    }

    pub fn with_include_policy(mut self, include_policy: IncludePolicy) -> Self {
        self.include_policy = include_policy;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_require_include_match(mut self, require: bool) -> Self {
        self.require_include_match = require;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            include_dir: None,
            include_policy: IncludePolicy::default(),
            strict: false,
            require_include_match: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(options.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
        assert_eq!(options.include_policy, IncludePolicy::LastWriteWins);
        assert!(options.include_dir.is_none());
        assert!(!options.strict);
        assert!(!options.require_include_match);
    }

    #[rstest::rstest]
    fn test_builder_chain() {
        let options = ParseOptions::new()
            .with_max_depth(4)
            .with_include_dir("/etc/app")
            .with_include_policy(IncludePolicy::HostWins)
            .with_strict(true);
        assert_eq!(options.max_depth, 4);
        assert_eq!(options.include_dir, Some(PathBuf::from("/etc/app")));
        assert_eq!(options.include_policy, IncludePolicy::HostWins);
        assert!(options.strict);
    }
}
