//! Path patterns for skip lists and transform tests
//!
//! A pattern is a glob, a regular expression, or a predicate. Globs follow
//! shell rules where `*` stops at `/`; a glob without any `/` is also tried
//! against the last path component, so `*.log` matches `logs/debug.log`.

use crate::error::{WatchStoreError, WatchStoreResult};
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Predicate invoked with a `/`-separated path
pub type PathPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single path pattern
#[derive(Clone)]
pub enum Pattern {
    Glob { source: String, matcher: GlobMatcher },
    Regex(Regex),
    Predicate(PathPredicate),
}

impl Pattern {
    /// Compile a glob pattern
    pub fn glob(pattern: &str) -> WatchStoreResult<Self> {
        Ok(Self::Glob {
            source: pattern.to_string(),
            matcher: compile_glob(pattern)?,
        })
    }

    /// Compile a regular expression
    pub fn regex(pattern: &str) -> WatchStoreResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| WatchStoreError::Pattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Wrap a predicate
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Test a `/`-separated path
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Glob { source, matcher } => {
                matcher.is_match(path)
                    || (!source.contains('/') && matcher.is_match(base_name(path)))
            }
            Self::Regex(re) => re.is_match(path),
            Self::Predicate(f) => f(path),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glob { source, .. } => write!(f, "Glob({source:?})"),
            Self::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// Ordered set of patterns; matches when any member matches
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of globs
    pub fn from_globs<I, S>(globs: I) -> WatchStoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = globs
            .into_iter()
            .map(|g| Pattern::glob(g.as_ref()))
            .collect::<WatchStoreResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Add a pattern, builder style
    pub fn with(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any pattern matches; an empty set never matches
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

pub(crate) fn compile_glob(pattern: &str) -> WatchStoreResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| WatchStoreError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_stays_in_segment() {
        let p = Pattern::glob("src/*.js").unwrap();
        assert!(p.matches("src/app.js"));
        assert!(!p.matches("src/lib/app.js"));
    }

    #[test]
    fn slashless_glob_matches_base_name() {
        let p = Pattern::glob("*.log").unwrap();
        assert!(p.matches("debug.log"));
        assert!(p.matches("logs/debug.log"));
        assert!(!p.matches("debug.txt"));
    }

    #[test]
    fn double_star_crosses_directories() {
        let p = Pattern::glob("node_modules/**").unwrap();
        assert!(p.matches("node_modules/react/index.js"));
        assert!(!p.matches("src/node_modules.js"));
    }

    #[test]
    fn regex_and_predicate() {
        let set = PatternSet::new()
            .with(Pattern::regex(r"\.tmp$").unwrap())
            .with(Pattern::predicate(|p| p.starts_with("cache/")));
        assert!(set.matches("a/b.tmp"));
        assert!(set.matches("cache/x.js"));
        assert!(!set.matches("src/x.js"));
    }

    #[test]
    fn empty_set_never_matches() {
        assert!(!PatternSet::new().matches("anything"));
    }

    #[test]
    fn invalid_glob_is_error() {
        let err = Pattern::glob("a[").unwrap_err();
        assert!(matches!(err, WatchStoreError::Pattern { .. }));
    }
}
