//! Transform specs, selection and dispatch
//!
//! Specs are tried in order and the first one whose test matches a path is
//! the only one applied; transforms do not chain.

pub mod completion;
pub mod dispatch;
pub mod output;
pub mod plugin;

pub use completion::Completion;
pub use output::{normalize, RawOutput, TransformOutput};
pub use plugin::{
    from_async, from_callback, from_file_fn, from_fn, CommandTransform, InputMode, PluginError,
    PluginReturn, Transform, TransformContext, TransformInput,
};

use crate::pattern::{base_name, compile_glob, PathPredicate};
use globset::GlobMatcher;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// One way of matching a path against a transform spec
#[derive(Clone)]
pub enum TransformTest {
    /// Tested against the full path
    Regex(Regex),
    /// Invoked with the full path
    Predicate(PathPredicate),
    /// Glob against the base name, then the full path, then a verbatim regex
    Pattern {
        source: String,
        glob: Option<GlobMatcher>,
        regex: Option<Regex>,
    },
}

impl TransformTest {
    /// String test; parts that fail to compile never match
    pub fn pattern(pattern: &str) -> Self {
        Self::Pattern {
            source: pattern.to_string(),
            glob: compile_glob(pattern).ok(),
            regex: Regex::new(pattern).ok(),
        }
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Test a `/`-separated path
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(path),
            Self::Predicate(f) => f(path),
            Self::Pattern { glob, regex, .. } => {
                glob.as_ref()
                    .is_some_and(|g| g.is_match(base_name(path)) || g.is_match(path))
                    || regex.as_ref().is_some_and(|re| re.is_match(path))
            }
        }
    }
}

impl fmt::Debug for TransformTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Pattern { source, .. } => write!(f, "Pattern({source:?})"),
        }
    }
}

impl From<Regex> for TransformTest {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<&str> for TransformTest {
    fn from(pattern: &str) -> Self {
        Self::pattern(pattern)
    }
}

/// A configured transform
#[derive(Clone)]
pub struct TransformSpec {
    /// Matches when any test matches
    pub test: Vec<TransformTest>,
    pub plugin: Arc<dyn Transform>,
    /// Passed to the plugin through [`TransformContext::options`]
    pub options: Option<Value>,
    /// Used when the plugin reports no content type
    pub content_type: Option<String>,
    /// Hand the plugin a snapshot of the store's raw content
    pub cache: bool,
    pub name: Option<String>,
}

impl TransformSpec {
    pub fn new(test: impl Into<TransformTest>, plugin: Arc<dyn Transform>) -> Self {
        Self {
            test: vec![test.into()],
            plugin,
            options: None,
            content_type: None,
            cache: false,
            name: None,
        }
    }

    pub fn or_test(mut self, test: impl Into<TransformTest>) -> Self {
        self.test.push(test.into());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.test.iter().any(|t| t.matches(path))
    }
}

impl fmt::Debug for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSpec")
            .field("test", &self.test)
            .field("options", &self.options)
            .field("content_type", &self.content_type)
            .field("cache", &self.cache)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Specs whose test matches `path`, in configured order
pub fn get_transpilers<'a>(specs: &'a [TransformSpec], path: &Path) -> Vec<&'a TransformSpec> {
    let path = slash_path(path);
    specs.iter().filter(|s| s.matches(&path)).collect()
}

/// The spec applied to `path`: the first match
pub fn select<'a>(specs: &'a [TransformSpec], path: &Path) -> Option<&'a TransformSpec> {
    let path = slash_path(path);
    specs.iter().find(|s| s.matches(&path))
}

fn slash_path(path: &Path) -> String {
    crate::paths::to_slashes(&path.to_string_lossy())
}
