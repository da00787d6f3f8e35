//! Cached file records

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File content held by the store
///
/// Backed by `Arc` so entries can be handed out by value without copying
/// file contents.
#[derive(Clone, PartialEq, Eq)]
pub enum FileData {
    Text(Arc<str>),
    Binary(Arc<[u8]>),
}

impl FileData {
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Text content, `None` for binary data
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "Text({} bytes)", text.len()),
            Self::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
        }
    }
}

impl From<String> for FileData {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for FileData {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

/// What the store currently believes about one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Resolved absolute path, the store key
    pub path: PathBuf,

    /// Path relative to the configured base, `/`-separated
    pub relative_path: String,

    /// Content type from the transform or derived from the path
    pub content_type: String,

    /// File content, kept when caching is enabled
    pub raw_data: Option<FileData>,

    /// Transform output when a transform matched
    pub transpiled_data: Option<Arc<str>>,

    /// Paths the transform output was derived from, in reported order
    pub dependencies: Vec<PathBuf>,

    /// Set when produced for an explicit `get_file` call
    pub requested: bool,
}

impl FileEntry {
    /// Transpiled output as data if present, else the raw content
    pub fn data(&self) -> Option<FileData> {
        match &self.transpiled_data {
            Some(out) => Some(FileData::Text(out.clone())),
            None => self.raw_data.clone(),
        }
    }

    pub fn is_transpiled(&self) -> bool {
        self.transpiled_data.is_some()
    }

    pub fn depends_on(&self, path: &Path) -> bool {
        self.dependencies.iter().any(|d| d == path)
    }
}

/// Content handed to the store for one path
#[derive(Debug, Clone, Default)]
pub struct StoreWrite {
    pub raw: Option<FileData>,
    pub transpiled: Option<Arc<str>>,
    pub content_type: Option<String>,
}

impl StoreWrite {
    /// Plain file content
    pub fn raw(data: FileData) -> Self {
        Self {
            raw: Some(data),
            ..Self::default()
        }
    }
}

/// Result of a store write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// A new entry replaced whatever was stored before
    Written(FileEntry),
    /// The stored entry already holds identical content
    Unchanged,
}

impl WriteOutcome {
    pub fn into_entry(self) -> Option<FileEntry> {
        match self {
            Self::Written(entry) => Some(entry),
            Self::Unchanged => None,
        }
    }
}
