//! Plugin result shapes and their normalization

use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// A result as a plugin produced it
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Output text only
    Text(String),
    /// Positional `(data, dependencies, content type)`
    Triple(String, Vec<String>, Option<String>),
    /// Record with `code`/`data`, `deps` and `contentType` fields
    Record(Value),
}

impl RawOutput {
    pub fn triple(
        data: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        content_type: Option<&str>,
    ) -> Self {
        Self::Triple(
            data.into(),
            dependencies.into_iter().map(Into::into).collect(),
            content_type.map(str::to_string),
        )
    }
}

impl From<String> for RawOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RawOutput {
    fn from(value: Value) -> Self {
        Self::Record(value)
    }
}

/// The single internal shape every plugin result is reduced to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub data: String,
    pub dependencies: Vec<String>,
    pub content_type: Option<String>,
}

/// Reduce a plugin result to a [`TransformOutput`]
///
/// Malformed shapes degrade to empty output with a warning.
pub fn normalize(raw: RawOutput, path: &Path) -> TransformOutput {
    let out = match raw {
        RawOutput::Text(data) => TransformOutput {
            data,
            ..TransformOutput::default()
        },
        RawOutput::Triple(data, dependencies, content_type) => TransformOutput {
            data,
            dependencies,
            content_type,
        },
        RawOutput::Record(value) => from_value(value, path),
    };

    if out.data.is_empty() {
        warn!("Transpiler returned an empty source for {}", path.display());
    }
    out
}

fn from_value(value: Value, path: &Path) -> TransformOutput {
    match value {
        Value::String(data) => TransformOutput {
            data,
            ..TransformOutput::default()
        },
        Value::Array(items) => from_positional(items, path),
        Value::Object(map) => {
            let data = ["code", "data"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();
            let content_type = ["contentType", "content_type"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string);
            let dependencies = map
                .get("deps")
                .map(|deps| string_list(deps, path))
                .unwrap_or_default();
            TransformOutput {
                data,
                dependencies,
                content_type,
            }
        }
        other => {
            warn!(
                "Transform of {} returned an unsupported result shape: {}",
                path.display(),
                other
            );
            TransformOutput::default()
        }
    }
}

fn from_positional(items: Vec<Value>, path: &Path) -> TransformOutput {
    let mut items = items.into_iter();
    let data = match items.next() {
        Some(Value::String(s)) => s,
        Some(other) => {
            warn!("Transform of {} returned non-text data: {}", path.display(), other);
            String::new()
        }
        None => String::new(),
    };
    let dependencies = items
        .next()
        .map(|deps| string_list(&deps, path))
        .unwrap_or_default();
    let content_type = items.next().and_then(|ct| ct.as_str().map(str::to_string));
    TransformOutput {
        data,
        dependencies,
        content_type,
    }
}

fn string_list(value: &Value, path: &Path) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item.as_str() {
                Some(s) => Some(s.to_string()),
                None => {
                    warn!("Ignoring non-string dependency {} of {}", item, path.display());
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("Dependencies of {} are not a list: {}", path.display(), other);
            Vec::new()
        }
    }
}
