//! Content-type and charset lookup by file extension

use std::path::Path;

/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("cjs", "application/javascript"),
    ("jsx", "text/jsx"),
    ("ts", "video/mp2t"),
    ("tsx", "text/tsx"),
    ("coffee", "text/coffeescript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("xml", "application/xml"),
    ("svg", "image/svg+xml"),
    ("yaml", "text/yaml"),
    ("yml", "text/yaml"),
    ("toml", "application/toml"),
    ("less", "text/less"),
    ("scss", "text/x-scss"),
    ("sass", "text/x-sass"),
    ("styl", "text/x-styl"),
    ("wasm", "application/wasm"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
];

/// Derive a content type from the extension of `path`
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_CONTENT_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Charset registered for a content type, if any
pub fn charset_for(content_type: &str) -> Option<&'static str> {
    if content_type.starts_with("text/") {
        Some("UTF-8")
    } else {
        None
    }
}

/// Encoding to read a file of `content_type` with
///
/// Falls back to UTF-8 for the application and XML families when no charset
/// is registered. `None` means the file is read as raw bytes.
pub fn encoding_for(content_type: &str) -> Option<&'static str> {
    charset_for(content_type).or_else(|| {
        (content_type.contains("application") || content_type.contains("xml")).then_some("UTF-8")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for(Path::new("/a/index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("/a/app.JS")), "application/javascript");
        assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
    }

    #[test]
    fn unknown_extension_defaults() {
        assert_eq!(content_type_for(Path::new("/a/Makefile")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("/a/x.unknownext")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn text_types_have_charset() {
        assert_eq!(charset_for("text/css"), Some("UTF-8"));
        assert_eq!(charset_for("application/json"), None);
    }

    #[test]
    fn application_and_xml_fall_back_to_utf8() {
        assert_eq!(encoding_for("application/javascript"), Some("UTF-8"));
        assert_eq!(encoding_for("image/svg+xml"), Some("UTF-8"));
        assert_eq!(encoding_for("image/png"), None);
        assert_eq!(encoding_for("font/woff2"), None);
    }
}
