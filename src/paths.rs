//! Lexical path helpers; nothing here touches the filesystem

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without following symlinks
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Anchor a relative `path` at the working directory, then normalize
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// `path` relative to `base`, `/`-separated, with `..` where `path` is outside
pub fn relative_to(path: &Path, base: &Path) -> String {
    let path = normalize(path);
    let base = normalize(base);

    let ours: Vec<_> = path.components().collect();
    let theirs: Vec<_> = base.components().collect();
    let common = ours
        .iter()
        .zip(theirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); theirs.len() - common];
    parts.extend(
        ours[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    to_slashes(&parts.join("/"))
}

/// Replace Windows separators with `/`
pub fn to_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn absolute_anchors_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("a/./b")), normalize(&cwd.join("a/b")));
        assert_eq!(absolute(Path::new("/x/../y")), PathBuf::from("/y"));
    }

    #[test]
    fn relative_inside_base() {
        assert_eq!(relative_to(Path::new("/proj/src/app.ts"), Path::new("/proj")), "src/app.ts");
        assert_eq!(relative_to(Path::new("/proj"), Path::new("/proj")), "");
    }

    #[test]
    fn relative_outside_base() {
        assert_eq!(relative_to(Path::new("/lib/x.js"), Path::new("/proj/site")), "../../lib/x.js");
    }
}
