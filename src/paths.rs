use std::path::{Component, Path, PathBuf};

use crate::error::{PluginError, Result};

/// Lexically resolves `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Joins `parts` under `root` and fails with `PathTraversal` if the result
/// leaves it. `root` is expected to be absolute and normalized.
pub fn confined_join(root: &Path, parts: &[&str]) -> Result<PathBuf> {
    let mut joined = root.to_path_buf();
    for part in parts {
        joined.push(part);
    }
    let resolved = normalize(&joined);
    if !resolved.starts_with(root) {
        return Err(traversal(root, &joined.to_string_lossy()));
    }
    Ok(resolved)
}

/// Checks that a manifest value can serve as one directory segment once its
/// separators are neutralised. Any `..` component in the raw value is refused
/// outright, so `../../etc` never turns into a harmless-looking `.._.._etc`.
pub fn check_segment(root: &Path, raw: &str, sanitized: &str) -> Result<()> {
    let has_parent = raw.split(['/', '\\']).any(|c| c == "..");
    if has_parent || sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(traversal(root, raw));
    }
    Ok(())
}

fn traversal(root: &Path, attempted: &str) -> PluginError {
    PluginError::PathTraversal {
        root: root.to_path_buf(),
        attempted: attempted.to_string(),
    }
}
