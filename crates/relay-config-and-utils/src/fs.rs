//! Small filesystem helpers used around the exchange directory.

use crate::{CoreError, CoreResult};
use std::path::{Component, Path, PathBuf};

/// Characters that are not allowed in file names on the exchange host.
const ILLEGAL_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '>', '<', '|'];

/// Returns true if `path` exists and is a directory.
pub fn is_dir(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Returns true if `path` exists and is not a directory.
pub fn is_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| !m.is_dir()).unwrap_or(false)
}

/// Replace every character that is illegal in a file name with `_`.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILE_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Resolve a server-supplied relative path below `root`.
///
/// Absolute paths, drive prefixes and `..` components are rejected so that a
/// remote document can never be written outside the exchange directory.
/// Backslashes are treated as separators and every component is passed
/// through [`safe_file_name`].
pub fn resolve_within(root: &Path, relative: &str) -> CoreResult<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Path("empty relative path".to_string()));
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => resolved.push(safe_file_name(&part.to_string_lossy())),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CoreError::Path(format!(
                    "path {relative:?} escapes {}",
                    root.display()
                )));
            }
        }
    }

    if resolved == root {
        return Err(CoreError::Path(format!("path {relative:?} names no file")));
    }
    Ok(resolved)
}
