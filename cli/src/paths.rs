//! Absolute path resolution for command arguments.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` without requiring it to exist.
///
/// Relative paths are joined onto `base` and walked one component at a time.
/// Every prefix that exists is canonicalized before the next component is
/// applied, so `..` after a symlink climbs out of the link's target. Missing
/// components are kept as written, with `.` dropped and `..` folded.
#[must_use]
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if let Ok(canonical) = fs::canonicalize(&resolved) {
                    resolved = canonical;
                }
            }
            root @ (Component::Prefix(_) | Component::RootDir) => resolved.push(root.as_os_str()),
        }
    }
    resolved
}
