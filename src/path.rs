//! Mapping request paths onto the served root.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::FileServerError;

/// Join a user-supplied relative path onto `root`, rejecting anything that
/// climbs above it.
///
/// Leading slashes are stripped so `/docs` means `<root>/docs`. `.` segments
/// are dropped and `..` pops the previous segment; a `..` with nothing left to
/// pop escapes the root and fails. Containment is tracked per segment, so a
/// sibling such as `/data/foobar` can never pass for root `/data/foo`.
///
/// This touches no files. Callers that go on to read the result should also
/// run [`verify_within_root`] to catch symlinks leading out of the tree.
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, FileServerError> {
    let requested = requested.trim_start_matches('/');

    let mut result = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(requested).components() {
        match component {
            Component::Normal(name) => {
                if name.to_string_lossy().contains('\0') {
                    warn!("Path component contains null byte: {:?}", name);
                    return Err(FileServerError::PathEscape);
                }
                result.push(name);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    warn!("Path escapes root: {:?}", requested);
                    return Err(FileServerError::PathEscape);
                }
                result.pop();
                depth -= 1;
            }
            Component::CurDir => continue,
            Component::RootDir | Component::Prefix(_) => {
                warn!("Absolute path component in relative path: {:?}", requested);
                return Err(FileServerError::PathEscape);
            }
        }
    }

    Ok(result)
}

/// Re-check containment against the real filesystem.
///
/// Existing paths are canonicalized and must still live under the canonical
/// root. Missing paths are returned as-is; the listing reports them as not
/// found.
pub fn verify_within_root(root: &Path, resolved: &Path) -> Result<PathBuf, FileServerError> {
    if !resolved.exists() {
        return Ok(resolved.to_path_buf());
    }

    let canonical_root = root.canonicalize()?;
    let canonical_path = resolved.canonicalize()?;

    if !canonical_path.starts_with(&canonical_root) {
        warn!(
            "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
            resolved, canonical_path, canonical_root
        );
        return Err(FileServerError::PathEscape);
    }

    Ok(canonical_path)
}
