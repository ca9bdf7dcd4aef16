// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonicalize-and-contain path checking, used to scrub string leaves that
//! look like filesystem paths when a tool's schema suggests one.

use crate::error::SafetyError;
use std::path::{Path, PathBuf};

/// Asserts canonicalized paths stay within a configured root.
#[derive(Debug, Clone)]
pub struct FilesystemSandbox {
    root: PathBuf,
}

impl FilesystemSandbox {
    /// Build a sandbox rooted at `root`. `root` itself is canonicalized
    /// eagerly so later containment checks compare like-for-like.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SafetyError> {
        let root = root.into();
        let canonical_root = root
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize { path: root, source })?;
        Ok(Self { root: canonical_root })
    }

    /// Resolve `path` (relative to the sandbox root if not absolute) and
    /// assert it does not escape `root`.
    ///
    /// Existing paths are resolved with [`Path::canonicalize`], which follows
    /// symlinks. Paths that don't exist yet (a tool argument describing an
    /// output file) are resolved lexically against the root instead, since
    /// `canonicalize` would otherwise fail on them.
    pub fn canonicalize(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = match joined.canonicalize() {
            Ok(resolved) => resolved,
            Err(_) => lexically_normalize(&joined),
        };

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(SafetyError::Escape { path: resolved, root: self.root.clone() })
        }
    }

    /// True if `path` looks like it would stay within the sandbox, without
    /// erroring on escape (used by the safety filter, which wants a boolean
    /// decision rather than a hard failure).
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.canonicalize(path).is_ok()
    }

    /// The canonicalized sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Resolve `..` and `.` components without touching the filesystem.
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn contained_path_resolves() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"x").unwrap();
        let sandbox = FilesystemSandbox::new(dir.path()).unwrap();
        assert!(sandbox.contains("file.txt"));
    }

    #[test]
    fn traversal_outside_root_is_rejected() {
        let dir = tempdir().unwrap();
        let sandbox = FilesystemSandbox::new(dir.path()).unwrap();
        assert!(!sandbox.contains("../../etc/passwd"));
    }

    #[test]
    fn nonexistent_path_inside_root_is_still_accepted() {
        let dir = tempdir().unwrap();
        let sandbox = FilesystemSandbox::new(dir.path()).unwrap();
        assert!(sandbox.contains("not-yet-created/output.json"));
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let dir = tempdir().unwrap();
        let sandbox = FilesystemSandbox::new(dir.path()).unwrap();
        assert!(!sandbox.contains("/etc/passwd"));
    }
}
