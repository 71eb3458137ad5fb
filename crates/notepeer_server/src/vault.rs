//! Writing pushed notes into the local vault.
//!
//! The host editor sanitizes note file names inconsistently, so the server
//! cannot know which file a key was originally saved as. [`write_note`]
//! tries a fixed list of plausible names and overwrites the first that
//! exists, creating the first candidate otherwise. A wrong guess produces a
//! duplicate file; this is best-effort.

use crate::error::{ServerError, ServerResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Create-or-overwrite access to a directory of note files.
///
/// Paths passed in are relative to the vault root.
pub trait VaultStore: Send + Sync {
    /// Returns true if a file exists at `relative`.
    fn exists(&self, relative: &Path) -> bool;

    /// Creates or overwrites the file at `relative`, returning its full path.
    fn write(&self, relative: &Path, content: &str) -> io::Result<PathBuf>;
}

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Creates a vault rooted at `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the vault root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VaultStore for FsVault {
    fn exists(&self, relative: &Path) -> bool {
        self.root.join(relative).is_file()
    }

    fn write(&self, relative: &Path, content: &str) -> io::Result<PathBuf> {
        let path = self.root.join(relative);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// A vault held in memory.
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryVault {
    /// Creates an empty in-memory vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file.
    pub fn insert(&self, relative: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.lock().insert(relative.into(), content.into());
    }

    /// Returns the content of a file.
    pub fn read(&self, relative: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(relative.as_ref()).cloned()
    }

    /// Returns all file paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }
}

impl VaultStore for MemoryVault {
    fn exists(&self, relative: &Path) -> bool {
        self.files.lock().contains_key(relative)
    }

    fn write(&self, relative: &Path, content: &str) -> io::Result<PathBuf> {
        self.files
            .lock()
            .insert(relative.to_path_buf(), content.to_string());
        Ok(relative.to_path_buf())
    }
}

/// Returns the file names a note with `key` may have been saved under, in
/// the order they are tried.
///
/// 1. the key unchanged
/// 2. whitespace replaced with `_`
/// 3. everything but ASCII letters, digits, `_` and `'` replaced with `_`,
///    runs of `_` collapsed, leading and trailing `_` trimmed
///
/// Duplicates, empty names and names that would leave the vault directory
/// are dropped.
pub fn candidate_file_names(key: &str, extension: &str) -> Vec<PathBuf> {
    let stems = [key.to_string(), underscore_whitespace(key), strict_sanitize(key)];

    let mut names: Vec<PathBuf> = Vec::with_capacity(stems.len());
    for stem in stems {
        if stem.is_empty() {
            continue;
        }
        let name = if extension.is_empty() {
            PathBuf::from(stem)
        } else {
            PathBuf::from(format!("{}.{}", stem, extension))
        };
        if stays_inside_vault(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Writes `content` for `key` into the vault using the candidate policy.
///
/// Returns the path that was written.
pub fn write_note(
    vault: &dyn VaultStore,
    key: &str,
    content: &str,
    extension: &str,
) -> ServerResult<PathBuf> {
    let candidates = candidate_file_names(key, extension);
    let target = candidates
        .iter()
        .find(|candidate| vault.exists(candidate))
        .or_else(|| candidates.first())
        .ok_or_else(|| ServerError::UnusableKey(key.to_string()))?;

    debug!(key, target = %target.display(), "writing pushed note");
    vault
        .write(target, content)
        .map_err(|source| ServerError::FileWrite {
            path: target.clone(),
            source,
        })
}

fn underscore_whitespace(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn strict_sanitize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

fn stays_inside_vault(name: &Path) -> bool {
    name.components()
        .all(|component| matches!(component, Component::Normal(_)))
}
