//! Path validation for lookups inside a bundle.
//!
//! Every path handed to a [`Tree`](crate::tree::Tree) is relative to the
//! bundle root. Archive entry names come from an untrusted file, so the same
//! rules apply to both sides: nothing may resolve outside the root.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Check a bundle-relative path and return it with `.`, `..`, repeated and
/// trailing separators resolved away. Backslashes are left as they are; see
/// [`normalize_entry_name`] for archive names.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ember_source::validate_path;
/// assert!(validate_path("projects/Overview/project.json").is_ok());
/// assert!(validate_path("config/../ignition.conf").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert_eq!(
///     validate_path("./projects//Overview/").unwrap(),
///     Path::new("projects/Overview")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    resolve(path).ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))
}

/// Resolve `..` and `.` lexically against the bundle root.
///
/// `None` when the path climbs above the root, names the root itself, or has
/// a drive prefix or a NUL byte in one of its components.
fn resolve(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) if !part.as_encoded_bytes().contains(&0) => parts.push(part),
            Component::Normal(_) | Component::Prefix(_) => return None,
            Component::ParentDir => {
                parts.pop()?;
            },
            Component::CurDir | Component::RootDir => {},
        }
    }
    (!parts.is_empty()).then(|| parts.into_iter().collect())
}

/// Normalize a path into the `/`-separated form used for archive entry names.
pub(crate) fn entry_name(path: impl AsRef<Path>) -> Result<String> {
    let validated = validate(path.as_ref())?;
    let mut name = String::new();
    for component in validated.components() {
        let Some(part) = component.as_os_str().to_str() else {
            exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
        };
        if !name.is_empty() {
            name.push('/');
        }
        name.push_str(part);
    }
    Ok(name)
}

/// Normalize a raw entry name read out of an archive's central directory.
///
/// Returns `None` for names that would escape the archive root (or are
/// otherwise unusable); such entries are ignored entirely.
pub(crate) fn normalize_entry_name(raw: &str) -> Option<String> {
    // Some archivers on Windows write backslash separators.
    entry_name(raw.replace('\\', "/")).ok()
}
