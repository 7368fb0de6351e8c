//! Filesystem primitives and path hygiene.
//!
//! Everything the build replay touches on disk goes through here: directory
//! creation, text writes, recursive copies, symlinks, and permission modes.
//! The module also owns the two pure path concerns the rest of the crate
//! shares — relative-path computation for cross-page links, and the
//! URL-unsafe / filesystem-illegal character screens applied to generated
//! routes.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

/// Characters that make a generated URL unsafe to publish.
pub const URL_UNSAFE: &[char] = &[
    '"', '<', '>', '#', '%', '{', '}', '|', '^', '~', '[', ']', '`', ' ',
];

/// Characters that are troublesome in filesystem paths on common servers.
pub const PATH_ILLEGAL: &[char] = &[
    '.', '"', '[', ']', ':', ';', '|', '=', ' ', '?', '$',
];

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("'{route}' is an unsafe url; '{found}' should not be used")]
    UnsafeUrl { route: String, found: String },
    #[error("'{route}' is an illegal path; '{found}' should not be used")]
    IllegalPath { route: String, found: String },
}

/// Reject a generated route containing URL-unsafe characters.
pub fn check_url_unsafe(route: &str) -> Result<(), SafetyError> {
    let found = offending(route, URL_UNSAFE);
    if found.is_empty() {
        Ok(())
    } else {
        Err(SafetyError::UnsafeUrl {
            route: route.to_string(),
            found,
        })
    }
}

/// Reject a generated route containing filesystem-hostile characters.
pub fn check_path_illegal(route: &str) -> Result<(), SafetyError> {
    let found = offending(route, PATH_ILLEGAL);
    if found.is_empty() {
        Ok(())
    } else {
        Err(SafetyError::IllegalPath {
            route: route.to_string(),
            found,
        })
    }
}

fn offending(route: &str, set: &[char]) -> String {
    let mut found: Vec<char> = route.chars().filter(|c| set.contains(c)).collect();
    found.sort_unstable();
    found.dedup();
    found
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// An octal permission mode, written as a string (`"755"`) in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mode(pub u32);

impl Mode {
    pub const DIR: Mode = Mode(0o755);
    pub const FILE: Mode = Mode(0o644);
}

impl FromStr for Mode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u32::from_str_radix(s.trim().trim_start_matches("0o"), 8).map(Mode)
    }
}

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
            .map_err(|_| format!("'{s}' is not an octal mode like \"755\""))
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> String {
        format!("{mode}")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03o}", self.0)
    }
}

/// Create a directory (and any missing parents) if absent, then apply
/// `mode` to it. No-op when the directory already exists.
pub fn ensure_dir(path: &Path, mode: Mode) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    set_mode(path, mode)
}

pub fn write_text(path: &Path, text: &str) -> io::Result<()> {
    fs::write(path, text)
}

pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Symlink `src` at `dst`. On platforms without symlinks this degrades to
/// a copy.
#[cfg(unix)]
pub fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(not(unix))]
pub fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    copy_file(src, dst)
}

/// Apply a permission mode. No-op on non-unix targets.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: Mode) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode.0))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: Mode) -> io::Result<()> {
    Ok(())
}

/// Copy a directory tree into `dst`, honoring the overwrite policy for
/// files that already exist.
pub fn copy_tree(src: &Path, dst: &Path, overwrite: bool) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if target.exists() && !overwrite {
                continue;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Apply directory and file modes recursively, root included.
pub fn apply_modes(root: &Path, dir_mode: Mode, file_mode: Mode) -> io::Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_dir() {
            set_mode(entry.path(), dir_mode)?;
        } else {
            set_mode(entry.path(), file_mode)?;
        }
    }
    Ok(())
}

/// Relative path from the directory `base` to `target`, both expressed
/// relative to the site root. Pure string computation, no filesystem
/// access. An empty `base` is the site root itself.
pub fn relative_to(target: &str, base: &str) -> String {
    let target_parts: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let base_parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = Vec::new();
    for _ in common..base_parts.len() {
        parts.push("..");
    }
    parts.extend(&target_parts[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_from_site_root() {
        assert_eq!(relative_to("static/style.css", ""), "static/style.css");
        assert_eq!(relative_to("hello.html", ""), "hello.html");
    }

    #[test]
    fn relative_climbs_out_of_nested_routes() {
        assert_eq!(
            relative_to("hello.html", "Shippy/cruise/1"),
            "../../../hello.html"
        );
        assert_eq!(
            relative_to("static/favicon.ico", "a/b"),
            "../../static/favicon.ico"
        );
    }

    #[test]
    fn relative_into_sibling_and_child() {
        assert_eq!(
            relative_to("Shippy/cruise/1/report/index.html", "Shippy/cruise/1"),
            "report/index.html"
        );
        assert_eq!(
            relative_to("Shippy/cruise/2/index.html", "Shippy/cruise/1/data"),
            "../../2/index.html"
        );
    }

    #[test]
    fn relative_to_self_is_dot() {
        assert_eq!(relative_to("a/b", "a/b"), ".");
    }

    #[test]
    fn trailing_slashes_do_not_matter() {
        assert_eq!(
            relative_to("a/b/index.html", "a/b/"),
            relative_to("a/b/index.html", "a/b")
        );
    }

    #[test]
    fn unsafe_url_characters_are_reported() {
        let err = check_url_unsafe("a route/{x}").unwrap_err();
        match err {
            SafetyError::UnsafeUrl { found, .. } => {
                assert_eq!(found, " , {, }");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_url_unsafe("clean/route/1").is_ok());
    }

    #[test]
    fn illegal_path_characters_are_reported() {
        assert!(check_path_illegal("a/b.c").is_err());
        assert!(check_path_illegal("a/b?x").is_err());
        assert!(check_path_illegal("a/b/c1").is_ok());
    }

    #[test]
    fn mode_parses_octal_strings() {
        assert_eq!("755".parse::<Mode>().unwrap(), Mode(0o755));
        assert_eq!("0o644".parse::<Mode>().unwrap(), Mode(0o644));
        assert!("9x9".parse::<Mode>().is_err());
        assert_eq!(Mode(0o644).to_string(), "644");
    }

    #[test]
    fn copy_tree_honors_overwrite_policy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir(src.path().join("js")).unwrap();
        std::fs::write(src.path().join("js/app.js"), "new").unwrap();

        std::fs::create_dir(dst.path().join("js")).unwrap();
        std::fs::write(dst.path().join("js/app.js"), "old").unwrap();

        copy_tree(src.path(), dst.path(), false).unwrap();
        assert_eq!(
            std::fs::read_to_string(dst.path().join("js/app.js")).unwrap(),
            "old"
        );
        copy_tree(src.path(), dst.path(), true).unwrap();
        assert_eq!(
            std::fs::read_to_string(dst.path().join("js/app.js")).unwrap(),
            "new"
        );
    }

    #[cfg(unix)]
    #[test]
    fn apply_modes_sets_dir_and_file_bits() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("f.txt"), "x").unwrap();

        apply_modes(tmp.path(), Mode(0o751), Mode(0o640)).unwrap();
        let dir_bits = std::fs::metadata(&sub).unwrap().permissions().mode() & 0o777;
        let file_bits = std::fs::metadata(sub.join("f.txt"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_bits, 0o751);
        assert_eq!(file_bits, 0o640);
    }
}
