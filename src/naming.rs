//! Logical name resolution for packaged assets.
//!
//! Every asset in a package is addressed by a human-readable logical name.
//! The obvious choice — the filename without its extension — breaks down as
//! soon as two models share a filename (`Chairs/Chair.fbx` and
//! `Tables/Chair.fbx`). This module derives names that stay readable while
//! being unique within one build:
//!
//! 1. Start from the filename without extension.
//! 2. Group assets whose names coincide.
//! 3. For each collision group, find the character-wise longest common prefix
//!    of the full source paths and trim it back to the last directory
//!    boundary (never mid-component).
//! 4. Each member's name becomes its path with that prefix removed, extension
//!    stripped, and remaining separators flattened to `_`.
//! 5. Assets that never collided keep their plain filename-derived name.
//!
//! ```text
//! Models/Chairs/Chair.fbx  →  Chairs_Chair
//! Models/Tables/Chair.fbx  →  Tables_Chair
//! Models/Sofa.fbx          →  Sofa
//! ```
//!
//! Disambiguation runs exactly once: names that still coincide after step 4
//! (only possible when two entries share a full path, which reference
//! filtering removes upstream) are left as produced. Backslashes are
//! normalized to `/` before processing so definition files written on Windows
//! resolve identically.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NamingError {
    #[error("cannot resolve names for an empty asset list")]
    EmptyInput,
}

/// Flat-join character replacing path separators in disambiguated names.
const FLAT_JOIN: char = '_';

/// Resolve logical names for a list of asset source paths.
///
/// The result has the same length and order as the input. Errors only on an
/// empty input.
pub fn resolve(paths: &[String]) -> Result<Vec<String>, NamingError> {
    if paths.is_empty() {
        return Err(NamingError::EmptyInput);
    }

    let normalized: Vec<String> = paths.iter().map(|p| p.replace('\\', "/")).collect();
    let mut names: Vec<String> = normalized.iter().map(|p| stem(p).to_string()).collect();

    let mut groups: std::collections::HashMap<String, Vec<usize>> =
        std::collections::HashMap::new();
    for (i, name) in names.iter().enumerate() {
        groups.entry(name.clone()).or_default().push(i);
    }

    for indices in groups.into_values() {
        if indices.len() < 2 {
            continue;
        }
        let group: Vec<&str> = indices.iter().map(|&i| normalized[i].as_str()).collect();
        let prefix_len = common_dir_prefix_len(&group);
        for &i in &indices {
            let remainder = &normalized[i][prefix_len..];
            let remainder = remainder.strip_prefix('/').unwrap_or(remainder);
            names[i] = strip_extension(remainder).replace('/', &FLAT_JOIN.to_string());
        }
    }

    Ok(names)
}

/// Filename without directory or extension.
fn stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    strip_extension(file)
}

/// Remove the extension: everything from the last `.` of the final path
/// component. A leading dot (hidden files) is not an extension separator.
fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(i) if i > 0 => &path[..file_start + i],
        _ => path,
    }
}

/// Length of the longest common prefix of all paths, trimmed back so it ends
/// exactly after a directory separator.
fn common_dir_prefix_len(paths: &[&str]) -> usize {
    let first = paths[0];
    let mut len = first.len();
    for other in &paths[1..] {
        let common = first
            .bytes()
            .zip(other.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        len = len.min(common);
    }
    match first[..len].rfind('/') {
        Some(i) => i + 1,
        None => 0,
    }
}
