//! Shared test utilities for the modelpack test suite.
//!
//! Builds throwaway model trees and collections so pipeline tests read as
//! scenarios instead of filesystem plumbing:
//!
//! ```rust
//! let root = model_root(&["Models/Chairs/Chair.fbx", "Models/Sofa.fbx"]);
//! let collection = collection_with("Props", "Acme", &["Models/Sofa.fbx"]);
//! ```

use crate::types::{AssetCollection, AssetRef};
use std::path::Path;
use tempfile::TempDir;

/// Fixed creation date so manifest assertions are deterministic.
pub const TEST_CREATED: &str = "2026-03-14T09:26:53Z";

/// Create a temp directory containing an empty model file per path.
///
/// Tests get an isolated tree they can mutate without affecting each other.
pub fn model_root(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for rel in paths {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"mesh-bytes").unwrap();
    }
    tmp
}

/// A collection referencing `sources` verbatim (empty string = dangling ref).
pub fn collection_with(name: &str, author: &str, sources: &[&str]) -> AssetCollection {
    AssetCollection {
        name: name.to_string(),
        author: author.to_string(),
        created: TEST_CREATED.parse().unwrap(),
        assets: sources.iter().map(|s| AssetRef::new(*s)).collect(),
    }
}

/// Assert a file exists, with the directory listing on failure.
pub fn assert_exists(path: &Path) {
    if !path.exists() {
        let listing: Vec<String> = path
            .parent()
            .and_then(|p| std::fs::read_dir(p).ok())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        panic!("{} does not exist. Directory holds: {listing:?}", path.display());
    }
}
