//! Collections and asset references.
//!
//! An [`AssetCollection`] is a curated, ordered list of 3D model assets with a
//! name and an author. Collections are authored as TOML definition files:
//!
//! ```toml
//! name = "Props"
//! author = "Acme"
//! created = "2026-03-14T09:26:53Z"   # optional, defaults to now
//! assets = [
//!     "Models/Chairs/Chair.fbx",
//!     "Models/Tables/Chair.fbx",
//!     "Models/Sofa.fbx",
//! ]
//! ```
//!
//! Asset paths are resolved against an asset root (by default the directory
//! containing the definition file). The build pipeline never mutates a
//! collection; it only reads it.
//!
//! ## Reference hygiene
//!
//! Collections accumulate cruft as projects evolve: the same model added
//! twice, entries whose source file was deleted, or empty entries left behind
//! by editing tools. [`filter_assets`] is the single place this is cleaned up
//! — order-preserving dedup by source path, dropping dangling (empty) and
//! missing references. Every pipeline stage operates on the filtered list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid collection file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize collection: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("collection file has an empty name: {0}")]
    EmptyName(PathBuf),
}

/// File extensions recognized as 3D model sources.
pub const MODEL_EXTENSIONS: &[&str] = &["fbx", "glb", "gltf", "obj"];

/// A stable reference to one source 3D model.
///
/// The source path doubles as the asset's identity: it is the thumbnail cache
/// key and the input to logical name resolution. An empty path is a dangling
/// reference (a model that was removed from the project after the collection
/// was authored) and is filtered out before building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef {
    pub source: String,
}

impl AssetRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// A reference whose source model no longer exists in the project.
    pub fn is_dangling(&self) -> bool {
        self.source.is_empty()
    }

    /// Resolve the source path against an asset root. Absolute paths are
    /// returned unchanged.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// A named, ordered collection of model assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetCollection {
    pub name: String,
    pub author: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<AssetRef>,
}

impl AssetCollection {
    /// Load a collection definition from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CollectionError> {
        let content = std::fs::read_to_string(path)?;
        let collection: Self = toml::from_str(&content)?;
        if collection.name.trim().is_empty() {
            return Err(CollectionError::EmptyName(path.to_path_buf()));
        }
        Ok(collection)
    }

    /// Write a collection definition as TOML.
    pub fn save(&self, path: &Path) -> Result<(), CollectionError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// First reference that is not dangling, if any. Used for the collection
    /// preview thumbnail.
    pub fn first_valid_asset(&self) -> Option<&AssetRef> {
        self.assets.iter().find(|a| !a.is_dangling())
    }
}

/// Return `true` if the path has a recognized model file extension.
pub fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MODEL_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

/// Filter a collection's references down to the buildable set.
///
/// Order-preserving. Removes, in one pass:
/// - duplicate references (same source path; first occurrence wins)
/// - dangling references (empty source path)
/// - references whose resolved source file does not exist under `root`
pub fn filter_assets(assets: &[AssetRef], root: &Path) -> Vec<AssetRef> {
    let mut seen: HashSet<&str> = HashSet::new();
    assets
        .iter()
        .filter(|asset| !asset.is_dangling())
        .filter(|asset| seen.insert(asset.source.as_str()))
        .filter(|asset| asset.resolve(root).exists())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"model").unwrap();
    }

    #[test]
    fn filter_removes_duplicates_keeping_first() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.fbx");
        touch(tmp.path(), "b.fbx");

        let assets = vec![
            AssetRef::new("a.fbx"),
            AssetRef::new("b.fbx"),
            AssetRef::new("a.fbx"),
        ];
        let filtered = filter_assets(&assets, tmp.path());
        let sources: Vec<&str> = filtered.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["a.fbx", "b.fbx"]);
    }

    #[test]
    fn filter_removes_dangling_refs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.fbx");

        let assets = vec![AssetRef::new(""), AssetRef::new("a.fbx")];
        let filtered = filter_assets(&assets, tmp.path());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].source, "a.fbx");
    }

    #[test]
    fn filter_removes_missing_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "exists.fbx");

        let assets = vec![AssetRef::new("exists.fbx"), AssetRef::new("gone.fbx")];
        let filtered = filter_assets(&assets, tmp.path());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].source, "exists.fbx");
    }

    #[test]
    fn filter_preserves_order() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.fbx", "a.fbx", "b.fbx"] {
            touch(tmp.path(), name);
        }

        let assets = vec![
            AssetRef::new("c.fbx"),
            AssetRef::new("a.fbx"),
            AssetRef::new("b.fbx"),
        ];
        let sources: Vec<String> = filter_assets(&assets, tmp.path())
            .into_iter()
            .map(|a| a.source)
            .collect();
        assert_eq!(sources, vec!["c.fbx", "a.fbx", "b.fbx"]);
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let asset = AssetRef::new("Models/Chair.fbx");
        assert_eq!(
            asset.resolve(Path::new("/project")),
            PathBuf::from("/project/Models/Chair.fbx")
        );
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let asset = AssetRef::new("/abs/Chair.fbx");
        assert_eq!(
            asset.resolve(Path::new("/project")),
            PathBuf::from("/abs/Chair.fbx")
        );
    }

    #[test]
    fn load_save_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let collection = AssetCollection {
            name: "Props".into(),
            author: "Acme".into(),
            created: Utc::now(),
            assets: vec![AssetRef::new("Models/Sofa.fbx")],
        };

        let path = tmp.path().join("props.collection.toml");
        collection.save(&path).unwrap();
        let loaded = AssetCollection::load(&path).unwrap();

        assert_eq!(loaded.name, "Props");
        assert_eq!(loaded.author, "Acme");
        assert_eq!(loaded.assets, collection.assets);
    }

    #[test]
    fn load_defaults_created_to_now() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("min.collection.toml");
        fs::write(&path, "name = \"Minimal\"\nauthor = \"Acme\"\nassets = []\n").unwrap();

        let loaded = AssetCollection::load(&path).unwrap();
        assert_eq!(loaded.name, "Minimal");
        assert!(loaded.assets.is_empty());
    }

    #[test]
    fn load_rejects_empty_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.collection.toml");
        fs::write(&path, "name = \"  \"\nauthor = \"Acme\"\n").unwrap();

        let result = AssetCollection::load(&path);
        assert!(matches!(result, Err(CollectionError::EmptyName(_))));
    }

    #[test]
    fn first_valid_asset_skips_dangling() {
        let collection = AssetCollection {
            name: "Props".into(),
            author: "Acme".into(),
            created: Utc::now(),
            assets: vec![AssetRef::new(""), AssetRef::new("Models/Sofa.fbx")],
        };
        assert_eq!(
            collection.first_valid_asset().unwrap().source,
            "Models/Sofa.fbx"
        );
    }

    #[test]
    fn model_file_detection_is_case_insensitive() {
        assert!(is_model_file(Path::new("a/Chair.FBX")));
        assert!(is_model_file(Path::new("scene.gltf")));
        assert!(!is_model_file(Path::new("readme.md")));
        assert!(!is_model_file(Path::new("noext")));
    }
}
