//! Create collection definitions from folders of model files.
//!
//! The fastest way to get a collection is to point the tool at a directory:
//! every model file under it (recursively, in path order) becomes one asset
//! reference, the directory name becomes the collection name, and the
//! definition is written beside the directory so the default asset root —
//! the definition file's own directory — resolves every reference as-is.
//!
//! ```text
//! project/
//! ├── Props/                      # modelpack from-dir project/Props
//! │   ├── Chairs/Chair.fbx
//! │   └── Sofa.fbx
//! └── Props.collection.toml       # ← created, assets = ["Props/Chairs/…", …]
//! ```
//!
//! An existing definition is never overwritten; the target gets a numeric
//! suffix (`Props-1.collection.toml`, `Props-2…`) instead.

use crate::types::{AssetCollection, AssetRef, CollectionError, is_model_file};
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of collection definition files.
pub const COLLECTION_FILE_SUFFIX: &str = ".collection.toml";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("no model files found under {0}")]
    NoModels(PathBuf),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Build a collection from every model file under `dir`, without writing
/// anything. Assets are referenced relative to `dir`'s parent, sorted by
/// path for a stable definition.
pub fn folder_to_collection(dir: &Path, author: &str) -> Result<AssetCollection, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::NotADirectory(dir.to_path_buf()));
    }
    let parent = dir.parent().unwrap_or(Path::new(""));
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Collection".to_string());

    let mut assets = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() || !is_model_file(entry.path()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(parent)
            .expect("walkdir yields paths under the parent")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        assets.push(AssetRef::new(rel));
    }
    if assets.is_empty() {
        return Err(ConvertError::NoModels(dir.to_path_buf()));
    }

    Ok(AssetCollection {
        name,
        author: author.to_string(),
        created: Utc::now(),
        assets,
    })
}

/// Convert `dir` and write the definition next to it, at a unique path.
/// Returns the path written.
pub fn convert_folder(dir: &Path, author: &str) -> Result<PathBuf, ConvertError> {
    let collection = folder_to_collection(dir, author)?;
    let parent = dir.parent().unwrap_or(Path::new(""));
    let target = unique_target_path(
        parent,
        &format!("{}{}", collection.name, COLLECTION_FILE_SUFFIX),
    );
    collection.save(&target)?;
    Ok(target)
}

/// First free path for `file_name` in `dir`: the name itself, then
/// `<stem>-1`, `<stem>-2`, … before the collection suffix.
pub fn unique_target_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, suffix) = match file_name.strip_suffix(COLLECTION_FILE_SUFFIX) {
        Some(stem) => (stem, COLLECTION_FILE_SUFFIX),
        None => (file_name, ""),
    };
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}-{n}{suffix}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
