//! Package container: layout constants and the archive writer.
//!
//! A built package is a zip-compatible archive with a fixed logical layout:
//!
//! ```text
//! Props.modelpack
//! ├── collection.json              # build manifest (see manifest module)
//! ├── thumbnail.png                # collection preview
//! └── bundle/
//!     └── acme-props.bundle        # opaque blob from the bundle compiler
//! ```
//!
//! The writer archives a fully staged directory tree in one step, and that
//! step is the only one that touches the target path: the archive is written
//! to a temporary file next to the target and renamed into place, so either a
//! complete valid package exists at the target or the target is untouched.

use std::io::Write;
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File extension of built packages (without the dot).
pub const PACKAGE_EXTENSION: &str = "modelpack";

/// Archive entry name of the build manifest.
pub const MANIFEST_ENTRY_NAME: &str = "collection.json";

/// Archive entry name of the collection preview image.
pub const THUMBNAIL_ENTRY_NAME: &str = "thumbnail.png";

/// Archive directory holding the compiled bundle blob.
pub const BUNDLE_DIR_NAME: &str = "bundle";

/// Logical name of the thumbnail atlas inside the compiled bundle.
pub const ATLAS_LOGICAL_NAME: &str = "thumbnails.atlas";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive container error: {0}")]
    Container(#[from] zip::result::ZipError),
}

/// Package file name for a collection name: `<name>.modelpack`.
pub fn package_file_name(collection_name: &str) -> String {
    format!("{collection_name}.{PACKAGE_EXTENSION}")
}

/// Combines a staged directory tree into a single archive at a target path.
pub trait ArchiveWriter {
    fn write(&self, staged_root: &Path, target: &Path) -> Result<(), ArchiveError>;
}

/// Built-in writer producing a deflate zip, written atomically.
#[derive(Debug, Default)]
pub struct ZipArchiveWriter;

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn write(&self, staged_root: &Path, target: &Path) -> Result<(), ArchiveError> {
        let parent = target.parent().unwrap_or(Path::new("."));
        let scratch = tempfile::NamedTempFile::new_in(parent)?;

        let mut writer = ZipWriter::new(scratch);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in walkdir::WalkDir::new(staged_root)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(staged_root)
                .expect("walkdir yields paths under its root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            writer.start_file(name, options)?;
            writer.write_all(&std::fs::read(entry.path())?)?;
        }

        let scratch = writer.finish()?;
        scratch.persist(target).map_err(|e| ArchiveError::Io(e.error))?;
        Ok(())
    }
}
