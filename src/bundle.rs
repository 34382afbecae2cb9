//! Bundle compilation seam.
//!
//! The platform bundle — the blob the headset runtime actually loads models
//! from — is produced by an external compiler. The pipeline hands it an
//! ordered list of [`BundleEntry`] pairs (resolved source path, logical name)
//! and receives an opaque byte blob back; it never looks inside.
//!
//! [`ZipBundleCompiler`] is the built-in implementation: a deflate-compressed
//! zip container with one entry per logical name. Platform-specific compilers
//! implement [`BundleCompiler`] and drop in without pipeline changes.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bundle source not found: {0}")]
    MissingSource(PathBuf),
    #[error("duplicate logical name in bundle: {0}")]
    DuplicateName(String),
    #[error("bundle container error: {0}")]
    Container(#[from] zip::result::ZipError),
    #[error("bundle compilation failed: {0}")]
    Failed(String),
}

/// One asset to be packed: where it lives and the name it is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub source: PathBuf,
    pub logical_name: String,
}

impl BundleEntry {
    pub fn new(source: impl Into<PathBuf>, logical_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            logical_name: logical_name.into(),
        }
    }
}

/// Compiles (source, logical name) entries into an opaque bundle blob.
pub trait BundleCompiler {
    fn compile(&self, entries: &[BundleEntry]) -> Result<Vec<u8>, CompileError>;
}

/// Built-in compiler producing a deflate zip keyed by logical name.
#[derive(Debug, Default)]
pub struct ZipBundleCompiler;

impl ZipBundleCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl BundleCompiler for ZipBundleCompiler {
    fn compile(&self, entries: &[BundleEntry]) -> Result<Vec<u8>, CompileError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in entries {
            if !seen.insert(entry.logical_name.as_str()) {
                return Err(CompileError::DuplicateName(entry.logical_name.clone()));
            }
        }

        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            if !entry.source.exists() {
                return Err(CompileError::MissingSource(entry.source.clone()));
            }
            writer.start_file(entry.logical_name.as_str(), options)?;
            writer.write_all(&std::fs::read(&entry.source)?)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
