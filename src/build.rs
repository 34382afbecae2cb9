//! Package build pipeline for a single collection.
//!
//! Building runs through a fixed stage sequence:
//!
//! ```text
//! select directory → conflict check → validate
//!     → manifest → thumbnails + atlas → bundle → archive → cleanup
//! ```
//!
//! The two decisions a human has to make — where the package goes, and what
//! to do about an existing package with the same name — are modeled as
//! explicit suspend points instead of blocking dialogs. [`BuildSession`]
//! returns a [`BuildStep`] naming the decision it needs; the driving loop
//! (CLI flags, an editor UI, or a test) answers with a [`DirectoryChoice`] or
//! [`ConflictChoice`] and the session continues. Cancellation is always
//! available at a decision point and is silent; once the pipeline proper
//! starts there is no cancellation, only completion or an error.
//!
//! ## Filesystem discipline
//!
//! All intermediate state lives in a scratch directory uniquely named per
//! run (`tempfile::TempDir`), removed when the build ends — success, error,
//! or panic. The target path is touched by exactly one operation: the final
//! archive write, which itself goes through a temp file and a rename. The
//! observable outcomes at the target are therefore "complete valid package"
//! or "untouched", with one documented exception: answering `Overwrite` at
//! the conflict prompt deletes the existing package immediately, as the
//! prompt says it will.
//!
//! Validation is deliberately first, at session construction: a collection
//! whose filtered asset list is empty fails before any prompt is shown, so
//! an `Overwrite` can never delete a package on behalf of a build that was
//! doomed from the start.

use crate::archive::{self, ArchiveError, ArchiveWriter};
use crate::bundle::{BundleCompiler, BundleEntry, CompileError};
use crate::cache::ThumbnailCache;
use crate::manifest::BuildManifest;
use crate::naming::{self, NamingError};
use crate::prefs::{LAST_OUTPUT_DIR_KEY, PrefStore, PrefsError};
use crate::render::{RenderError, THUMBNAIL_SIZE};
use crate::types::{AssetCollection, AssetRef, filter_assets};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("collection '{0}' contains no valid assets")]
    EmptyCollection(String),
    #[error("no collections to build")]
    EmptyBatch,
    #[error("output directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("unexpected session response: {0}")]
    UnexpectedResponse(&'static str),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error("preview render failed: {0}")]
    Render(#[from] RenderError),
    #[error("thumbnail encode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("archive write failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("could not persist preferences: {0}")]
    Prefs(#[from] PrefsError),
    #[error("manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The injected collaborators a build runs against.
///
/// Owned by the caller and shared across builds in a batch: the thumbnail
/// cache keeps its entries between collections, and the prefs store keeps
/// the last-used output directory across processes.
pub struct BuildEnv<'a> {
    pub cache: &'a mut ThumbnailCache,
    pub compiler: &'a dyn BundleCompiler,
    pub archive: &'a dyn ArchiveWriter,
    pub prefs: &'a mut dyn PrefStore,
    /// Directory collection-relative asset paths resolve against.
    pub asset_root: &'a Path,
}

/// What a build session needs next, or how it ended.
#[derive(Debug)]
pub enum BuildStep {
    /// Answer with [`BuildSession::provide_directory`].
    NeedOutputDirectory { last_used: Option<PathBuf> },
    /// A package already exists at `target`. Answer with
    /// [`BuildSession::resolve_conflict`].
    NeedConflictResolution { target: PathBuf },
    /// Terminal: the user backed out. Not an error; nothing was written.
    Cancelled,
    /// Terminal: the package was built.
    Finished(BuildReport),
}

/// Response to [`BuildStep::NeedOutputDirectory`].
#[derive(Debug, Clone)]
pub enum DirectoryChoice {
    Select(PathBuf),
    Cancel,
}

/// Response to [`BuildStep::NeedConflictResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Delete the existing package and proceed.
    Overwrite,
    /// Abort the build; the existing package stays.
    Cancel,
    /// Keep the existing package and pick a different directory.
    SaveAs,
}

/// Summary of one successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub collection: String,
    pub identifier: String,
    pub target: PathBuf,
    pub addressable_names: Vec<String>,
}

enum SessionState {
    SelectingDirectory,
    ConflictPending { target: PathBuf },
    Terminal,
}

/// Resumable build of one collection. See the module docs for the protocol.
pub struct BuildSession<'a> {
    collection: &'a AssetCollection,
    assets: Vec<AssetRef>,
    state: SessionState,
}

impl<'a> BuildSession<'a> {
    /// Validate the collection and open a session.
    ///
    /// Fails with [`BuildError::EmptyCollection`] if no valid assets remain
    /// after filtering — before any prompt, any preference write, any I/O.
    pub fn new(collection: &'a AssetCollection, env: &BuildEnv) -> Result<Self, BuildError> {
        let assets = filter_assets(&collection.assets, env.asset_root);
        if assets.is_empty() {
            return Err(BuildError::EmptyCollection(collection.name.clone()));
        }
        Ok(Self {
            collection,
            assets,
            state: SessionState::SelectingDirectory,
        })
    }

    /// The opening step: ask the driver for an output directory.
    pub fn first_step(&self, env: &BuildEnv) -> BuildStep {
        BuildStep::NeedOutputDirectory {
            last_used: last_used_directory(env.prefs),
        }
    }

    /// Answer the directory prompt.
    pub fn provide_directory(
        &mut self,
        env: &mut BuildEnv,
        choice: DirectoryChoice,
    ) -> Result<BuildStep, BuildError> {
        if !matches!(self.state, SessionState::SelectingDirectory) {
            return Err(BuildError::UnexpectedResponse(
                "no directory selection pending",
            ));
        }
        match choice {
            DirectoryChoice::Cancel => {
                self.state = SessionState::Terminal;
                Ok(BuildStep::Cancelled)
            }
            DirectoryChoice::Select(dir) => {
                if !dir.is_dir() {
                    self.state = SessionState::Terminal;
                    return Err(BuildError::MissingDirectory(dir));
                }
                env.prefs
                    .set(LAST_OUTPUT_DIR_KEY, &dir.to_string_lossy())?;

                let target = dir.join(archive::package_file_name(&self.collection.name));
                if target.exists() {
                    self.state = SessionState::ConflictPending {
                        target: target.clone(),
                    };
                    Ok(BuildStep::NeedConflictResolution { target })
                } else {
                    self.run(env, target)
                }
            }
        }
    }

    /// Answer the conflict prompt.
    pub fn resolve_conflict(
        &mut self,
        env: &mut BuildEnv,
        choice: ConflictChoice,
    ) -> Result<BuildStep, BuildError> {
        let target = match &self.state {
            SessionState::ConflictPending { target } => target.clone(),
            _ => return Err(BuildError::UnexpectedResponse("no conflict pending")),
        };
        match choice {
            ConflictChoice::Cancel => {
                self.state = SessionState::Terminal;
                Ok(BuildStep::Cancelled)
            }
            ConflictChoice::SaveAs => {
                self.state = SessionState::SelectingDirectory;
                Ok(BuildStep::NeedOutputDirectory {
                    last_used: last_used_directory(env.prefs),
                })
            }
            ConflictChoice::Overwrite => {
                std::fs::remove_file(&target)?;
                self.run(env, target)
            }
        }
    }

    fn run(&mut self, env: &mut BuildEnv, target: PathBuf) -> Result<BuildStep, BuildError> {
        self.state = SessionState::Terminal;
        let report = build_package(self.collection, &self.assets, &target, env)?;
        Ok(BuildStep::Finished(report))
    }
}

fn last_used_directory(prefs: &dyn PrefStore) -> Option<PathBuf> {
    prefs.get(LAST_OUTPUT_DIR_KEY).map(PathBuf::from)
}

/// Run the pipeline proper: manifest, thumbnails, bundle, archive.
///
/// `assets` is the already-filtered, non-empty asset list and `target` an
/// already-negotiated free path. Also the entry point for batch builds,
/// which do their own negotiation.
pub(crate) fn build_package(
    collection: &AssetCollection,
    assets: &[AssetRef],
    target: &Path,
    env: &mut BuildEnv,
) -> Result<BuildReport, BuildError> {
    // Everything below stages into scratch; TempDir removes it on every
    // exit path, including the error returns in between.
    let scratch = tempfile::Builder::new().prefix("modelpack-").tempdir()?;
    let staged = scratch.path().join("staged");
    let thumbnails = scratch.path().join("thumbnails");
    std::fs::create_dir_all(staged.join(archive::BUNDLE_DIR_NAME))?;
    std::fs::create_dir_all(&thumbnails)?;

    // Manifest
    let paths: Vec<String> = assets.iter().map(|a| a.source.clone()).collect();
    let names = naming::resolve(&paths)?;
    let manifest = BuildManifest::new(collection, names.clone());
    std::fs::write(
        staged.join(archive::MANIFEST_ENTRY_NAME),
        manifest.to_json()?,
    )?;

    // Per-asset thumbnails, the atlas they compose into, and the collection
    // preview. Logical names carry no separators, so they are usable as
    // file stems directly.
    let mut tiles: Vec<RgbaImage> = Vec::with_capacity(assets.len());
    for (asset, name) in assets.iter().zip(&names) {
        let image = env.cache.get_or_render(&asset.resolve(env.asset_root))?;
        image.save(thumbnails.join(format!("{name}.png")))?;
        tiles.push(image);
    }
    let atlas_path = thumbnails.join("atlas.png");
    compose_atlas(&tiles).save(&atlas_path)?;

    let cover = env.cache.collection_thumbnail(collection, env.asset_root)?;
    cover.save(staged.join(archive::THUMBNAIL_ENTRY_NAME))?;

    // Bundle
    let mut entries: Vec<BundleEntry> = assets
        .iter()
        .zip(&names)
        .map(|(asset, name)| BundleEntry::new(asset.resolve(env.asset_root), name.clone()))
        .collect();
    entries.push(BundleEntry::new(&atlas_path, archive::ATLAS_LOGICAL_NAME));
    let blob = env.compiler.compile(&entries)?;
    std::fs::write(
        staged
            .join(archive::BUNDLE_DIR_NAME)
            .join(format!("{}.bundle", manifest.identifier)),
        blob,
    )?;

    // Archive — the single step that touches the target path.
    env.archive.write(&staged, target)?;

    Ok(BuildReport {
        collection: collection.name.clone(),
        identifier: manifest.identifier,
        target: target.to_path_buf(),
        addressable_names: names,
    })
}

/// Compose per-asset thumbnails into one square-ish grid atlas.
///
/// Tiles are laid out row-major in asset order, so the runtime can index
/// the atlas by position in `AddressableNames`.
fn compose_atlas(tiles: &[RgbaImage]) -> RgbaImage {
    let cols = (tiles.len() as f64).sqrt().ceil().max(1.0) as u32;
    let rows = (tiles.len() as u32).div_ceil(cols).max(1);
    let mut atlas = RgbaImage::new(cols * THUMBNAIL_SIZE, rows * THUMBNAIL_SIZE);
    for (i, tile) in tiles.iter().enumerate() {
        let x = (i as u32 % cols) * THUMBNAIL_SIZE;
        let y = (i as u32 / cols) * THUMBNAIL_SIZE;
        image::imageops::replace(&mut atlas, tile, x as i64, y as i64);
    }
    atlas
}
