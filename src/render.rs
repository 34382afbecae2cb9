//! Preview rendering seam.
//!
//! Turning a model reference into a preview image is the job of an external
//! renderer (in production, the host application's 3D rasterizer). The
//! pipeline only depends on the [`Renderer`] trait, so the whole build is
//! testable without a graphics stack and the rasterizer can be swapped
//! without touching the cache or the build stages.
//!
//! The built-in [`FlatTintRenderer`] keeps the CLI end-to-end runnable: it
//! produces a flat-shaded tile whose tint is derived from a SHA-256 of the
//! asset's source path, so previews are stable across runs and visually
//! distinct per asset. A real rasterizer plugs in through the trait.

use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Edge length in pixels of rendered asset previews.
pub const THUMBNAIL_SIZE: u32 = 256;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source model not found: {0}")]
    MissingSource(PathBuf),
    #[error("render failed: {0}")]
    Failed(String),
}

/// Renders a preview image for a model source file.
pub trait Renderer {
    fn render(&self, source: &Path, size: u32) -> Result<RgbaImage, RenderError>;
}

/// Fixed preview shown when a collection has no valid assets.
///
/// A two-tone gray checkerboard, the conventional "nothing to show" tile.
pub fn placeholder(size: u32) -> RgbaImage {
    let cell = (size / 8).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([96, 96, 96, 255])
        } else {
            Rgba([72, 72, 72, 255])
        }
    })
}

/// Built-in flat-shaded preview renderer.
///
/// The tint comes from the first bytes of `SHA-256(source path)`; a diagonal
/// falloff gives the tile some depth. Verifies the source file exists so a
/// stale reference fails the same way a real rasterizer would.
#[derive(Debug, Default)]
pub struct FlatTintRenderer;

impl FlatTintRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for FlatTintRenderer {
    fn render(&self, source: &Path, size: u32) -> Result<RgbaImage, RenderError> {
        if !source.exists() {
            return Err(RenderError::MissingSource(source.to_path_buf()));
        }

        let digest = Sha256::digest(source.to_string_lossy().as_bytes());
        // Lift each channel into 96..224 so tiles stay legible on both light
        // and dark list backgrounds.
        let base = [
            96 + (digest[0] as u32 * 128 / 255) as u8,
            96 + (digest[1] as u32 * 128 / 255) as u8,
            96 + (digest[2] as u32 * 128 / 255) as u8,
        ];

        Ok(RgbaImage::from_fn(size, size, |x, y| {
            let falloff = 255 - ((x + y) * 64 / (2 * size.max(1))) as u8;
            let shade = |c: u8| (c as u32 * falloff as u32 / 255) as u8;
            Rgba([shade(base[0]), shade(base[1]), shade(base[2]), 255])
        }))
    }
}
