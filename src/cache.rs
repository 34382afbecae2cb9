//! Thumbnail cache for rendered asset previews.
//!
//! Rendering a model preview is the expensive operation of the pipeline — a
//! real rasterizer has to load the mesh, light it, and read pixels back. This
//! module memoizes renders so that list views and repeated builds pay for
//! each asset once.
//!
//! # Design
//!
//! The cache is keyed by asset identity: the resolved source path. Entries
//! are created lazily on first access and never evicted individually — the
//! only invalidation is [`ThumbnailCache::clear`], which empties the whole
//! cache. Coarse on purpose: the tool cannot observe edits made to source
//! models by other programs, so callers invalidate explicitly after anything
//! that could make a cached render stale.
//!
//! A failed render is never cached. The next access retries, so a transient
//! renderer failure (a model mid-save, an exhausted GPU context) does not
//! poison the cache for the rest of the process.
//!
//! The cache is a plain service object owned by the caller and is not safe to
//! share across threads; all access happens on the orchestration thread.

use crate::render::{self, RenderError, Renderer, THUMBNAIL_SIZE};
use crate::types::AssetCollection;
use image::RgbaImage;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Memoizes preview renders per asset, with whole-cache invalidation only.
pub struct ThumbnailCache {
    renderer: Box<dyn Renderer>,
    entries: HashMap<PathBuf, RgbaImage>,
    stats: CacheStats,
}

impl ThumbnailCache {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Fetch the preview for a resolved source path, rendering on a miss.
    ///
    /// Only successful renders are stored; an `Err` leaves the cache
    /// untouched so the asset is retried on the next access.
    pub fn get_or_render(&mut self, source: &Path) -> Result<RgbaImage, RenderError> {
        if let Some(image) = self.entries.get(source) {
            self.stats.hits += 1;
            return Ok(image.clone());
        }
        let image = self.renderer.render(source, THUMBNAIL_SIZE)?;
        self.stats.renders += 1;
        self.entries.insert(source.to_path_buf(), image.clone());
        Ok(image)
    }

    /// Preview for a whole collection: the first valid asset's thumbnail, or
    /// the fixed placeholder when the collection has no valid assets.
    pub fn collection_thumbnail(
        &mut self,
        collection: &AssetCollection,
        asset_root: &Path,
    ) -> Result<RgbaImage, RenderError> {
        match collection.first_valid_asset() {
            Some(asset) => self.get_or_render(&asset.resolve(asset_root)),
            None => Ok(render::placeholder(THUMBNAIL_SIZE)),
        }
    }

    /// Empty the entire cache unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Running totals of cache behavior, for build output lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u32,
    pub renders: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.renders
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} rendered, {} cached ({} total)",
                self.renders,
                self.hits,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.renders)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::MockRenderer;
    use crate::types::AssetRef;
    use chrono::Utc;

    fn cache_with_mock() -> (ThumbnailCache, &'static MockRenderer) {
        // Leak the mock so tests can inspect it while the cache owns a
        // renderer reference. Test-only.
        let mock: &'static MockRenderer = Box::leak(Box::new(MockRenderer::new()));
        let cache = ThumbnailCache::new(Box::new(MockHandle(mock)));
        (cache, mock)
    }

    /// Forwarding handle so the leaked mock stays inspectable.
    struct MockHandle(&'static MockRenderer);

    impl Renderer for MockHandle {
        fn render(&self, source: &Path, size: u32) -> Result<RgbaImage, RenderError> {
            self.0.render(source, size)
        }
    }

    fn collection(assets: Vec<AssetRef>) -> AssetCollection {
        AssetCollection {
            name: "Props".into(),
            author: "Acme".into(),
            created: Utc::now(),
            assets,
        }
    }

    #[test]
    fn second_access_does_not_re_render() {
        let (mut cache, mock) = cache_with_mock();
        let path = Path::new("Models/Chair.fbx");

        let first = cache.get_or_render(path).unwrap();
        let second = cache.get_or_render(path).unwrap();

        assert_eq!(mock.renders_of(path), 1);
        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().renders, 1);
    }

    #[test]
    fn failed_render_is_not_cached() {
        let (mut cache, mock) = cache_with_mock();
        let path = Path::new("Models/Broken.fbx");

        mock.fail_on(path);
        assert!(cache.get_or_render(path).is_err());
        assert!(cache.is_empty());

        // Recovers on retry: the failure did not stick.
        mock.recover(path);
        assert!(cache.get_or_render(path).is_ok());
        assert_eq!(mock.renders_of(path), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let (mut cache, mock) = cache_with_mock();
        cache.get_or_render(Path::new("a.fbx")).unwrap();
        cache.get_or_render(Path::new("b.fbx")).unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());

        cache.get_or_render(Path::new("a.fbx")).unwrap();
        assert_eq!(mock.renders_of(Path::new("a.fbx")), 2);
    }

    #[test]
    fn distinct_assets_get_distinct_entries() {
        let (mut cache, _mock) = cache_with_mock();
        cache.get_or_render(Path::new("a.fbx")).unwrap();
        cache.get_or_render(Path::new("b.fbx")).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn collection_thumbnail_uses_first_valid_asset() {
        let (mut cache, mock) = cache_with_mock();
        let c = collection(vec![AssetRef::new(""), AssetRef::new("Models/Sofa.fbx")]);

        cache.collection_thumbnail(&c, Path::new("/project")).unwrap();
        assert_eq!(mock.renders_of(Path::new("/project/Models/Sofa.fbx")), 1);
    }

    #[test]
    fn collection_thumbnail_falls_back_to_placeholder() {
        let (mut cache, mock) = cache_with_mock();
        let c = collection(vec![AssetRef::new("")]);

        let img = cache.collection_thumbnail(&c, Path::new("/project")).unwrap();
        assert_eq!(mock.render_count(), 0);
        assert_eq!((img.width(), img.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    }

    #[test]
    fn render_error_propagates_from_collection_thumbnail() {
        let (mut cache, mock) = cache_with_mock();
        let c = collection(vec![AssetRef::new("Models/Broken.fbx")]);
        mock.fail_on(Path::new("/project/Models/Broken.fbx"));

        let result = cache.collection_thumbnail(&c, Path::new("/project"));
        assert!(matches!(result, Err(RenderError::Failed(_))));
    }

    #[test]
    fn stats_display() {
        let (mut cache, _mock) = cache_with_mock();
        cache.get_or_render(Path::new("a.fbx")).unwrap();
        cache.get_or_render(Path::new("a.fbx")).unwrap();
        cache.get_or_render(Path::new("b.fbx")).unwrap();
        assert_eq!(format!("{}", cache.stats()), "2 rendered, 1 cached (3 total)");
    }
}
