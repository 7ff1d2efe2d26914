// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Long-lived rendering state shared by every frame.

use crate::atlas::{AtlasConfig, GlyphCache, ImageCache};
use crate::context::GraphicsContext;
use crate::scene::{Scene, SceneCounter};

/// Configuration for [`RenderResources`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Atlas configuration for UI images.
    pub images: AtlasConfig,
    /// Atlas configuration for glyphs.
    pub glyphs: AtlasConfig,
}

/// The atlas caches and the active-scene counter they share.
///
/// Create one per graphics context and call [`destroy`](Self::destroy) with
/// that context before dropping it, so that GPU textures are released.
#[derive(Debug)]
pub struct RenderResources {
    scenes: SceneCounter,
    pub(crate) images: ImageCache,
    pub(crate) glyphs: GlyphCache,
}

impl RenderResources {
    /// Create empty caches.
    pub fn new(config: RenderConfig) -> Self {
        let scenes = SceneCounter::new();
        Self {
            images: ImageCache::new(config.images, scenes.clone()),
            glyphs: GlyphCache::new(config.glyphs, scenes.clone()),
            scenes,
        }
    }

    /// Open a new scene counted against these caches.
    pub fn begin_scene(&self) -> Scene {
        Scene::new(&self.scenes)
    }

    /// The shared active-scene counter.
    #[inline]
    pub fn scenes(&self) -> &SceneCounter {
        &self.scenes
    }

    /// Number of scenes constructed and not yet reset.
    #[inline]
    pub fn active_scenes(&self) -> usize {
        self.scenes.active()
    }

    /// The image cache.
    #[inline]
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// The image cache, mutably.
    #[inline]
    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// The glyph cache.
    #[inline]
    pub fn glyphs(&self) -> &GlyphCache {
        &self.glyphs
    }

    /// The glyph cache, mutably.
    #[inline]
    pub fn glyphs_mut(&mut self) -> &mut GlyphCache {
        &mut self.glyphs
    }

    /// Finalize deferred deletions in both caches.
    ///
    /// Does nothing while any scene is active.
    pub fn sweep_deleted(&mut self) {
        self.images.sweep_deleted();
        self.glyphs.sweep_deleted();
    }

    /// Free the textures of pages destroyed since the last call.
    pub fn release_textures(&mut self, ctx: &mut impl GraphicsContext) {
        self.images.release_textures(ctx);
        self.glyphs.release_textures(ctx);
    }

    /// Drop every cached entry and free every texture.
    pub fn destroy(&mut self, ctx: &mut impl GraphicsContext) {
        self.images.destroy(ctx);
        self.glyphs.destroy(ctx);
    }
}
