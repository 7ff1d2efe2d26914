// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sample sources and caches.

use deferred_draw::{AtlasConfig, GlyphCache, GlyphMask, ImageCache, ImagePixels, SceneCounter};

/// A fully covered glyph of the given size.
pub(crate) fn glyph(width: u32, height: u32) -> GlyphMask {
    GlyphMask::new(width, height, vec![0xff; (width * height) as usize])
}

/// An opaque image whose pixels encode their position.
pub(crate) fn image(width: u32, height: u32) -> ImagePixels {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x & 0xff) << 16) | ((y & 0xff) << 8)))
        .collect();
    ImagePixels::new(width, height, pixels)
}

/// A glyph cache with square pages of `page_size` pixels.
pub(crate) fn glyph_cache(page_size: u32) -> (GlyphCache, SceneCounter) {
    let scenes = SceneCounter::new();
    let config = AtlasConfig {
        page_size,
        min_page_size: 16,
        max_page_size: 1024,
    };
    (GlyphCache::new(config, scenes.clone()), scenes)
}

/// An image cache with the default configuration.
pub(crate) fn image_cache() -> (ImageCache, SceneCounter) {
    let scenes = SceneCounter::new();
    (
        ImageCache::new(AtlasConfig::default(), scenes.clone()),
        scenes,
    )
}
