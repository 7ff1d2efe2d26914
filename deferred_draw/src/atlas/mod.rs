// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture atlas caches for images and glyphs.
//!
//! Sources are copied once into CPU staging buffers, uploaded lazily on their
//! first draw, and drawn as textured quads from then on:
//! - [`AtlasPage`] owns one texture and packs items onto shelves
//! - [`AtlasCache`] maps source ids to pages and handles deferred deletion
//! - [`StagingBuffer`] holds a page's pixels until they reach the GPU

mod cache;
mod key;
mod page;
mod pixels;
mod region;

pub use cache::{
    AtlasCache, AtlasCacheStats, AtlasConfig, GlyphCache, ImageCache, InsertError,
};
pub use key::SourceId;
pub use page::{ATLAS_MARGIN, AtlasBlit, AtlasPage, ReserveError};
pub use pixels::{StagingBuffer, native_pixel, source_to_native};
pub use region::{AtlasRect, PageId};
