// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The graphics context interface consumed at replay time.
//!
//! Everything in this crate up to replay is CPU-side bookkeeping. Only
//! [`Scene::replay`](crate::Scene::replay) and the texture upload/release paths
//! of the atlas caches talk to the GPU, and they do so exclusively through
//! [`GraphicsContext`].

use crate::color::{AlphaColor, Srgb};
use crate::kurbo::{Line, Rect};

/// Handle of a GPU texture owned by a [`GraphicsContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A textured quad to be drawn from an atlas page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturedQuad {
    /// The texture to sample from.
    pub texture: TextureId,
    /// Size of the texture in pixels, for converting `src` to normalized coordinates.
    pub texture_size: (u32, u32),
    /// Source rectangle in texture pixels.
    pub src: Rect,
    /// Destination rectangle in surface pixels.
    pub dst: Rect,
    /// Tint multiplied with the sampled texels.
    pub tint: AlphaColor<Srgb>,
}

/// A stateful graphics context whose calls are expensive to issue per primitive.
///
/// Implementations wrap a real GPU API. All methods are called from the thread
/// that owns the context; no method is reentrant.
pub trait GraphicsContext {
    /// Allocate a texture of the given size.
    ///
    /// Returns `None` if the texture could not be created. Callers degrade by
    /// skipping every draw that would sample from it.
    fn create_texture(&mut self, width: u32, height: u32) -> Option<TextureId>;

    /// Replace the entire contents of a texture with tightly packed RGBA8 rows.
    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, rgba: &[u8]);

    /// Release a texture previously returned by [`create_texture`](Self::create_texture).
    fn destroy_texture(&mut self, texture: TextureId);

    /// Set up an orthographic projection mapping `area` onto the render target.
    fn set_projection(&mut self, area: Rect);

    /// Draw a tinted, textured quad.
    fn draw_textured_quad(&mut self, quad: &TexturedQuad);

    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: AlphaColor<Srgb>);

    /// Draw a one pixel wide line.
    fn draw_line(&mut self, line: Line, color: AlphaColor<Srgb>);

    /// Push the current configuration (viewport, blend mode, projection, bound state).
    fn save_config(&mut self);

    /// Pop the configuration pushed by the matching [`save_config`](Self::save_config).
    fn restore_config(&mut self);

    /// Submit all pending work.
    fn flush(&mut self);
}

impl<T: GraphicsContext + ?Sized> GraphicsContext for &mut T {
    fn create_texture(&mut self, width: u32, height: u32) -> Option<TextureId> {
        (**self).create_texture(width, height)
    }

    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, rgba: &[u8]) {
        (**self).upload_texture(texture, width, height, rgba);
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        (**self).destroy_texture(texture);
    }

    fn set_projection(&mut self, area: Rect) {
        (**self).set_projection(area);
    }

    fn draw_textured_quad(&mut self, quad: &TexturedQuad) {
        (**self).draw_textured_quad(quad);
    }

    fn fill_rect(&mut self, rect: Rect, color: AlphaColor<Srgb>) {
        (**self).fill_rect(rect, color);
    }

    fn draw_line(&mut self, line: Line, color: AlphaColor<Srgb>) {
        (**self).draw_line(line, color);
    }

    fn save_config(&mut self) {
        (**self).save_config();
    }

    fn restore_config(&mut self) {
        (**self).restore_config();
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}
