// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single atlas page: one GPU texture, one staging buffer, and a shelf packer.
//!
//! Items are placed left to right on horizontal shelves. When an item does not
//! fit on the current shelf, a new shelf starts below the tallest item of the
//! current one. When no new shelf fits either, the page closes for good; it
//! keeps serving draws for the items it already holds.
//!
//! Every allocation reserves a one pixel margin on each side so that bilinear
//! filtering never samples a neighbouring entry.

use core::fmt;

use super::SourceId;
use super::pixels::StagingBuffer;
use super::region::AtlasRect;
use crate::color::{AlphaColor, Srgb};
use crate::context::{GraphicsContext, TextureId, TexturedQuad};
use crate::kurbo::{Insets, Rect, Vec2};
use crate::math::is_degenerate;

/// Total margin reserved per axis for each allocation (one pixel per side).
pub const ATLAS_MARGIN: u32 = 2;

/// Reasons a page refuses an allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveError {
    /// The page is closed and will not accept any further allocation.
    PageFull,
}

impl fmt::Display for ReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageFull => f.write_str("atlas page is full"),
        }
    }
}

impl core::error::Error for ReserveError {}

/// A textured blit out of an atlas entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasBlit {
    /// Destination rectangle in surface pixels, before clipping.
    pub dst: Rect,
    /// Source rectangle relative to the top-left corner of the cached entry.
    pub src: Rect,
    /// Tint multiplied with the sampled texels.
    pub tint: AlphaColor<Srgb>,
    /// Amount cut away from each edge of `dst` by clipping.
    ///
    /// The source rectangle shrinks proportionally.
    pub clip: Option<Insets>,
    /// Rotation angle in degrees.
    ///
    /// Accepted for API compatibility, but not applied.
    pub rotation: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextureState {
    /// Not created yet.
    Pending,
    /// Created successfully.
    Ready(TextureId),
    /// Creation failed; the page draws nothing.
    Failed,
}

/// One atlas page.
pub struct AtlasPage {
    width: u32,
    height: u32,
    staging: Option<StagingBuffer>,
    /// Horizontal cursor on the current shelf.
    x: u32,
    /// Top of the current shelf.
    current_line: u32,
    /// Where the next shelf starts.
    next_line: u32,
    closed: bool,
    needs_upload: bool,
    live_items: usize,
    texture: TextureState,
}

impl AtlasPage {
    /// Create an empty, open page. Neither the staging buffer nor the texture
    /// are allocated until they are needed.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            staging: None,
            x: 0,
            current_line: 0,
            next_line: 0,
            closed: false,
            needs_upload: false,
            live_items: 0,
            texture: TextureState::Pending,
        }
    }

    /// Reserve space for an item of the given size.
    ///
    /// The returned rectangle excludes the margin. Zero-area requests get a
    /// degenerate rectangle at the cursor, clamped into the page, and leave
    /// the pixels untouched.
    pub fn reserve(
        &mut self,
        id: SourceId,
        width: u32,
        height: u32,
    ) -> Result<AtlasRect, ReserveError> {
        if self.closed {
            return Err(ReserveError::PageFull);
        }

        if width == 0 || height == 0 {
            self.live_items += 1;
            let x = (self.x + 1).min(self.width.saturating_sub(1));
            let y = (self.current_line + 1).min(self.height.saturating_sub(1));
            return Ok(AtlasRect::new(x, y, x, y));
        }

        if self.x.saturating_add(width).saturating_add(ATLAS_MARGIN) > self.width {
            self.current_line = self.next_line;
            self.x = 0;
        }

        let bottom = self
            .current_line
            .saturating_add(height)
            .saturating_add(ATLAS_MARGIN);
        if bottom > self.height || width.saturating_add(ATLAS_MARGIN) > self.width {
            log::debug!(
                "closing {}x{} atlas page: no room for {id:?} ({width}x{height})",
                self.width,
                self.height
            );
            self.closed = true;
            return Err(ReserveError::PageFull);
        }

        let rect = AtlasRect::new(
            self.x + 1,
            self.current_line + 1,
            self.x + width + 1,
            self.current_line + height + 1,
        );
        log::trace!("reserved {rect:?} for {id:?}");

        self.next_line = self.next_line.max(bottom);
        self.x += width + ATLAS_MARGIN;
        self.needs_upload = true;
        self.live_items += 1;
        let (page_w, page_h) = (self.width, self.height);
        self.staging
            .get_or_insert_with(|| StagingBuffer::new(page_w, page_h));
        Ok(rect)
    }

    /// The staging buffer, if it is still allocated.
    pub fn staging(&self) -> Option<&StagingBuffer> {
        self.staging.as_ref()
    }

    /// Mutable access to the staging buffer, if it is still allocated.
    pub fn staging_mut(&mut self) -> Option<&mut StagingBuffer> {
        self.staging.as_mut()
    }

    /// Refuse every future allocation.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Drop one item from the live count and return the remaining count.
    pub fn release_item(&mut self) -> usize {
        debug_assert!(self.live_items > 0, "released an item from an empty page");
        self.live_items = self.live_items.saturating_sub(1);
        self.live_items
    }

    /// Upload the staging buffer, creating the texture first if needed.
    ///
    /// A closed page releases its staging buffer after a successful upload.
    pub fn upload(&mut self, ctx: &mut impl GraphicsContext) {
        let Some(staging) = &self.staging else {
            return;
        };
        let texture = match self.texture {
            TextureState::Ready(texture) => texture,
            TextureState::Failed => return,
            TextureState::Pending => match ctx.create_texture(self.width, self.height) {
                Some(texture) => {
                    self.texture = TextureState::Ready(texture);
                    texture
                }
                None => {
                    log::warn!(
                        "failed to create {}x{} atlas texture, page will not draw",
                        self.width,
                        self.height
                    );
                    self.texture = TextureState::Failed;
                    return;
                }
            },
        };

        ctx.upload_texture(texture, self.width, self.height, staging.as_bytes());
        self.needs_upload = false;
        if self.closed {
            self.staging = None;
        }
    }

    /// Draw part of the entry at `item` into the surface.
    pub fn draw(&mut self, ctx: &mut impl GraphicsContext, item: AtlasRect, blit: &AtlasBlit) {
        if self.needs_upload {
            self.upload(ctx);
        }
        let TextureState::Ready(texture) = self.texture else {
            return;
        };

        let mut src = blit.src + Vec2::new(f64::from(item.x0), f64::from(item.y0));
        let mut dst = blit.dst;
        if let Some(clip) = blit.clip {
            let (dst_w, dst_h) = (dst.width(), dst.height());
            if dst_w <= 0.0 || dst_h <= 0.0 {
                return;
            }
            let (src_w, src_h) = (src.width(), src.height());
            src.x0 += clip.x0 / dst_w * src_w;
            src.x1 -= clip.x1 / dst_w * src_w;
            src.y0 += clip.y0 / dst_h * src_h;
            src.y1 -= clip.y1 / dst_h * src_h;
            dst.x0 += clip.x0;
            dst.x1 -= clip.x1;
            dst.y0 += clip.y0;
            dst.y1 -= clip.y1;
        }
        if is_degenerate(&dst) {
            return;
        }

        ctx.draw_textured_quad(&TexturedQuad {
            texture,
            texture_size: (self.width, self.height),
            src,
            dst,
            tint: blit.tint,
        });
    }

    /// Release the CPU storage and hand back the GPU texture, if any.
    pub fn release(&mut self) -> Option<TextureId> {
        self.staging = None;
        match core::mem::replace(&mut self.texture, TextureState::Failed) {
            TextureState::Ready(texture) => Some(texture),
            TextureState::Pending | TextureState::Failed => None,
        }
    }

    /// Page width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the page refuses new allocations.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the staging buffer holds pixels the texture does not have yet.
    #[inline]
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Whether the staging buffer is currently allocated.
    #[inline]
    pub fn has_staging(&self) -> bool {
        self.staging.is_some()
    }

    /// Number of items allocated on this page and not yet removed.
    #[inline]
    pub fn live_items(&self) -> usize {
        self.live_items
    }

    /// The GPU texture, once created.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        match self.texture {
            TextureState::Ready(texture) => Some(texture),
            TextureState::Pending | TextureState::Failed => None,
        }
    }
}

impl fmt::Debug for AtlasPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasPage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("x", &self.x)
            .field("current_line", &self.current_line)
            .field("next_line", &self.next_line)
            .field("closed", &self.closed)
            .field("needs_upload", &self.needs_upload)
            .field("live_items", &self.live_items)
            .field("texture", &self.texture)
            .finish_non_exhaustive()
    }
}
