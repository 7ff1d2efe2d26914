// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Individual deferred drawing operations.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt::{Debug, Formatter};

use crate::atlas::{AtlasBlit, SourceId};
use crate::color::{AlphaColor, Srgb};
use crate::context::GraphicsContext;
use crate::kurbo::{Line, Rect};
use crate::resources::RenderResources;

/// Which atlas cache a blit samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtlasKind {
    /// The image cache.
    Image,
    /// The glyph cache.
    Glyph,
}

/// An externally supplied drawing callback.
///
/// Custom items may change global context state (viewport, blend mode, bound
/// textures), so by default the scene saves the context configuration before
/// them and restores it afterwards.
pub trait CustomDraw {
    /// The area this item may touch, used for clipping in the draw buffer.
    fn bounds(&self) -> Rect;

    /// Whether replay must wrap this item in a configuration save/restore pair.
    fn needs_save_restore(&self) -> bool {
        true
    }

    /// Called right before [`draw`](Self::draw).
    fn pre_draw(&mut self, ctx: &mut dyn GraphicsContext) {
        let _ = ctx;
    }

    /// Issue the actual draw calls.
    fn draw(&mut self, ctx: &mut dyn GraphicsContext);

    /// Called right after [`draw`](Self::draw).
    fn post_draw(&mut self, ctx: &mut dyn GraphicsContext) {
        let _ = ctx;
    }
}

/// Ownership of a custom item.
pub enum CustomItem {
    /// Owned by the scene and dropped when the scene resets.
    Owned(Box<dyn CustomDraw>),
    /// Owned elsewhere and possibly enqueued into several scenes.
    ///
    /// Resetting the scene only drops the scene's handle.
    Shared(Rc<RefCell<dyn CustomDraw>>),
}

impl CustomItem {
    fn with<R>(&mut self, f: impl FnOnce(&mut dyn CustomDraw) -> R) -> Option<R> {
        match self {
            Self::Owned(item) => Some(f(item.as_mut())),
            Self::Shared(item) => match item.try_borrow_mut() {
                Ok(mut item) => Some(f(&mut *item)),
                Err(_) => {
                    log::warn!("skipping shared custom item that is already borrowed");
                    None
                }
            },
        }
    }

    /// The area this item may touch.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Owned(item) => item.bounds(),
            Self::Shared(item) => item.borrow().bounds(),
        }
    }

    fn needs_save_restore(&self) -> bool {
        match self {
            Self::Owned(item) => item.needs_save_restore(),
            Self::Shared(item) => item
                .try_borrow()
                .map_or(true, |item| item.needs_save_restore()),
        }
    }
}

impl Debug for CustomItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("CustomItem::Owned"),
            Self::Shared(item) => write!(f, "CustomItem::Shared({} refs)", Rc::strong_count(item)),
        }
    }
}

/// One deferred drawing operation.
///
/// Items are immutable once built; the scene replays them in insertion order.
#[derive(Debug)]
pub enum SceneItem {
    /// Fill a rectangle with a solid color.
    FillRect {
        /// Area to fill, already clipped.
        rect: Rect,
        /// Fill color, already multiplied by the global alpha.
        color: AlphaColor<Srgb>,
    },
    /// Draw a line segment.
    Line {
        /// The segment, already clipped.
        line: Line,
        /// Line color, already multiplied by the global alpha.
        color: AlphaColor<Srgb>,
    },
    /// Blit part of a cached atlas entry.
    Blit {
        /// The cache the entry lives in.
        kind: AtlasKind,
        /// The cached source.
        id: SourceId,
        /// Geometry and tint.
        blit: AtlasBlit,
    },
    /// Run an external callback.
    Custom(CustomItem),
}

impl SceneItem {
    /// Whether replay must save and restore the context configuration around this item.
    pub fn needs_save_restore(&self) -> bool {
        match self {
            Self::FillRect { .. } | Self::Line { .. } | Self::Blit { .. } => false,
            Self::Custom(item) => item.needs_save_restore(),
        }
    }

    /// Short name of the item's variant, for logging.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::FillRect { .. } => "fill",
            Self::Line { .. } => "line",
            Self::Blit {
                kind: AtlasKind::Image,
                ..
            } => "image blit",
            Self::Blit {
                kind: AtlasKind::Glyph,
                ..
            } => "glyph blit",
            Self::Custom(_) => "custom",
        }
    }

    /// Whether this item is owned outside the scene.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Custom(CustomItem::Shared(_)))
    }

    pub(crate) fn pre_draw(&mut self, ctx: &mut dyn GraphicsContext) {
        if let Self::Custom(item) = self {
            item.with(|item| item.pre_draw(ctx));
        }
    }

    pub(crate) fn draw(&mut self, ctx: &mut impl GraphicsContext, resources: &mut RenderResources) {
        match self {
            Self::FillRect { rect, color } => ctx.fill_rect(*rect, *color),
            Self::Line { line, color } => ctx.draw_line(*line, *color),
            Self::Blit { kind, id, blit } => match kind {
                AtlasKind::Image => resources.images.draw_item(ctx, *id, blit),
                AtlasKind::Glyph => resources.glyphs.draw_item(ctx, *id, blit),
            },
            Self::Custom(item) => {
                let ctx: &mut dyn GraphicsContext = ctx;
                item.with(|item| item.draw(ctx));
            }
        }
    }

    pub(crate) fn post_draw(&mut self, ctx: &mut dyn GraphicsContext) {
        if let Self::Custom(item) = self {
            item.with(|item| item.post_draw(ctx));
        }
    }
}
