// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame drawing facade.

use smallvec::SmallVec;

use crate::atlas::{AtlasBlit, AtlasCache, InsertError, SourceId};
use crate::color::{AlphaColor, Srgb};
use crate::context::GraphicsContext;
use crate::kurbo::{Line, Point, Rect, Size};
use crate::math::{FloatExt, clip_line, clip_rect_insets, insets_are_zero, is_degenerate};
use crate::resources::{RenderConfig, RenderResources};
use crate::scene::{AtlasKind, CustomItem, Scene, SceneItem};
use crate::source::{AssetKind, GlyphSource, PixelSource};

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

/// Turns immediate-mode drawing calls into a deferred [`Scene`].
///
/// Call [`begin_frame`](Self::begin_frame), issue primitives, then
/// [`end_frame`](Self::end_frame) with the graphics context. Primitives are
/// clipped against the current clip rectangle and tinted by the global alpha
/// before they are enqueued; calls that end up invisible enqueue nothing.
#[derive(Debug)]
pub struct DrawBuffer {
    resources: RenderResources,
    scene: Option<Scene>,
    surface: Rect,
    clip: Option<Rect>,
    clip_stack: SmallVec<[Option<Rect>; 4]>,
    global_alpha: f32,
}

impl DrawBuffer {
    /// Create a draw buffer with empty caches.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            resources: RenderResources::new(config),
            scene: None,
            surface: Rect::ZERO,
            clip: None,
            clip_stack: SmallVec::new(),
            global_alpha: 1.0,
        }
    }

    /// The caches and scene counter.
    #[inline]
    pub fn resources(&self) -> &RenderResources {
        &self.resources
    }

    /// The caches and scene counter, mutably.
    #[inline]
    pub fn resources_mut(&mut self) -> &mut RenderResources {
        &mut self.resources
    }

    /// Start a frame covering a surface of the given size.
    ///
    /// Clears the clip state and the global alpha. A scene left over from a
    /// frame that never ended is reset without being replayed.
    pub fn begin_frame(&mut self, size: Size) {
        if let Some(mut stale) = self.scene.take() {
            log::warn!(
                "begin_frame without end_frame, dropping {} unreplayed items",
                stale.len()
            );
            stale.reset();
        }
        self.surface = Rect::from_origin_size(Point::ORIGIN, size);
        self.clip = None;
        self.clip_stack.clear();
        self.global_alpha = 1.0;
        self.scene = Some(self.resources.begin_scene());
    }

    /// Replay the frame into `ctx`.
    ///
    /// Once the scene has reset, deferred deletions are swept and the textures
    /// of destroyed pages are released.
    pub fn end_frame(&mut self, ctx: &mut impl GraphicsContext) {
        let Some(mut scene) = self.scene.take() else {
            log::warn!("end_frame without begin_frame");
            return;
        };
        ctx.set_projection(self.surface);
        scene.replay(ctx, &mut self.resources);
        ctx.flush();
        drop(scene);

        self.resources.sweep_deleted();
        self.resources.release_textures(ctx);
    }

    /// Whether a frame is in progress.
    #[inline]
    pub fn in_frame(&self) -> bool {
        self.scene.is_some()
    }

    /// Number of items enqueued in the current frame.
    pub fn pending_items(&self) -> usize {
        self.scene.as_ref().map_or(0, Scene::len)
    }

    /// The surface area of the current frame.
    #[inline]
    pub fn surface(&self) -> Rect {
        self.surface
    }

    /// Drop any pending frame and every cached texture.
    pub fn destroy(&mut self, ctx: &mut impl GraphicsContext) {
        if let Some(mut scene) = self.scene.take() {
            scene.reset();
        }
        self.resources.destroy(ctx);
    }

    // ---------------------------------------------------------------------------
    // Clip and alpha state
    // ---------------------------------------------------------------------------

    /// Replace the clip rectangle. `None` clips to the surface only.
    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    /// Save the current clip and intersect it with `rect`.
    pub fn push_clip(&mut self, rect: Rect) {
        self.clip_stack.push(self.clip);
        self.clip = Some(match self.clip {
            Some(current) => current.intersect(rect),
            None => rect,
        });
    }

    /// Restore the clip saved by the matching [`push_clip`](Self::push_clip).
    pub fn pop_clip(&mut self) {
        match self.clip_stack.pop() {
            Some(clip) => self.clip = clip,
            None => log::warn!("pop_clip without matching push_clip"),
        }
    }

    /// The current clip rectangle.
    #[inline]
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Set the alpha multiplier applied to every primitive's color.
    ///
    /// Clamped to `[0, 1]`.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
    }

    /// The current global alpha multiplier.
    #[inline]
    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    // ---------------------------------------------------------------------------
    // Primitives
    // ---------------------------------------------------------------------------

    /// Fill a rectangle with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: AlphaColor<Srgb>) {
        let Some(color) = self.tint(color) else {
            return;
        };
        let Some((rect, _)) = clip_rect_insets(rect, self.clip_rect()) else {
            return;
        };
        self.push(SceneItem::FillRect { rect, color });
    }

    /// Fill the single pixel containing `point`.
    pub fn draw_pixel(&mut self, point: Point, color: AlphaColor<Srgb>) {
        let origin = Point::new(point.x.floor(), point.y.floor());
        self.fill_rect(Rect::from_origin_size(origin, (1.0, 1.0)), color);
    }

    /// Draw a line segment.
    pub fn draw_line(&mut self, line: Line, color: AlphaColor<Srgb>) {
        let Some(color) = self.tint(color) else {
            return;
        };
        let Some(line) = clip_line(line, self.clip_rect()) else {
            return;
        };
        self.push(SceneItem::Line { line, color });
    }

    /// Draw a glyph with its black box's top-left corner at `origin`.
    ///
    /// The glyph is cached on first use. Glyphs with an empty black box are
    /// cached but draw nothing.
    pub fn draw_glyph(
        &mut self,
        glyph: &(dyn GlyphSource + 'static),
        origin: Point,
        color: AlphaColor<Srgb>,
    ) {
        if !self.check_frame() {
            return;
        }
        let (width, height) = (glyph.width(), glyph.height());
        if width == 0 || height == 0 {
            if let Err(err) = ensure_cached(&mut self.resources.glyphs, glyph) {
                log::debug!("glyph {:?} not cached: {err}", glyph.id());
            }
            return;
        }
        let Some(tint) = self.tint(color) else {
            return;
        };
        let size = (f64::from(width), f64::from(height));
        let dst = Rect::from_origin_size(origin, size);
        let src = Rect::from_origin_size(Point::ORIGIN, size);
        self.push_blit(AtlasKind::Glyph, glyph, dst, src, tint, 0.0);
    }

    /// Draw the `src` region of an image unscaled, with its top-left corner at `origin`.
    pub fn draw_image_region(
        &mut self,
        image: &(dyn PixelSource + 'static),
        src: Rect,
        origin: Point,
        tint: AlphaColor<Srgb>,
    ) {
        let dst = Rect::from_origin_size(origin, src.size());
        self.draw_image_region_scaled(image, src, dst, tint, 0.0);
    }

    /// Draw the `src` region of an image stretched over `dst`.
    ///
    /// `rotation` (degrees) is recorded on the scene item but not applied.
    pub fn draw_image_region_scaled(
        &mut self,
        image: &(dyn PixelSource + 'static),
        src: Rect,
        dst: Rect,
        tint: AlphaColor<Srgb>,
        rotation: f64,
    ) {
        if !self.check_frame() {
            return;
        }
        let Some(tint) = self.tint(tint) else {
            return;
        };
        if is_degenerate(&src) {
            return;
        }
        self.push_blit(AtlasKind::Image, image, dst, src, tint, rotation);
    }

    /// Enqueue an external drawing callback.
    ///
    /// The item is dropped if its bounds lie entirely outside the clip.
    pub fn draw_custom(&mut self, item: CustomItem) {
        if clip_rect_insets(item.bounds(), self.clip_rect()).is_none() {
            return;
        }
        self.push(SceneItem::Custom(item));
    }

    // ---------------------------------------------------------------------------
    // Private helpers
    // ---------------------------------------------------------------------------

    fn clip_rect(&self) -> Rect {
        match self.clip {
            Some(clip) => clip.intersect(self.surface),
            None => self.surface,
        }
    }

    fn tint(&self, color: AlphaColor<Srgb>) -> Option<AlphaColor<Srgb>> {
        let color = color.multiply_alpha(self.global_alpha);
        (!color.components[3].is_nearly_zero()).then_some(color)
    }

    fn check_frame(&self) -> bool {
        if self.scene.is_none() {
            log::warn!("drawing outside of a frame is ignored");
            return false;
        }
        true
    }

    fn push(&mut self, item: SceneItem) {
        match &mut self.scene {
            Some(scene) => scene.add(item),
            None => log::warn!("drawing outside of a frame is ignored"),
        }
    }

    fn push_blit<S>(
        &mut self,
        kind: AtlasKind,
        source: &S,
        dst: Rect,
        src: Rect,
        tint: AlphaColor<Srgb>,
        rotation: f64,
    ) where
        S: Blittable + ?Sized,
    {
        let Some((_, insets)) = clip_rect_insets(dst, self.clip_rect()) else {
            return;
        };
        let id = source.source_id();
        if let Err(err) = source.ensure_cached(&mut self.resources) {
            log::debug!("{kind:?} {id:?} not drawn: {err}");
            return;
        }
        self.push(SceneItem::Blit {
            kind,
            id,
            blit: AtlasBlit {
                dst,
                src,
                tint,
                clip: (!insets_are_zero(&insets)).then_some(insets),
                rotation,
            },
        });
    }
}

/// Insert `source` into `cache` unless it already has a live entry.
fn ensure_cached<K: AssetKind>(
    cache: &mut AtlasCache<K>,
    source: &K::Source,
) -> Result<(), InsertError> {
    if !cache.contains(K::id(source)) {
        cache.insert(source)?;
    }
    Ok(())
}

/// A source the draw buffer can route to its cache.
trait Blittable {
    fn source_id(&self) -> SourceId;
    fn ensure_cached(&self, resources: &mut RenderResources) -> Result<(), InsertError>;
}

impl Blittable for dyn GlyphSource {
    fn source_id(&self) -> SourceId {
        self.id()
    }

    fn ensure_cached(&self, resources: &mut RenderResources) -> Result<(), InsertError> {
        ensure_cached(&mut resources.glyphs, self)
    }
}

impl Blittable for dyn PixelSource {
    fn source_id(&self) -> SourceId {
        self.id()
    }

    fn ensure_cached(&self, resources: &mut RenderResources) -> Result<(), InsertError> {
        ensure_cached(&mut resources.images, self)
    }
}
