// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel and glyph sources, and the adapters the atlas caches use to read them.
//!
//! The atlas cache is generic over an [`AssetKind`], which tells it how to
//! measure, identify, copy, and watch a source. [`Images`] adapts
//! [`PixelSource`]s (whose pixels need a format conversion on the way into
//! the atlas) and [`Glyphs`] adapts [`GlyphSource`]s (which write native
//! pixels themselves).

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt::{Debug, Formatter};

use crate::atlas::{SourceId, StagingBuffer, native_pixel};

/// Callback invoked once when a source is destroyed.
pub type DestroyHook = Box<dyn FnOnce()>;

/// Keeps a [`DestroyHook`] registered. Dropping it cancels the hook.
#[derive(Debug, Default)]
pub struct DestroySubscription {
    live: Option<Rc<()>>,
}

impl DestroySubscription {
    /// A subscription that is not tied to any signal.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether the hook is still waiting on a signal.
    pub fn is_attached(&self) -> bool {
        self.live.is_some()
    }
}

/// A set of [`DestroyHook`]s fired exactly once.
///
/// Sources embed one of these and forward [`PixelSource::on_destroy`] to
/// [`subscribe`](Self::subscribe). The hooks fire on [`fire`](Self::fire) or
/// when the signal is dropped, whichever comes first. Hooks subscribed after
/// the signal fired run immediately.
///
/// A hook whose [`DestroySubscription`] was dropped never runs, and is pruned
/// the next time a hook subscribes.
#[derive(Default)]
pub struct DestroySignal {
    hooks: RefCell<Vec<(Weak<()>, DestroyHook)>>,
    fired: Cell<bool>,
}

impl DestroySignal {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook that runs for as long as the returned subscription lives.
    #[must_use = "dropping the subscription cancels the hook"]
    pub fn subscribe(&self, hook: DestroyHook) -> DestroySubscription {
        if self.fired.get() {
            hook();
            return DestroySubscription::detached();
        }
        let live = Rc::new(());
        let mut hooks = self.hooks.borrow_mut();
        hooks.retain(|(live, _)| live.strong_count() > 0);
        hooks.push((Rc::downgrade(&live), hook));
        DestroySubscription { live: Some(live) }
    }

    /// Run every hook that is still subscribed. Later calls do nothing.
    pub fn fire(&self) {
        if self.fired.replace(true) {
            return;
        }
        let hooks = core::mem::take(&mut *self.hooks.borrow_mut());
        for (live, hook) in hooks {
            if live.strong_count() > 0 {
                hook();
            }
        }
    }

    /// Whether the signal has fired.
    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    /// Number of stored hooks, including cancelled ones not yet pruned.
    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }
}

impl Drop for DestroySignal {
    fn drop(&mut self) {
        self.fire();
    }
}

impl Debug for DestroySignal {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DestroySignal")
            .field("hooks", &self.hook_count())
            .field("fired", &self.fired.get())
            .finish()
    }
}

/// An image whose pixels can be cached in an atlas.
pub trait PixelSource {
    /// Stable identity of this source.
    fn id(&self) -> SourceId;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Number of pixels between the starts of two consecutive rows.
    fn stride(&self) -> usize {
        self.width() as usize
    }

    /// Row-major pixels, packed `0xTTRRGGBB` with `TT` being transparency.
    fn pixels(&self) -> &[u32];

    /// Register a hook to run when this source is destroyed.
    ///
    /// The hook is cancelled when the returned subscription is dropped.
    fn on_destroy(&self, hook: DestroyHook) -> DestroySubscription;
}

/// A rasterized glyph whose black box can be cached in an atlas.
pub trait GlyphSource {
    /// Stable identity of this glyph.
    fn id(&self) -> SourceId;

    /// Width of the black box in pixels.
    fn width(&self) -> u32;

    /// Height of the black box in pixels.
    fn height(&self) -> u32;

    /// Write the glyph as native pixels with its top-left corner at `(x, y)`.
    fn blit_into(&self, dst: &mut StagingBuffer, x: u32, y: u32);

    /// Register a hook to run when this glyph is destroyed.
    ///
    /// Glyphs usually live as long as their font, so the default drops the
    /// hook without ever running it.
    fn on_destroy(&self, hook: DestroyHook) -> DestroySubscription {
        drop(hook);
        DestroySubscription::detached()
    }
}

/// How an [`AtlasCache`](crate::atlas::AtlasCache) reads one kind of asset.
pub trait AssetKind {
    /// The source type cached under this kind.
    type Source: ?Sized;

    /// Name used in log messages.
    const NAME: &'static str;

    /// Whether copied pixels must be converted from source to native format.
    const CONVERT_SOURCE_FORMAT: bool;

    /// Identity of `source`.
    fn id(source: &Self::Source) -> SourceId;

    /// Width and height of `source` in pixels.
    fn size(source: &Self::Source) -> (u32, u32);

    /// Copy `source` into `dst` with its top-left corner at `(x, y)`.
    fn blit_into(source: &Self::Source, dst: &mut StagingBuffer, x: u32, y: u32);

    /// Subscribe to the destruction of `source`.
    fn watch(source: &Self::Source, hook: DestroyHook) -> DestroySubscription;
}

/// Asset kind for UI images backed by a [`PixelSource`].
#[derive(Debug)]
pub enum Images {}

impl AssetKind for Images {
    type Source = dyn PixelSource;

    const NAME: &'static str = "image";
    const CONVERT_SOURCE_FORMAT: bool = true;

    fn id(source: &Self::Source) -> SourceId {
        source.id()
    }

    fn size(source: &Self::Source) -> (u32, u32) {
        (source.width(), source.height())
    }

    fn blit_into(source: &Self::Source, dst: &mut StagingBuffer, x: u32, y: u32) {
        dst.copy_from(
            source.pixels(),
            source.stride(),
            source.width(),
            source.height(),
            x,
            y,
        );
    }

    fn watch(source: &Self::Source, hook: DestroyHook) -> DestroySubscription {
        source.on_destroy(hook)
    }
}

/// Asset kind for rasterized glyphs backed by a [`GlyphSource`].
#[derive(Debug)]
pub enum Glyphs {}

impl AssetKind for Glyphs {
    type Source = dyn GlyphSource;

    const NAME: &'static str = "glyph";
    const CONVERT_SOURCE_FORMAT: bool = false;

    fn id(source: &Self::Source) -> SourceId {
        source.id()
    }

    fn size(source: &Self::Source) -> (u32, u32) {
        (source.width(), source.height())
    }

    fn blit_into(source: &Self::Source, dst: &mut StagingBuffer, x: u32, y: u32) {
        source.blit_into(dst, x, y);
    }

    fn watch(source: &Self::Source, hook: DestroyHook) -> DestroySubscription {
        source.on_destroy(hook)
    }
}

/// An owned image in source pixel format.
///
/// Dropping the image (or calling [`destroy`](Self::destroy)) notifies every
/// cache it was inserted into.
#[derive(Debug)]
pub struct ImagePixels {
    id: SourceId,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    signal: DestroySignal,
}

impl ImagePixels {
    /// Create an image from row-major `0xTTRRGGBB` pixels.
    ///
    /// `pixels` is truncated or padded with transparent pixels to
    /// `width * height` entries.
    pub fn new(width: u32, height: u32, mut pixels: Vec<u32>) -> Self {
        pixels.resize(width as usize * height as usize, 0xff00_0000);
        Self {
            id: SourceId::fresh(),
            width,
            height,
            pixels,
            signal: DestroySignal::new(),
        }
    }

    /// Create an image where every pixel has the same value.
    pub fn filled(width: u32, height: u32, pixel: u32) -> Self {
        Self::new(width, height, vec![pixel; width as usize * height as usize])
    }

    /// Replace the identity of this image.
    pub fn with_id(mut self, id: SourceId) -> Self {
        self.id = id;
        self
    }

    /// The signal caches subscribe to.
    pub fn destroy_signal(&self) -> &DestroySignal {
        &self.signal
    }

    /// Destroy the image, notifying caches.
    pub fn destroy(self) {
        self.signal.fire();
    }
}

impl PixelSource for ImagePixels {
    fn id(&self) -> SourceId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    fn on_destroy(&self, hook: DestroyHook) -> DestroySubscription {
        self.signal.subscribe(hook)
    }
}

/// An 8-bit coverage mask rendered as white glyph pixels.
///
/// The tint supplied at draw time provides the glyph color.
#[derive(Debug)]
pub struct GlyphMask {
    id: SourceId,
    width: u32,
    height: u32,
    coverage: Vec<u8>,
    signal: DestroySignal,
}

impl GlyphMask {
    /// Create a glyph from row-major coverage values.
    ///
    /// `coverage` is truncated or padded with zero to `width * height` entries.
    pub fn new(width: u32, height: u32, mut coverage: Vec<u8>) -> Self {
        coverage.resize(width as usize * height as usize, 0);
        Self {
            id: SourceId::fresh(),
            width,
            height,
            coverage,
            signal: DestroySignal::new(),
        }
    }

    /// A glyph with an empty black box, such as a space.
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    /// Replace the identity of this glyph.
    pub fn with_id(mut self, id: SourceId) -> Self {
        self.id = id;
        self
    }
}

impl GlyphSource for GlyphMask {
    fn id(&self) -> SourceId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "row and column indices are bounded by the u32 glyph size"
    )]
    fn blit_into(&self, dst: &mut StagingBuffer, x: u32, y: u32) {
        if self.width == 0 {
            return;
        }
        for (row, line) in self.coverage.chunks_exact(self.width as usize).enumerate() {
            for (col, &alpha) in line.iter().enumerate() {
                dst.set_pixel(
                    x + col as u32,
                    y + row as u32,
                    native_pixel(0xff, 0xff, 0xff, alpha),
                );
            }
        }
    }

    fn on_destroy(&self, hook: DestroyHook) -> DestroySubscription {
        self.signal.subscribe(hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_fires_once() {
        let count = Rc::new(Cell::new(0));
        let signal = DestroySignal::new();
        let c = count.clone();
        let _subscription = signal.subscribe(Box::new(move || c.set(c.get() + 1)));
        signal.fire();
        signal.fire();
        drop(signal);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn signal_fires_on_drop() {
        let count = Rc::new(Cell::new(0));
        let image = ImagePixels::filled(2, 2, 0);
        let c = count.clone();
        let _subscription = image.on_destroy(Box::new(move || c.set(c.get() + 1)));
        drop(image);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn late_subscriber_runs_immediately() {
        let count = Rc::new(Cell::new(0));
        let signal = DestroySignal::new();
        signal.fire();
        let c = count.clone();
        let subscription = signal.subscribe(Box::new(move || c.set(c.get() + 1)));
        assert_eq!(count.get(), 1);
        assert!(!subscription.is_attached());
    }

    #[test]
    fn cancelled_hooks_are_pruned_and_skipped() {
        let count = Rc::new(Cell::new(0));
        let signal = DestroySignal::new();
        for _ in 0..100 {
            let c = count.clone();
            drop(signal.subscribe(Box::new(move || c.set(c.get() + 1))));
        }
        assert_eq!(signal.hook_count(), 1);

        let c = count.clone();
        let _subscription = signal.subscribe(Box::new(move || c.set(c.get() + 10)));
        assert_eq!(signal.hook_count(), 1);
        signal.fire();
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn glyph_mask_writes_white_coverage() {
        let glyph = GlyphMask::new(2, 1, vec![0x80, 0xff]);
        let mut buffer = StagingBuffer::new(4, 4);
        glyph.blit_into(&mut buffer, 1, 2);
        assert_eq!(buffer.pixel(1, 2), Some(native_pixel(0xff, 0xff, 0xff, 0x80)));
        assert_eq!(buffer.pixel(2, 2), Some(native_pixel(0xff, 0xff, 0xff, 0xff)));
        assert_eq!(buffer.pixel(0, 2), Some(0));
    }

    #[test]
    fn image_adapter_reports_size() {
        let image = ImagePixels::filled(3, 5, 0);
        let source: &dyn PixelSource = &image;
        assert_eq!(Images::size(source), (3, 5));
        assert_eq!(Images::id(source), image.id());
    }
}
