// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred Draw batches 2D drawing calls into scenes and serves glyphs and
//! images from shared texture atlases.
//!
//! Painting code talks to a [`DrawBuffer`], which clips each primitive, makes
//! sure the glyph or image it needs is cached in an atlas, and enqueues a
//! [`SceneItem`]. At the end of the frame the [`Scene`] replays in insertion
//! order into a [`GraphicsContext`], the only place GPU work happens.
//!
//! Atlas entries may be removed while a scene still refers to them. Removal is
//! then deferred until every scene has reset, so replay never samples from a
//! freed texture.
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm].
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub use peniko::{color, kurbo};

mod context;
mod draw_buffer;
mod math;
mod resources;
mod source;

pub mod atlas;
pub mod renderers;
pub mod scene;

pub use atlas::{AtlasCache, AtlasConfig, GlyphCache, ImageCache, InsertError, SourceId};
pub use context::{GraphicsContext, TextureId, TexturedQuad};
pub use draw_buffer::DrawBuffer;
pub use resources::{RenderConfig, RenderResources};
pub use scene::{AtlasKind, CustomDraw, CustomItem, Scene, SceneCounter, SceneItem, SceneState};
pub use source::{
    AssetKind, DestroyHook, DestroySignal, DestroySubscription, GlyphMask, GlyphSource, Glyphs, ImagePixels, Images,
    PixelSource,
};
