// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A graphics context that records every call instead of drawing.
//!
//! Useful for tests, and for checking which GPU work a frame would issue
//! before wiring up a real backend.

use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::color::{AlphaColor, Srgb};
use crate::context::{GraphicsContext, TextureId, TexturedQuad};
use crate::kurbo::{Line, Rect};

/// One recorded [`GraphicsContext`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    /// A texture was requested; `texture` is `None` if creation failed.
    CreateTexture {
        /// The created texture.
        texture: Option<TextureId>,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A texture's contents were replaced.
    UploadTexture {
        /// The target texture.
        texture: TextureId,
        /// Upload width.
        width: u32,
        /// Upload height.
        height: u32,
        /// Number of bytes uploaded.
        bytes: usize,
    },
    /// A texture was released.
    DestroyTexture(TextureId),
    /// The projection was set.
    SetProjection(Rect),
    /// A textured quad was drawn.
    DrawTexturedQuad(TexturedQuad),
    /// A rectangle was filled.
    FillRect {
        /// The filled area.
        rect: Rect,
        /// The fill color.
        color: AlphaColor<Srgb>,
    },
    /// A line was drawn.
    DrawLine {
        /// The segment.
        line: Line,
        /// The line color.
        color: AlphaColor<Srgb>,
    },
    /// The configuration was pushed.
    SaveConfig,
    /// The configuration was popped.
    RestoreConfig,
    /// Pending work was submitted.
    Flush,
}

#[derive(Clone, Debug)]
struct RecordedTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// A [`GraphicsContext`] that keeps a log of calls and a CPU copy of every texture.
#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: Vec<GpuCall>,
    textures: HashMap<TextureId, RecordedTexture>,
    next_texture: u32,
    fail_textures: bool,
    save_depth: usize,
}

impl RecordingContext {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded since creation or the last [`clear_calls`](Self::clear_calls).
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// The textured quads among the recorded calls, in order.
    pub fn textured_quads(&self) -> Vec<TexturedQuad> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::DrawTexturedQuad(quad) => Some(*quad),
                _ => None,
            })
            .collect()
    }

    /// Forget the recorded calls. Textures are kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Make every following texture creation fail, or succeed again.
    pub fn fail_texture_creation(&mut self, fail: bool) {
        self.fail_textures = fail;
    }

    /// Number of textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Size of a live texture.
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture).map(|t| (t.width, t.height))
    }

    /// Last uploaded contents of a live texture.
    pub fn texture_data(&self, texture: TextureId) -> Option<&[u8]> {
        self.textures.get(&texture).map(|t| t.data.as_slice())
    }

    /// Number of unmatched [`save_config`](GraphicsContext::save_config) calls.
    pub fn save_depth(&self) -> usize {
        self.save_depth
    }
}

impl GraphicsContext for RecordingContext {
    fn create_texture(&mut self, width: u32, height: u32) -> Option<TextureId> {
        let texture = (!self.fail_textures).then(|| {
            let id = TextureId(self.next_texture);
            self.next_texture += 1;
            self.textures.insert(
                id,
                RecordedTexture {
                    width,
                    height,
                    data: Vec::new(),
                },
            );
            id
        });
        self.calls.push(GpuCall::CreateTexture {
            texture,
            width,
            height,
        });
        texture
    }

    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, rgba: &[u8]) {
        match self.textures.get_mut(&texture) {
            Some(recorded) => {
                debug_assert_eq!((recorded.width, recorded.height), (width, height));
                recorded.data.clear();
                recorded.data.extend_from_slice(rgba);
            }
            None => log::warn!("upload to unknown texture {texture:?}"),
        }
        self.calls.push(GpuCall::UploadTexture {
            texture,
            width,
            height,
            bytes: rgba.len(),
        });
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("destroying unknown texture {texture:?}");
        }
        self.calls.push(GpuCall::DestroyTexture(texture));
    }

    fn set_projection(&mut self, area: Rect) {
        self.calls.push(GpuCall::SetProjection(area));
    }

    fn draw_textured_quad(&mut self, quad: &TexturedQuad) {
        self.calls.push(GpuCall::DrawTexturedQuad(*quad));
    }

    fn fill_rect(&mut self, rect: Rect, color: AlphaColor<Srgb>) {
        self.calls.push(GpuCall::FillRect { rect, color });
    }

    fn draw_line(&mut self, line: Line, color: AlphaColor<Srgb>) {
        self.calls.push(GpuCall::DrawLine { line, color });
    }

    fn save_config(&mut self) {
        self.save_depth += 1;
        self.calls.push(GpuCall::SaveConfig);
    }

    fn restore_config(&mut self) {
        debug_assert!(self.save_depth > 0, "restore without matching save");
        self.save_depth = self.save_depth.saturating_sub(1);
        self.calls.push(GpuCall::RestoreConfig);
    }

    fn flush(&mut self) {
        self.calls.push(GpuCall::Flush);
    }
}
