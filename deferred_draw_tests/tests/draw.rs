// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for whole frames driven through the `DrawBuffer` facade.

use deferred_draw::renderers::recording::{GpuCall, RecordingContext};
use deferred_draw::{AtlasConfig, DrawBuffer, PixelSource, RenderConfig};
use peniko::color::palette::css::{BLACK, RED, WHITE};
use peniko::kurbo::{Point, Rect, Size};

use crate::util::{count_calls, glyph, image};

fn draw_buffer() -> DrawBuffer {
    DrawBuffer::new(RenderConfig::default())
}

#[test]
fn draw_text_line_uses_one_texture() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let glyphs = [glyph(7, 10), glyph(6, 8), glyph(7, 10), glyph(3, 12)];

    for frame in 0..3 {
        buffer.begin_frame(Size::new(200.0, 50.0));
        let mut pen = Point::new(5.0, 20.0);
        for g in &glyphs {
            buffer.draw_glyph(g, pen, BLACK);
            pen.x += 8.0;
        }
        buffer.end_frame(&mut ctx);
        assert_eq!(ctx.textured_quads().len(), 4 * (frame + 1));
    }

    let creates = count_calls(ctx.calls(), |call| {
        matches!(call, GpuCall::CreateTexture { .. })
    });
    let uploads = count_calls(ctx.calls(), |call| {
        matches!(call, GpuCall::UploadTexture { .. })
    });
    assert_eq!((creates, uploads), (1, 1));
    assert_eq!(buffer.resources().glyphs().len(), 4);
}

#[test]
fn draw_image_dropped_mid_frame_still_draws() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let img = image(256, 64);
    let id = img.id();

    buffer.begin_frame(Size::new(400.0, 400.0));
    buffer.draw_image_region(&img, Rect::new(0.0, 0.0, 256.0, 64.0), Point::ORIGIN, WHITE);
    drop(img);
    assert!(!buffer.resources().images().contains(id));
    buffer.end_frame(&mut ctx);

    // The quad was drawn before the page's texture was released.
    let calls = ctx.calls();
    let quad = calls
        .iter()
        .position(|call| matches!(call, GpuCall::DrawTexturedQuad(_)))
        .unwrap();
    let destroy = calls
        .iter()
        .position(|call| matches!(call, GpuCall::DestroyTexture(_)))
        .unwrap();
    assert!(quad < destroy);
    assert_eq!(calls[destroy - 1], GpuCall::Flush);
    assert!(buffer.resources().images().is_empty());
    assert_eq!(ctx.live_textures(), 0);
}

#[test]
fn draw_removal_between_frames_is_immediate() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let img = image(300, 300);
    let id = img.id();

    buffer.begin_frame(Size::new(400.0, 400.0));
    buffer.draw_image_region(&img, Rect::new(0.0, 0.0, 300.0, 300.0), Point::ORIGIN, WHITE);
    buffer.end_frame(&mut ctx);
    assert_eq!(ctx.live_textures(), 1);

    buffer.resources_mut().images_mut().remove(id);
    assert!(buffer.resources().images().item_rect(id).is_none());
    assert_eq!(buffer.resources().images().stats().pending_texture_frees, 1);
    buffer.resources_mut().release_textures(&mut ctx);
    assert_eq!(ctx.live_textures(), 0);
}

#[test]
fn draw_clipped_image_shrinks_source() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let img = image(50, 50);

    buffer.begin_frame(Size::new(100.0, 100.0));
    buffer.push_clip(Rect::new(10.0, -10.0, 90.0, 110.0));
    buffer.draw_image_region_scaled(
        &img,
        Rect::new(0.0, 0.0, 50.0, 50.0),
        Rect::new(0.0, 0.0, 100.0, 100.0),
        WHITE,
        0.0,
    );
    buffer.pop_clip();
    buffer.end_frame(&mut ctx);

    let rect = buffer.resources().images().item_rect(img.id()).unwrap();
    let (x, y) = (f64::from(rect.x0), f64::from(rect.y0));
    let quads = ctx.textured_quads();
    assert_eq!(quads.len(), 1);
    assert_eq!(quads[0].dst, Rect::new(10.0, 0.0, 90.0, 100.0));
    assert_eq!(quads[0].src, Rect::new(x + 5.0, y, x + 45.0, y + 50.0));
}

#[test]
fn draw_invisible_calls_leave_no_trace() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let img = image(10, 10);
    let g = glyph(5, 5);

    buffer.begin_frame(Size::new(100.0, 100.0));
    buffer.set_clip(Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
    buffer.fill_rect(Rect::new(30.0, 30.0, 40.0, 40.0), RED);
    buffer.draw_glyph(&g, Point::new(50.0, 50.0), RED);
    let clear = RED.with_alpha(0.0);
    buffer.draw_image_region(&img, Rect::new(0.0, 0.0, 10.0, 10.0), Point::ORIGIN, clear);
    assert_eq!(buffer.pending_items(), 0);
    buffer.end_frame(&mut ctx);

    assert_eq!(
        ctx.calls(),
        &[
            GpuCall::SetProjection(Rect::new(0.0, 0.0, 100.0, 100.0)),
            GpuCall::Flush
        ]
    );
    assert!(buffer.resources().images().is_empty());
    assert!(buffer.resources().glyphs().is_empty());
}

#[test]
fn draw_small_glyph_pages_roll_over() {
    let config = RenderConfig {
        glyphs: AtlasConfig {
            page_size: 64,
            min_page_size: 16,
            max_page_size: 1024,
        },
        ..RenderConfig::default()
    };
    let mut buffer = DrawBuffer::new(config);
    let mut ctx = RecordingContext::new();
    let glyphs: Vec<_> = (0..16).map(|_| glyph(20, 16)).collect();

    buffer.begin_frame(Size::new(500.0, 500.0));
    for (i, g) in glyphs.iter().enumerate() {
        buffer.draw_glyph(g, Point::new(i as f64 * 24.0, 0.0), BLACK);
    }
    buffer.end_frame(&mut ctx);

    // Six 20x16 glyphs fit on a 64x64 page: two per shelf, three shelves.
    assert_eq!(buffer.resources().glyphs().page_count(), 3);
    assert_eq!(ctx.textured_quads().len(), 16);
    assert_eq!(ctx.live_textures(), 3);
}

#[test]
fn draw_destroy_releases_textures() {
    let mut buffer = draw_buffer();
    let mut ctx = RecordingContext::new();
    let g = glyph(5, 5);
    let img = image(200, 200);

    buffer.begin_frame(Size::new(300.0, 300.0));
    buffer.draw_glyph(&g, Point::ORIGIN, BLACK);
    buffer.draw_image_region(&img, Rect::new(0.0, 0.0, 200.0, 200.0), Point::ORIGIN, WHITE);
    buffer.end_frame(&mut ctx);
    assert_eq!(ctx.live_textures(), 2);

    buffer.begin_frame(Size::new(300.0, 300.0));
    buffer.destroy(&mut ctx);
    assert!(!buffer.in_frame());
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(buffer.resources().active_scenes(), 0);
}
