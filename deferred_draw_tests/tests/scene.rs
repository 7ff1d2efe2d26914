// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for scene replay and the active-scene counter.

use std::cell::RefCell;
use std::rc::Rc;

use deferred_draw::atlas::AtlasBlit;
use deferred_draw::renderers::recording::{GpuCall, RecordingContext};
use deferred_draw::{
    AtlasKind, CustomDraw, CustomItem, GraphicsContext, PixelSource, RenderConfig,
    RenderResources, SceneItem, SceneState,
};
use peniko::color::palette::css::{BLUE, GREEN, RED, WHITE};
use peniko::kurbo::{Line, Rect};

use crate::util::image;

struct Counter {
    draws: Rc<RefCell<u32>>,
}

impl CustomDraw for Counter {
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, 4.0, 4.0)
    }

    fn draw(&mut self, ctx: &mut dyn GraphicsContext) {
        *self.draws.borrow_mut() += 1;
        ctx.fill_rect(self.bounds(), GREEN);
    }
}

#[test]
fn scene_replay_matches_insertion_order() {
    let mut resources = RenderResources::new(RenderConfig::default());
    let mut ctx = RecordingContext::new();
    let area = Rect::new(0.0, 0.0, 10.0, 10.0);
    let mut scene = resources.begin_scene();
    for color in [RED, GREEN, BLUE] {
        scene.add(SceneItem::FillRect { rect: area, color });
    }
    assert_eq!(scene.len(), 3);
    scene.replay(&mut ctx, &mut resources);

    let colors: Vec<_> = ctx
        .calls()
        .iter()
        .map(|call| match call {
            GpuCall::FillRect { color, .. } => *color,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(colors, [RED, GREEN, BLUE]);
}

#[test]
fn scene_mixed_items_keep_order() {
    let mut resources = RenderResources::new(RenderConfig::default());
    let mut ctx = RecordingContext::new();
    let img = image(8, 8);
    resources.images_mut().insert(&img).unwrap();

    let draws = Rc::new(RefCell::new(0));
    let mut scene = resources.begin_scene();
    scene.add(SceneItem::Line {
        line: Line::new((0.0, 0.0), (8.0, 8.0)),
        color: RED,
    });
    scene.add(SceneItem::Blit {
        kind: AtlasKind::Image,
        id: img.id(),
        blit: AtlasBlit {
            dst: Rect::new(0.0, 0.0, 8.0, 8.0),
            src: Rect::new(0.0, 0.0, 8.0, 8.0),
            tint: WHITE,
            clip: None,
            rotation: 0.0,
        },
    });
    scene.add(SceneItem::Custom(CustomItem::Owned(Box::new(Counter {
        draws: draws.clone(),
    }))));
    scene.replay(&mut ctx, &mut resources);

    let kinds: Vec<&str> = ctx
        .calls()
        .iter()
        .map(|call| match call {
            GpuCall::DrawLine { .. } => "line",
            GpuCall::CreateTexture { .. } => "create",
            GpuCall::UploadTexture { .. } => "upload",
            GpuCall::DrawTexturedQuad(_) => "quad",
            GpuCall::SaveConfig => "save",
            GpuCall::FillRect { .. } => "fill",
            GpuCall::RestoreConfig => "restore",
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        ["line", "create", "upload", "quad", "save", "fill", "restore"]
    );
    assert_eq!(*draws.borrow(), 1);
    assert_eq!(ctx.save_depth(), 0);
}

#[test]
fn scene_shared_item_survives_reset() {
    let mut resources = RenderResources::new(RenderConfig::default());
    let mut ctx = RecordingContext::new();
    let draws = Rc::new(RefCell::new(0));
    let shared: Rc<RefCell<dyn CustomDraw>> = Rc::new(RefCell::new(Counter {
        draws: draws.clone(),
    }));

    for _ in 0..2 {
        let mut scene = resources.begin_scene();
        scene.add(SceneItem::Custom(CustomItem::Shared(shared.clone())));
        assert!(scene.items()[0].is_persistent());
        scene.replay(&mut ctx, &mut resources);
    }
    assert_eq!(*draws.borrow(), 2);
    assert_eq!(Rc::strong_count(&shared), 1);
}

#[test]
fn scene_overlapping_scenes_defer_removal() {
    let mut resources = RenderResources::new(RenderConfig::default());
    let mut ctx = RecordingContext::new();
    let img = image(8, 8);
    let id = img.id();
    resources.images_mut().insert(&img).unwrap();

    let mut outer = resources.begin_scene();
    let mut inner = resources.begin_scene();
    assert_eq!(resources.active_scenes(), 2);
    resources.images_mut().remove(id);

    inner.replay(&mut ctx, &mut resources);
    assert_eq!(inner.state(), SceneState::Reset);
    resources.sweep_deleted();
    assert!(resources.images().item_rect(id).is_some());

    outer.reset();
    resources.sweep_deleted();
    assert!(resources.images().item_rect(id).is_none());
    assert_eq!(resources.active_scenes(), 0);
}

#[test]
fn scene_replay_twice_is_ignored() {
    let mut resources = RenderResources::new(RenderConfig::default());
    let mut ctx = RecordingContext::new();
    let mut scene = resources.begin_scene();
    scene.add(SceneItem::FillRect {
        rect: Rect::new(0.0, 0.0, 1.0, 1.0),
        color: RED,
    });
    scene.replay(&mut ctx, &mut resources);
    scene.replay(&mut ctx, &mut resources);
    assert_eq!(ctx.calls().len(), 1);
    assert_eq!(resources.active_scenes(), 0);
}

#[test]
fn scene_dropped_without_replay_releases_counter() {
    let resources = RenderResources::new(RenderConfig::default());
    {
        let _scene = resources.begin_scene();
        assert!(resources.scenes().is_any_active());
    }
    assert!(!resources.scenes().is_any_active());
}
