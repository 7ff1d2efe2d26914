// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred command buffer.
//!
//! A [`Scene`] collects [`SceneItem`]s during a frame and replays them in
//! insertion order (painter's algorithm, no depth sorting). Items that may
//! alter global context state are wrapped in a configuration save/restore
//! pair.
//!
//! Every constructed-but-not-yet-reset scene is counted by a shared
//! [`SceneCounter`]. The atlas caches consult that counter to decide whether a
//! removed entry can be freed right away or must wait, because an enqueued
//! item might still refer to it.

mod item;

pub use item::{AtlasKind, CustomDraw, CustomItem, SceneItem};

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::context::GraphicsContext;
use crate::resources::RenderResources;

/// Shared count of scenes that are open or replaying.
///
/// Cloning the counter yields another handle to the same count.
#[derive(Clone, Debug, Default)]
pub struct SceneCounter {
    count: Rc<Cell<usize>>,
}

impl SceneCounter {
    /// Create a counter with no active scenes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scenes constructed and not yet reset.
    #[inline]
    pub fn active(&self) -> usize {
        self.count.get()
    }

    /// Whether any scene is active.
    #[inline]
    pub fn is_any_active(&self) -> bool {
        self.active() > 0
    }

    fn register(&self) {
        self.count.set(self.count.get() + 1);
    }

    fn release(&self) {
        debug_assert!(self.count.get() > 0, "scene counter underflow");
        self.count.set(self.count.get().saturating_sub(1));
    }
}

/// Lifecycle of a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    /// Accepting new items.
    Open,
    /// Replaying its items.
    Replaying,
    /// Cleared; no longer counted as active.
    Reset,
}

/// An ordered list of deferred drawing operations for one frame.
#[derive(Debug)]
pub struct Scene {
    items: Vec<SceneItem>,
    state: SceneState,
    registration: Option<SceneCounter>,
}

impl Scene {
    /// Create an open scene and count it as active in `counter`.
    pub fn new(counter: &SceneCounter) -> Self {
        counter.register();
        log::debug!("scene opened, {} active", counter.active());
        Self {
            items: Vec::new(),
            state: SceneState::Open,
            registration: Some(counter.clone()),
        }
    }

    /// Append an item. Later items draw over earlier ones.
    pub fn add(&mut self, item: SceneItem) {
        if self.state != SceneState::Open {
            log::warn!("dropping item added to a {:?} scene", self.state);
            return;
        }
        self.items.push(item);
    }

    /// Replay every item into `ctx`, then [`reset`](Self::reset).
    pub fn replay(&mut self, ctx: &mut impl GraphicsContext, resources: &mut RenderResources) {
        if self.state != SceneState::Open {
            log::warn!("ignoring replay of a {:?} scene", self.state);
            return;
        }
        self.state = SceneState::Replaying;
        log::debug!("replaying {} scene items", self.items.len());

        for item in &mut self.items {
            let save = item.needs_save_restore();
            log::trace!("replaying {} item (save/restore: {save})", item.label());
            if save {
                ctx.save_config();
            }
            item.pre_draw(ctx);
            item.draw(ctx, resources);
            item.post_draw(ctx);
            if save {
                ctx.restore_config();
            }
        }

        self.reset();
    }

    /// Drop every item and stop counting this scene as active.
    ///
    /// Persistent items are only released by their owners. Resetting twice is
    /// harmless.
    pub fn reset(&mut self) {
        if !self.items.is_empty() {
            let persistent = self.items.iter().filter(|item| item.is_persistent()).count();
            log::debug!(
                "scene reset: releasing {} items ({persistent} persistent)",
                self.items.len()
            );
        }
        self.items.clear();
        self.state = SceneState::Reset;
        if let Some(counter) = self.registration.take() {
            counter.release();
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Number of enqueued items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no item is enqueued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The enqueued items in replay order.
    #[inline]
    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if let Some(counter) = self.registration.take() {
            counter.release();
        }
    }
}
