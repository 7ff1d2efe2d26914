// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas cache with shared and dedicated pages and deferred deletion.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::{self, Debug, Formatter};
use core::marker::PhantomData;
use hashbrown::HashMap;

use super::SourceId;
use super::page::{ATLAS_MARGIN, AtlasBlit, AtlasPage, ReserveError};
use super::region::{AtlasRect, PageId};
use crate::context::{GraphicsContext, TextureId};
use crate::math::next_power_of_two_clamped;
use crate::scene::SceneCounter;
use crate::source::{AssetKind, DestroySubscription, Glyphs, Images};

/// Cache of UI images.
pub type ImageCache = AtlasCache<Images>;

/// Cache of rasterized glyphs.
pub type GlyphCache = AtlasCache<Glyphs>;

/// Sizing of atlas pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Edge length of shared pages, rounded up to a power of two.
    ///
    /// Items smaller than a third of this on both axes share pages.
    pub page_size: u32,
    /// Smallest edge length of any page.
    pub min_page_size: u32,
    /// Largest edge length of any page. Larger items cannot be cached.
    pub max_page_size: u32,
}

impl AtlasConfig {
    /// Items strictly below this size on both axes go to the shared page.
    #[inline]
    pub fn small_item_limit(&self) -> u32 {
        self.page_size / 3
    }

    fn page_edge(&self, wanted: u32) -> u32 {
        next_power_of_two_clamped(wanted, self.min_page_size, self.max_page_size)
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            page_size: 512,
            min_page_size: 32,
            max_page_size: 4096,
        }
    }
}

/// Reasons an insertion fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertError {
    /// The item does not fit on a page of the maximum size.
    TooLarge {
        /// Item width.
        width: u32,
        /// Item height.
        height: u32,
        /// The configured maximum page edge.
        max: u32,
    },
    /// A freshly opened page still refused the item.
    PageFull,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { width, height, max } => {
                write!(f, "{width}x{height} item exceeds the {max} pixel atlas page limit")
            }
            Self::PageFull => f.write_str("no atlas page could hold the item"),
        }
    }
}

impl core::error::Error for InsertError {}

impl From<ReserveError> for InsertError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::PageFull => Self::PageFull,
        }
    }
}

/// Summary of a cache's contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasCacheStats {
    /// Cached entries, including those awaiting deferred deletion.
    pub items: usize,
    /// Entries marked deleted but kept for in-flight scenes.
    pub deleted: usize,
    /// Live pages.
    pub pages: usize,
    /// Live pages that no longer accept allocations.
    pub closed_pages: usize,
    /// Textures of destroyed pages waiting for [`AtlasCache::release_textures`].
    pub pending_texture_frees: usize,
}

/// Internal cache entry.
#[derive(Debug)]
struct CacheItem {
    page: PageId,
    rect: AtlasRect,
    deleted: bool,
    /// Distinguishes destroy notifications of a replaced source from those of
    /// the current one.
    token: u64,
    /// Cancels the destroy hook once the entry is released.
    subscription: DestroySubscription,
}

/// Destroy notifications waiting to be processed.
type DestroyedInbox = Rc<RefCell<Vec<(SourceId, u64)>>>;

/// Packs sources of one [`AssetKind`] into shared GPU textures.
///
/// Small items share an "active" page until it fills up; large items get a
/// page of their own that is closed right away. While any scene is active,
/// removals only mark entries as deleted; [`sweep_deleted`](Self::sweep_deleted)
/// finalizes them once every scene has reset.
pub struct AtlasCache<K: AssetKind> {
    config: AtlasConfig,
    scenes: SceneCounter,
    items: HashMap<SourceId, CacheItem>,
    pages: Vec<Option<AtlasPage>>,
    active_page: Option<PageId>,
    destroyed: DestroyedInbox,
    next_token: u64,
    released_textures: Vec<TextureId>,
    kind: PhantomData<fn() -> K>,
}

impl<K: AssetKind> AtlasCache<K> {
    /// Create an empty cache that defers deletion while `scenes` has active scenes.
    pub fn new(config: AtlasConfig, scenes: SceneCounter) -> Self {
        Self {
            config,
            scenes,
            items: HashMap::new(),
            pages: Vec::new(),
            active_page: None,
            destroyed: Rc::default(),
            next_token: 0,
            released_textures: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Whether `id` has a live entry.
    ///
    /// Entries awaiting deferred deletion, and entries whose source has been
    /// destroyed, are not reported.
    pub fn contains(&self, id: SourceId) -> bool {
        let Some(item) = self.items.get(&id) else {
            return false;
        };
        !item.deleted && !self.destroyed.borrow().contains(&(id, item.token))
    }

    /// Copy `source` into the atlas.
    ///
    /// An existing entry with the same id is replaced once the new space has
    /// been reserved; if the reservation fails the old entry stays in place.
    /// Returns the rectangle the source occupies within its page.
    pub fn insert(&mut self, source: &K::Source) -> Result<AtlasRect, InsertError> {
        self.process_destroyed();

        let id = K::id(source);
        let (width, height) = K::size(source);
        let limit = self.config.small_item_limit();
        let (page_id, rect) = if width < limit && height < limit {
            self.reserve_shared(id, width, height)?
        } else {
            self.reserve_dedicated(id, width, height)?
        };

        if !rect.is_empty() {
            if let Some(staging) = self.page_mut(page_id).and_then(AtlasPage::staging_mut) {
                K::blit_into(source, staging, rect.x0, rect.y0);
                if K::CONVERT_SOURCE_FORMAT {
                    staging.convert_region(rect);
                }
            }
        }

        let token = self.next_token;
        self.next_token += 1;
        let inbox = Rc::downgrade(&self.destroyed);
        let subscription = K::watch(
            source,
            Box::new(move || {
                if let Some(inbox) = inbox.upgrade() {
                    inbox.borrow_mut().push((id, token));
                }
            }),
        );

        let item = CacheItem {
            page: page_id,
            rect,
            deleted: false,
            token,
            subscription,
        };
        if let Some(old) = self.items.insert(id, item) {
            log::debug!("replaced cached {} {id:?}", K::NAME);
            self.release_entry(old);
        }
        Ok(rect)
    }

    /// Remove the entry for `id`.
    ///
    /// While a scene is active the entry is only marked deleted and keeps
    /// drawing, because an enqueued item may still refer to it.
    pub fn remove(&mut self, id: SourceId) {
        self.process_destroyed();
        self.remove_entry(id);
    }

    /// Finalize every entry marked deleted.
    ///
    /// Does nothing while any scene is active.
    pub fn sweep_deleted(&mut self) {
        self.process_destroyed();
        if self.scenes.is_any_active() {
            return;
        }
        let deleted: Vec<SourceId> = self
            .items
            .iter()
            .filter(|(_, item)| item.deleted)
            .map(|(id, _)| *id)
            .collect();
        if deleted.is_empty() {
            return;
        }
        log::debug!("sweeping {} deleted {} entries", deleted.len(), K::NAME);
        for id in deleted {
            if let Some(item) = self.items.remove(&id) {
                self.release_entry(item);
            }
        }
    }

    /// Draw part of the entry for `id`.
    ///
    /// Unknown ids are ignored: a scene item outliving its entry means the
    /// deferred deletion handshake was bypassed, which is not worth failing a
    /// frame over.
    pub fn draw_item(&mut self, ctx: &mut impl GraphicsContext, id: SourceId, blit: &AtlasBlit) {
        let Some(item) = self.items.get(&id) else {
            log::warn!("draw of evicted {} {id:?} ignored", K::NAME);
            return;
        };
        let (page_id, rect) = (item.page, item.rect);
        if let Some(page) = self.page_mut(page_id) {
            page.draw(ctx, rect, blit);
        }
    }

    /// Free the textures of pages destroyed since the last call.
    pub fn release_textures(&mut self, ctx: &mut impl GraphicsContext) {
        for texture in self.released_textures.drain(..) {
            ctx.destroy_texture(texture);
        }
    }

    /// Drop every entry and page and free all textures.
    pub fn destroy(&mut self, ctx: &mut impl GraphicsContext) {
        self.items.clear();
        self.destroyed.borrow_mut().clear();
        self.active_page = None;
        for slot in &mut self.pages {
            if let Some(texture) = slot.take().and_then(|mut page| page.release()) {
                self.released_textures.push(texture);
            }
        }
        self.pages.clear();
        self.release_textures(ctx);
    }

    /// The rectangle an entry occupies within its page.
    pub fn item_rect(&self, id: SourceId) -> Option<AtlasRect> {
        self.items.get(&id).map(|item| item.rect)
    }

    /// The page an entry lives on.
    pub fn item_page(&self, id: SourceId) -> Option<PageId> {
        self.items.get(&id).map(|item| item.page)
    }

    /// Whether the entry for `id` is awaiting deferred deletion.
    pub fn is_deleted(&self, id: SourceId) -> bool {
        self.items.get(&id).is_some_and(|item| item.deleted)
    }

    /// Look up a page.
    pub fn page(&self, id: PageId) -> Option<&AtlasPage> {
        self.pages.get(id.index()).and_then(Option::as_ref)
    }

    /// Iterate over live pages in slot order.
    pub fn pages(&self) -> impl Iterator<Item = (PageId, &AtlasPage)> + '_ {
        self.pages.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|page| (PageId::from_index(index), page))
        })
    }

    /// The page small items are currently packed into.
    #[inline]
    pub fn active_page(&self) -> Option<PageId> {
        self.active_page
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.pages.iter().flatten().count()
    }

    /// Number of entries, including those awaiting deferred deletion.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The page sizing in use.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Summarize the cache's contents.
    pub fn stats(&self) -> AtlasCacheStats {
        AtlasCacheStats {
            items: self.items.len(),
            deleted: self.items.values().filter(|item| item.deleted).count(),
            pages: self.page_count(),
            closed_pages: self.pages.iter().flatten().filter(|page| page.is_closed()).count(),
            pending_texture_frees: self.released_textures.len(),
        }
    }

    // ---------------------------------------------------------------------------
    // Private helpers
    // ---------------------------------------------------------------------------

    fn page_mut(&mut self, id: PageId) -> Option<&mut AtlasPage> {
        self.pages.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn add_page(&mut self, page: AtlasPage) -> PageId {
        log::debug!(
            "opening {}x{} {} atlas page",
            page.width(),
            page.height(),
            K::NAME
        );
        if let Some(index) = self.pages.iter().position(Option::is_none) {
            self.pages[index] = Some(page);
            return PageId::from_index(index);
        }
        self.pages.push(Some(page));
        PageId::from_index(self.pages.len() - 1)
    }

    fn open_active_page(&mut self) -> PageId {
        let edge = self.config.page_edge(self.config.page_size);
        let id = self.add_page(AtlasPage::new(edge, edge));
        self.active_page = Some(id);
        id
    }

    fn reserve_shared(
        &mut self,
        id: SourceId,
        width: u32,
        height: u32,
    ) -> Result<(PageId, AtlasRect), InsertError> {
        let page_id = match self.active_page {
            Some(page_id) => page_id,
            None => self.open_active_page(),
        };
        let Some(page) = self.page_mut(page_id) else {
            return Err(InsertError::PageFull);
        };
        match page.reserve(id, width, height) {
            Ok(rect) => Ok((page_id, rect)),
            Err(ReserveError::PageFull) => {
                let retired_empty = page.live_items() == 0;
                let fresh = self.open_active_page();
                if retired_empty {
                    self.destroy_page(page_id);
                }
                let page = self.page_mut(fresh).ok_or(InsertError::PageFull)?;
                let rect = page.reserve(id, width, height)?;
                Ok((fresh, rect))
            }
        }
    }

    fn reserve_dedicated(
        &mut self,
        id: SourceId,
        width: u32,
        height: u32,
    ) -> Result<(PageId, AtlasRect), InsertError> {
        let max = self.config.max_page_size;
        let padded_w = width.saturating_add(ATLAS_MARGIN);
        let padded_h = height.saturating_add(ATLAS_MARGIN);
        if padded_w > max || padded_h > max {
            log::warn!(
                "{} {id:?} is {width}x{height}, too large for a {max} pixel atlas page",
                K::NAME
            );
            return Err(InsertError::TooLarge { width, height, max });
        }

        let (page_w, page_h) = (self.config.page_edge(padded_w), self.config.page_edge(padded_h));
        let mut page = AtlasPage::new(page_w, page_h);
        let rect = page.reserve(id, width, height)?;
        page.close();
        Ok((self.add_page(page), rect))
    }

    fn remove_entry(&mut self, id: SourceId) {
        if self.scenes.is_any_active() {
            if let Some(item) = self.items.get_mut(&id) {
                if !item.deleted {
                    log::debug!("deferring deletion of {} {id:?}", K::NAME);
                }
                item.deleted = true;
            }
            return;
        }
        if let Some(item) = self.items.remove(&id) {
            self.release_entry(item);
        }
    }

    fn release_entry(&mut self, item: CacheItem) {
        let Some(page) = self.page_mut(item.page) else {
            return;
        };
        let remaining = page.release_item();
        if remaining == 0 && self.active_page != Some(item.page) {
            self.destroy_page(item.page);
        }
    }

    fn destroy_page(&mut self, id: PageId) {
        let Some(mut page) = self.pages.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        log::debug!(
            "destroying {}x{} {} atlas page",
            page.width(),
            page.height(),
            K::NAME
        );
        if let Some(texture) = page.release() {
            self.released_textures.push(texture);
        }
    }

    fn process_destroyed(&mut self) {
        let destroyed = core::mem::take(&mut *self.destroyed.borrow_mut());
        for (id, token) in destroyed {
            if self.items.get(&id).is_some_and(|item| item.token == token) {
                self.remove_entry(id);
            }
        }
    }
}

impl<K: AssetKind> Debug for AtlasCache<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasCache")
            .field("kind", &K::NAME)
            .field("items", &self.items.len())
            .field("pages", &self.page_count())
            .field("active_page", &self.active_page)
            .finish_non_exhaustive()
    }
}

impl<K: AssetKind> Drop for AtlasCache<K> {
    fn drop(&mut self) {
        let leaked = self.released_textures.len()
            + self
                .pages
                .iter()
                .flatten()
                .filter(|page| page.texture().is_some())
                .count();
        if leaked > 0 {
            log::warn!(
                "{} atlas cache dropped with {leaked} textures still allocated",
                K::NAME
            );
        }
    }
}
