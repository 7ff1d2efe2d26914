// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas rectangle and page handle data structures.

use crate::kurbo::Rect;

/// Index of a page within one [`AtlasCache`](super::AtlasCache).
///
/// Handles stay valid for as long as the page holds at least one item, which
/// is exactly as long as any cache entry can refer to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub(crate) u32);

impl PageId {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a cache never holds anywhere near u32::MAX pages"
    )]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A rectangle of atlas pixels, half-open on the right and bottom edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    /// Left edge (inclusive).
    pub x0: u32,
    /// Top edge (inclusive).
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

impl AtlasRect {
    /// Create a rectangle from its edges.
    #[inline]
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(self) -> u32 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(self) -> u32 {
        self.y1 - self.y0
    }

    /// Whether the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Whether two rectangles share at least one pixel.
    #[inline]
    pub const fn overlaps(self, other: Self) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// The same rectangle grown by `margin` pixels on every side, saturating at zero.
    #[inline]
    pub const fn inflate(self, margin: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(margin),
            y0: self.y0.saturating_sub(margin),
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    /// Convert to a floating point rectangle.
    #[inline]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }
}
