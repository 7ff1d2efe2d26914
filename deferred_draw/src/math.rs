// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical and geometric helper functions.

use core::ops::Sub;

use crate::kurbo::{Insets, Line, Point, Rect};

// From <https://github.com/linebender/tiny-skia/blob/68b198a7210a6bbf752b43d6bc4db62445730313/path/src/scalar.rs#L12>
const SCALAR_NEARLY_ZERO: f32 = 1.0 / (1 << 12) as f32;

/// A number of useful methods for f32 numbers.
pub(crate) trait FloatExt: Sized + Sub<f32, Output = f32> {
    /// Whether the number is approximately 0.
    fn is_nearly_zero(&self) -> bool {
        self.is_nearly_zero_within_tolerance(SCALAR_NEARLY_ZERO)
    }

    /// Whether the number is approximately 0, with a given tolerance.
    fn is_nearly_zero_within_tolerance(&self, tolerance: f32) -> bool;
}

impl FloatExt for f32 {
    #[inline(always)]
    fn is_nearly_zero_within_tolerance(&self, tolerance: f32) -> bool {
        debug_assert!(tolerance >= 0.0, "tolerance must be positive");

        self.abs() <= tolerance
    }
}

/// Whether a rectangle covers no pixels at all.
#[inline]
pub(crate) fn is_degenerate(rect: &Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Intersect `dst` with `clip`.
///
/// Returns the visible part of `dst` together with the amount cut away on each
/// edge, or `None` if nothing is left.
pub(crate) fn clip_rect_insets(dst: Rect, clip: Rect) -> Option<(Rect, Insets)> {
    let visible = Rect::new(
        dst.x0.max(clip.x0),
        dst.y0.max(clip.y0),
        dst.x1.min(clip.x1),
        dst.y1.min(clip.y1),
    );
    if is_degenerate(&visible) {
        return None;
    }
    let insets = Insets::new(
        visible.x0 - dst.x0,
        visible.y0 - dst.y0,
        dst.x1 - visible.x1,
        dst.y1 - visible.y1,
    );
    Some((visible, insets))
}

/// Whether every edge of the insets is zero.
#[inline]
pub(crate) fn insets_are_zero(insets: &Insets) -> bool {
    insets.x0 == 0.0 && insets.y0 == 0.0 && insets.x1 == 0.0 && insets.y1 == 0.0
}

/// Clip a line segment against a rectangle (Liang–Barsky).
///
/// Returns `None` if the segment lies entirely outside `clip`.
pub(crate) fn clip_line(line: Line, clip: Rect) -> Option<Line> {
    let dx = line.p1.x - line.p0.x;
    let dy = line.p1.y - line.p0.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let edges = [
        (-dx, line.p0.x - clip.x0),
        (dx, clip.x1 - line.p0.x),
        (-dy, line.p0.y - clip.y0),
        (dy, clip.y1 - line.p0.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: either fully inside or fully outside.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }

    Some(Line::new(
        Point::new(line.p0.x + t0 * dx, line.p0.y + t0 * dy),
        Point::new(line.p0.x + t1 * dx, line.p0.y + t1 * dy),
    ))
}

/// Round `value` up to a power of two and clamp it to `[min, max]`.
#[inline]
pub(crate) fn next_power_of_two_clamped(value: u32, min: u32, max: u32) -> u32 {
    value
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(max)
        .max(min)
        .min(max)
}
