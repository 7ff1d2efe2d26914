// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use deferred_draw::atlas::AtlasRect;
use deferred_draw::renderers::recording::GpuCall;

/// Assert that no two rectangles come closer than `margin` pixels.
pub(crate) fn assert_disjoint(rects: &[AtlasRect], margin: u32) {
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(
                !a.inflate(margin).overlaps(*b),
                "{a:?} is within {margin}px of {b:?}"
            );
        }
    }
}

/// Count the recorded calls matching `pred`.
pub(crate) fn count_calls(calls: &[GpuCall], pred: impl Fn(&GpuCall) -> bool) -> usize {
    calls.iter().filter(|call| pred(call)).count()
}
