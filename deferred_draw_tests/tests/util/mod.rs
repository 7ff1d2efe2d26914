// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod asserts;
pub(crate) mod samples;

pub(crate) use asserts::{assert_disjoint, count_calls};
pub(crate) use samples::{glyph, glyph_cache, image, image_cache};
