// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `deferred_draw`.
//!
//! - The `util` module contains shared sources and assertions that are needed by different
//!   test methods.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests. This makes it easier to share utility functions
//!   between test modules.
//! - If you want to add new tests, put them into the module for their topic (atlas, scene,
//!   draw), and start the test name with that topic. For example, `atlas_page_closes` is
//!   better than `page_closes_atlas`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod draw;
mod scene;
mod util;
