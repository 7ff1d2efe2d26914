// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`GraphicsContext`](crate::GraphicsContext) implementations.

pub mod recording;
