// Copyright 2026 the Deferred Draw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU-side staging storage for atlas pages.

use alloc::vec;
use alloc::vec::Vec;

use super::region::AtlasRect;

/// Convert one source-format pixel to the GPU-native format.
///
/// Source pixels are packed `0xTTRRGGBB` where `TT` is *transparency*
/// (`0x00` is fully opaque). Native pixels are RGBA8 in memory order.
#[inline]
pub fn source_to_native(pixel: u32) -> u32 {
    let [b, g, r, transparency] = pixel.to_le_bytes();
    native_pixel(r, g, b, 0xff - transparency)
}

/// Pack an RGBA8 color into a GPU-native pixel.
#[inline]
pub fn native_pixel(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_ne_bytes([r, g, b, a])
}

/// A page-sized pixel buffer holding GPU-native pixels.
///
/// Pages allocate this lazily on their first non-empty item and drop it once
/// the page is closed and fully uploaded.
#[derive(Clone)]
pub struct StagingBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl StagingBuffer {
    /// Create a zeroed (fully transparent) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// The pixel data viewed as tightly packed RGBA8 bytes, ready for upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Read a single pixel. Out-of-bounds reads return `None`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Write a single pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = pixel;
    }

    /// Copy rows of `stride`-wide `src` pixels into the buffer with the top-left
    /// corner at `(x, y)`.
    ///
    /// Rows and columns that would fall outside the buffer are dropped.
    pub fn copy_from(
        &mut self,
        src: &[u32],
        stride: usize,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) {
        if x >= self.width || y >= self.height || stride == 0 {
            return;
        }
        let copy_w = width.min(self.width - x) as usize;
        let copy_h = height.min(self.height - y);
        for row in 0..copy_h {
            let src_start = row as usize * stride;
            let Some(src_row) = src.get(src_start..src_start + copy_w) else {
                break;
            };
            let dst_start = self.index(x, y + row);
            self.pixels[dst_start..dst_start + copy_w].copy_from_slice(src_row);
        }
    }

    /// Convert the pixels inside `rect` from source format to native format.
    ///
    /// Pixels outside `rect`, margins included, are left untouched.
    pub fn convert_region(&mut self, rect: AtlasRect) {
        let x1 = rect.x1.min(self.width);
        let y1 = rect.y1.min(self.height);
        if rect.x0 >= x1 {
            return;
        }
        for y in rect.y0..y1 {
            let start = self.index(rect.x0, y);
            let end = self.index(x1, y);
            for pixel in &mut self.pixels[start..end] {
                *pixel = source_to_native(*pixel);
            }
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl core::fmt::Debug for StagingBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StagingBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
