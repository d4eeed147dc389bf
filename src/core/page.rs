// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Destination pixel pages.
//!
//! The compositor writes 8-bit palette indices (`bank << 4 | color`) into a
//! [`Page`]. The page is owned by the caller; the renderer only borrows it for
//! the duration of a render call.

/// Pixel rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> usize {
        self.x + self.w
    }

    pub const fn bottom(&self) -> usize {
        self.y + self.h
    }

    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Overlap of two rectangles, empty if they do not intersect.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= x || b <= y {
            Rect::default()
        } else {
            Rect::new(x, y, r - x, b - y)
        }
    }
}

/// An indexed-colour drawing surface.
pub trait Page {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn pixel(&self, x: usize, y: usize) -> u8;
    fn set_pixel(&mut self, x: usize, y: usize, value: u8);

    fn fill_rect(&mut self, rect: Rect, value: u8) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.set_pixel(x, y, value);
            }
        }
    }

    /// Copy `src` from `from` into this page with its top-left at `(dx, dy)`.
    fn copy_region(&mut self, from: &dyn Page, src: Rect, dx: usize, dy: usize) {
        for y in 0..src.h {
            for x in 0..src.w {
                let v = from.pixel(src.x + x, src.y + y);
                self.set_pixel(dx + x, dy + y, v);
            }
        }
    }

    /// Record that `rect` changed, for pages backed by a display surface.
    fn mark_dirty(&mut self, _rect: Rect) {}
}

/// Plain in-memory page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    dirty: Vec<Rect>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            dirty: Vec::new(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Dirty rectangles recorded since the last call, oldest first.
    pub fn take_dirty(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.dirty)
    }
}

impl Page for PixelBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    fn set_pixel(&mut self, x: usize, y: usize, value: u8) {
        self.pixels[y * self.width + x] = value;
    }

    fn fill_rect(&mut self, rect: Rect, value: u8) {
        let rect = rect.intersect(&Rect::new(0, 0, self.width, self.height));
        for y in rect.y..rect.bottom() {
            let row = y * self.width;
            self.pixels[row + rect.x..row + rect.right()].fill(value);
        }
    }

    fn mark_dirty(&mut self, rect: Rect) {
        self.dirty.push(rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 8, 10, 10);
        assert_eq!(a.intersect(&b), Rect::new(5, 8, 5, 2));
        assert!(a.intersect(&Rect::new(10, 0, 4, 4)).is_empty());
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut page = PixelBuffer::new(4, 4);
        page.fill_rect(Rect::new(2, 2, 8, 8), 7);
        assert_eq!(page.pixel(1, 1), 0);
        assert_eq!(page.pixel(3, 3), 7);
    }

    #[test]
    fn copy_region_between_pages() {
        let mut src = PixelBuffer::new(4, 4);
        src.set_pixel(1, 1, 9);
        let mut dst = PixelBuffer::new(4, 4);
        dst.copy_region(&src, Rect::new(1, 1, 2, 2), 0, 0);
        assert_eq!(dst.pixel(0, 0), 9);
    }

    #[test]
    fn dirty_rects_are_drained() {
        let mut page = PixelBuffer::new(4, 4);
        page.mark_dirty(Rect::new(0, 0, 2, 2));
        assert_eq!(page.take_dirty(), vec![Rect::new(0, 0, 2, 2)]);
        assert!(page.take_dirty().is_empty());
    }
}
