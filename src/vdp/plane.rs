// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tile plane geometry.

use crate::core::Rect;

/// Maximum number of cells a scrolling plane may hold (64x64, 128x32, 32x128).
pub const MAX_PLANE_CELLS: usize = 4096;

/// The three tile grids composited each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-spec", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PlaneId {
    A = 0,
    B = 1,
    Window = 2,
}

impl PlaneId {
    pub const ALL: [PlaneId; 3] = [PlaneId::A, PlaneId::B, PlaneId::Window];

    /// Map a raw plane selector. Anything but 0..=2 is a caller bug.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => PlaneId::A,
            1 => PlaneId::B,
            2 => PlaneId::Window,
            _ => panic!("invalid plane selector {index}"),
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Which side of the split point the window plane covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-spec", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowMode {
    /// Columns left of / rows above the split point.
    #[default]
    ToLeftOrTop,
    /// Columns right of / rows below the split point.
    ToRightOrBottom,
}

/// Placement and name-table location of one plane.
///
/// `origin_*` and the block sizes are in 8x8 cells. For planes A and B the
/// origin is always zero and the size is the scrollable area; for the window
/// plane it is the on-screen footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Plane {
    pub origin_x: usize,
    pub origin_y: usize,
    pub width_blocks: usize,
    pub height_blocks: usize,
    /// Vertical wrap in pixels
    pub wrap_height: usize,
    pub name_table: u16,
    /// Bytes spanned by the name table at the current pitch
    pub name_table_size: usize,
}

impl Plane {
    pub fn width_px(&self) -> usize {
        self.width_blocks * 8
    }

    pub fn is_empty(&self) -> bool {
        self.width_blocks == 0 || self.height_blocks == 0
    }

    /// Footprint in block units
    pub fn block_rect(&self) -> Rect {
        Rect::new(self.origin_x, self.origin_y, self.width_blocks, self.height_blocks)
    }

    /// Byte address of the cell at `(x, y)` given the table pitch in entries.
    pub fn entry_addr(&self, pitch: usize, x: usize, y: usize) -> usize {
        self.name_table as usize + 2 * (y * pitch + x)
    }
}

/// Check a scrolling plane size in pixels.
pub fn validate_plane_size(width_px: usize, height_px: usize) {
    for dim in [width_px, height_px] {
        assert!(
            dim.is_power_of_two() && (8..=1024).contains(&dim),
            "unsupported plane size {width_px}x{height_px}"
        );
    }
    assert!(
        (width_px / 8) * (height_px / 8) <= MAX_PLANE_CELLS,
        "plane size {width_px}x{height_px} exceeds {MAX_PLANE_CELLS} cells"
    );
}

/// Window footprint in blocks for the given split and screen size.
pub fn window_span(split: usize, mode: WindowMode, screen_blocks: usize) -> (usize, usize) {
    assert!(split <= screen_blocks, "window split {split} beyond screen ({screen_blocks} blocks)");
    match mode {
        WindowMode::ToLeftOrTop => (0, split),
        WindowMode::ToRightOrBottom => (split, screen_blocks - split),
    }
}
