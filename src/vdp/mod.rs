// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tile and sprite compositor.
//!
//! [`Renderer`] owns the video memory (VRAM, VSRAM), the plane and table
//! geometry, the sprite occlusion mask and the priority chain. Callers set up
//! a layout, poke tiles and name tables into VRAM, then call
//! [`Renderer::render`] once per frame to composite into a [`Page`].
//!
//! Geometry and address preconditions are asserted: a bad plane selector, an
//! unsupported plane size or an access past the end of VRAM is a caller bug
//! and panics. Only I/O from external payload streams is reported as an
//! error.

pub mod plane;
pub mod priority;
mod render;
pub mod scroll;
pub mod sprite;
pub mod tile;

use std::io::Read;

use bitvec::vec::BitVec;
use log::{debug, warn};
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::core::{Vram, Vsram};
use plane::{Plane, PlaneId, WindowMode, validate_plane_size, window_span};
use priority::PrioChain;
use scroll::{HScrollMode, VScrollMode};
use tile::NameTableEntry;

/// Errors from loading external payloads into video memory.
#[derive(Debug, Error)]
pub enum VdpError {
    #[error("failed to read VRAM payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload of {len} bytes at 0x{addr:04X} runs past the end of VRAM")]
    StreamTooLarge { addr: usize, len: usize },
}

/// Software VDP compositor.
pub struct Renderer {
    vram: Vram,
    vsram: Vsram,
    planes: [Plane; 3],
    width: usize,
    height: usize,
    /// Name-table row stride in entries
    pitch: usize,
    hscroll_table: u16,
    sprite_table: u16,
    hscroll_mode: HScrollMode,
    vscroll_mode: VScrollMode,
    // window split in blocks and the side of each split it covers
    window_split: (usize, usize),
    window_modes: (WindowMode, WindowMode),
    // one bit per screen pixel, set once a sprite pixel is drawn
    mask: BitVec,
    prio: PrioChain,
    last_prio_fragments: usize,
}

impl Renderer {
    /// Create a renderer with the power-on layout.
    pub fn new() -> Self {
        Self::with_layout(&LayoutConfig::default())
    }

    pub fn with_layout(layout: &LayoutConfig) -> Self {
        let mut renderer = Self {
            vram: Vram::new(),
            vsram: Vsram::new(),
            planes: [Plane::default(); 3],
            width: 0,
            height: 0,
            pitch: 0,
            hscroll_table: 0,
            sprite_table: 0,
            hscroll_mode: HScrollMode::default(),
            vscroll_mode: VScrollMode::default(),
            window_split: (0, 0),
            window_modes: (WindowMode::default(), WindowMode::default()),
            mask: BitVec::new(),
            prio: PrioChain::new(),
            last_prio_fragments: 0,
        };
        renderer.apply_layout(layout);
        renderer
    }

    /// Issue every geometry call described by `layout`.
    pub fn apply_layout(&mut self, layout: &LayoutConfig) {
        self.set_resolution(layout.width, layout.height);
        self.set_pitch(layout.pitch);
        self.set_plane_table_location(PlaneId::A, layout.plane_a_table);
        self.set_plane_table_location(PlaneId::B, layout.plane_b_table);
        self.set_plane_table_location(PlaneId::Window, layout.window_table);
        self.setup_plane_ab(layout.plane_width, layout.plane_height);
        self.setup_window_plane(
            layout.window_x,
            layout.window_y,
            layout.window_h_mode,
            layout.window_v_mode,
        );
        self.set_scroll_table_location(layout.hscroll_table);
        self.set_sprite_table_location(layout.sprite_table);
        self.set_hscroll_mode(layout.hscroll_mode);
        self.set_vscroll_mode(layout.vscroll_mode);
    }

    /// Output size in pixels. Both dimensions must be multiples of 8.
    ///
    /// The window plane is placed again for the new screen size; a split that
    /// no longer fits on screen disables it.
    pub fn set_resolution(&mut self, width: usize, height: usize) {
        assert!(
            width > 0 && height > 0 && width % 8 == 0 && height % 8 == 0,
            "unsupported resolution {width}x{height}"
        );
        debug!("resolution {width}x{height}");
        self.width = width;
        self.height = height;
        self.mask = BitVec::repeat(false, width * height);
        self.place_window();
        self.update_table_sizes();
    }

    pub fn set_plane_table_location(&mut self, plane: PlaneId, addr: u16) {
        assert!(addr & 1 == 0, "unaligned name table address 0x{addr:04X}");
        debug!("plane {plane:?} name table at 0x{addr:04X}");
        self.planes[plane.index()].name_table = addr;
    }

    /// Size of planes A and B in pixels.
    pub fn setup_plane_ab(&mut self, width_px: usize, height_px: usize) {
        validate_plane_size(width_px, height_px);
        debug!("plane A/B size {width_px}x{height_px}");
        for plane in [PlaneId::A, PlaneId::B] {
            let p = &mut self.planes[plane.index()];
            p.origin_x = 0;
            p.origin_y = 0;
            p.width_blocks = width_px / 8;
            p.height_blocks = height_px / 8;
            p.wrap_height = height_px;
        }
        self.update_table_sizes();
    }

    /// Place the window plane. `block_x`/`block_y` are the split column and
    /// row; the modes pick which side of each split the window covers. An
    /// empty span on either axis disables the window.
    pub fn setup_window_plane(&mut self, block_x: usize, block_y: usize, h_mode: WindowMode, v_mode: WindowMode) {
        let (cols, rows) = (self.width / 8, self.height / 8);
        assert!(
            block_x <= cols && block_y <= rows,
            "window split ({block_x}, {block_y}) beyond the {cols}x{rows} block screen"
        );
        self.window_split = (block_x, block_y);
        self.window_modes = (h_mode, v_mode);
        self.place_window();
        self.update_table_sizes();
    }

    /// Recompute the window footprint from the stored split for the current
    /// screen size.
    fn place_window(&mut self) {
        let (cols, rows) = (self.width / 8, self.height / 8);
        let (block_x, block_y) = self.window_split;
        let (h_mode, v_mode) = self.window_modes;
        let (x, w, y, h) = if block_x <= cols && block_y <= rows {
            let (x, w) = window_span(block_x, h_mode, cols);
            let (y, h) = window_span(block_y, v_mode, rows);
            (x, w, y, h)
        } else {
            warn!("window split ({block_x}, {block_y}) off the {cols}x{rows} block screen, disabling window");
            self.window_split = (0, 0);
            self.window_modes = (WindowMode::ToLeftOrTop, WindowMode::ToLeftOrTop);
            (0, 0, 0, 0)
        };

        let win = &mut self.planes[PlaneId::Window.index()];
        if w == 0 || h == 0 {
            win.origin_x = 0;
            win.origin_y = 0;
            win.width_blocks = 0;
            win.height_blocks = 0;
        } else {
            win.origin_x = x;
            win.origin_y = y;
            win.width_blocks = w;
            win.height_blocks = h;
        }
        win.wrap_height = self.height;
        debug!("window plane {}x{} blocks at ({}, {})", win.width_blocks, win.height_blocks, win.origin_x, win.origin_y);
    }

    /// VRAM location of the horizontal scroll table.
    pub fn set_scroll_table_location(&mut self, addr: u16) {
        assert!(addr & 1 == 0, "unaligned h-scroll table address 0x{addr:04X}");
        debug!("h-scroll table at 0x{addr:04X}");
        self.hscroll_table = addr;
    }

    pub fn set_sprite_table_location(&mut self, addr: u16) {
        assert!(addr & 1 == 0, "unaligned sprite table address 0x{addr:04X}");
        assert!(
            addr as usize + sprite::MAX_SPRITES * sprite::SPRITE_ENTRY_BYTES <= Vram::SIZE,
            "sprite table at 0x{addr:04X} runs past the end of VRAM"
        );
        debug!("sprite table at 0x{addr:04X}");
        self.sprite_table = addr;
    }

    /// Name-table row stride, in entries.
    pub fn set_pitch(&mut self, pitch: usize) {
        assert!((1..=128).contains(&pitch), "unsupported name table pitch {pitch}");
        debug!("name table pitch {pitch}");
        self.pitch = pitch;
        self.update_table_sizes();
    }

    pub fn set_hscroll_mode(&mut self, mode: HScrollMode) {
        debug!("h-scroll mode {mode:?}");
        self.hscroll_mode = mode;
    }

    pub fn set_vscroll_mode(&mut self, mode: VScrollMode) {
        debug!("v-scroll mode {mode:?}");
        self.vscroll_mode = mode;
    }

    fn update_table_sizes(&mut self) {
        let screen_rows = self.height / 8;
        let pitch = self.pitch;
        for (i, p) in self.planes.iter_mut().enumerate() {
            let rows = if i == PlaneId::Window.index() { screen_rows } else { p.height_blocks };
            p.name_table_size = 2 * pitch * rows;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn plane(&self, plane: PlaneId) -> &Plane {
        &self.planes[plane.index()]
    }

    pub fn hscroll_table_location(&self) -> u16 {
        self.hscroll_table
    }

    pub fn sprite_table_location(&self) -> u16 {
        self.sprite_table
    }

    pub fn hscroll_mode(&self) -> HScrollMode {
        self.hscroll_mode
    }

    pub fn vscroll_mode(&self) -> VScrollMode {
        self.vscroll_mode
    }

    /// Priority fragments replayed by the most recent render call
    pub fn last_priority_fragments(&self) -> usize {
        self.last_prio_fragments
    }

    /// Copy a raw payload into VRAM.
    pub fn load_to_vram(&mut self, data: &[u8], addr: u16) {
        self.vram.load(addr as usize, data);
    }

    /// Read a whole payload stream into VRAM at `addr`. Returns the number of
    /// bytes written.
    pub fn load_stream_to_vram<R: Read>(&mut self, reader: &mut R, addr: u16) -> Result<usize, VdpError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let addr = addr as usize;
        if addr + data.len() > Vram::SIZE {
            return Err(VdpError::StreamTooLarge { addr, len: data.len() });
        }
        self.vram.load(addr, &data);
        debug!("loaded {} byte stream to VRAM 0x{addr:04X}", data.len());
        Ok(data.len())
    }

    pub fn memset_vram(&mut self, addr: u16, value: u8, len: usize) {
        self.vram.fill(addr as usize, value, len);
    }

    pub fn write_u8_vram(&mut self, addr: u16, value: u8) {
        self.vram.write_u8(addr, value);
    }

    pub fn write_u16_vram(&mut self, addr: u16, value: u16) {
        self.vram.write_u16(addr, value);
    }

    pub fn read_u8_vram(&self, addr: u16) -> u8 {
        self.vram.read_u8(addr)
    }

    pub fn read_u16_vram(&self, addr: u16) -> u16 {
        self.vram.read_u16(addr)
    }

    /// Write a VSRAM word by byte address.
    pub fn write_u16_vsram(&mut self, addr: u16, value: u16) {
        self.vsram.write_u16(addr, value);
    }

    pub fn read_u16_vsram(&self, addr: u16) -> u16 {
        self.vsram.read_u16(addr)
    }

    fn entry_addr(&self, plane: PlaneId, x: usize, y: usize) -> u16 {
        let addr = self.planes[plane.index()].entry_addr(self.pitch, x, y);
        assert!(addr + 1 < Vram::SIZE, "name table cell ({x}, {y}) of plane {plane:?} is outside VRAM");
        addr as u16
    }

    /// Decoded name-table cell of `plane` at block `(x, y)`.
    pub fn name_table_entry(&self, plane: PlaneId, x: usize, y: usize) -> NameTableEntry {
        NameTableEntry::from_word(self.vram.read_u16(self.entry_addr(plane, x, y)))
    }

    /// Write a block of name-table entries.
    ///
    /// Without `pattern`, every cell receives `entry`, or with `incr` the
    /// values `entry, entry + 1, ...` in fill order. With `pattern`, cell `i`
    /// in fill order receives `entry + pattern[i]`. Fill order is row by row,
    /// or column by column when `column_major` is set.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect_with_tiles(
        &mut self,
        plane: PlaneId,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        entry: u16,
        incr: bool,
        column_major: bool,
        pattern: Option<&[u16]>,
    ) {
        if let Some(pattern) = pattern {
            assert!(pattern.len() >= w * h, "tile pattern holds {} entries, need {}", pattern.len(), w * h);
        }

        let mut value = entry;
        let mut index = 0usize;
        let mut put = |this: &mut Self, cx: usize, cy: usize| {
            let word = match pattern {
                Some(pattern) => entry.wrapping_add(pattern[index]),
                None => value,
            };
            let addr = this.entry_addr(plane, cx, cy);
            this.vram.write_u16(addr, word);
            if incr {
                value = value.wrapping_add(1);
            }
            index += 1;
        };

        if column_major {
            for cx in x..x + w {
                for cy in y..y + h {
                    put(self, cx, cy);
                }
            }
        } else {
            for cy in y..y + h {
                for cx in x..x + w {
                    put(self, cx, cy);
                }
            }
        }
    }

    /// Zero the name tables of all three planes.
    pub fn clear_planes(&mut self) {
        for plane in PlaneId::ALL {
            let p = self.planes[plane.index()];
            let len = p.name_table_size.min(Vram::SIZE - p.name_table as usize);
            self.vram.fill(p.name_table as usize, 0, len);
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
