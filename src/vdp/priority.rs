// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Deferred rendering of priority fragments.
//!
//! Fragments carrying the priority bit are recorded during the plane and
//! sprite passes and replayed in enqueue order once everything else is
//! composited. The chain is emptied by every replay, so nothing recorded in
//! one frame survives into the next.

use bitvec::slice::BitSlice;

use crate::core::Page;
use crate::vdp::tile::{TILE_ROW_BYTES, row_pixel};

/// One row slice of a tile, waiting to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioDrawTask {
    /// Destination of tile pixel `start`
    pub dst_x: usize,
    pub dst_y: usize,
    /// Sprite fragments obey the occlusion mask; plane fragments do not.
    pub masked: bool,
    pub src: [u8; TILE_ROW_BYTES],
    /// Displayed tile pixels `start..end`
    pub start: u8,
    pub end: u8,
    /// Palette bank already shifted into the high nibble
    pub palette: u8,
    pub h_flip: bool,
}

/// Draw one fragment. Colour 0 is transparent. With a mask, pixels already
/// claimed are skipped and drawn pixels are claimed.
pub fn draw_fragment(page: &mut dyn Page, mask: Option<&mut BitSlice>, task: &PrioDrawTask) {
    let width = page.width();
    let mut mask = mask;
    for (i, p) in (task.start..task.end).enumerate() {
        let color = row_pixel(&task.src, p as usize, task.h_flip);
        if color == 0 {
            continue;
        }
        let x = task.dst_x + i;
        if let Some(mask) = mask.as_deref_mut() {
            let cell = task.dst_y * width + x;
            if mask[cell] {
                continue;
            }
            mask.set(cell, true);
        }
        page.set_pixel(x, task.dst_y, task.palette | color);
    }
}

/// Frame-scoped, insertion-ordered list of deferred fragments.
#[derive(Debug, Default)]
pub struct PrioChain {
    tasks: Vec<PrioDrawTask>,
}

impl PrioChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, task: PrioDrawTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replay every fragment head to tail, then empty the chain.
    /// Returns the number of fragments drawn.
    pub fn drain_and_render(&mut self, page: &mut dyn Page, mask: &mut BitSlice) -> usize {
        let count = self.tasks.len();
        for task in self.tasks.drain(..) {
            let mask = task.masked.then_some(&mut *mask);
            draw_fragment(page, mask, &task);
        }
        count
    }
}
