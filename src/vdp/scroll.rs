// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plane scroll tables and timed scrolling.
//!
//! Horizontal offsets live in VRAM at the h-scroll table location, one
//! `(plane A, plane B)` pair of big-endian words per entry. Vertical offsets
//! live in VSRAM, one pair per two-cell column.

use crate::core::{Vram, Vsram};
use crate::timer::StepTimer;
use crate::vdp::Renderer;
use crate::vdp::plane::PlaneId;

/// Horizontal scroll granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-spec", derive(serde::Serialize, serde::Deserialize))]
pub enum HScrollMode {
    #[default]
    FullScreen,
    EightPixelRows,
    OnePixelRows,
}

/// Vertical scroll granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-spec", derive(serde::Serialize, serde::Deserialize))]
pub enum VScrollMode {
    #[default]
    FullScreen,
    /// One offset per 16-pixel strip
    TwoCellColumns,
}

const HSCROLL_ENTRY_BYTES: u16 = 4;

fn plane_word(plane: PlaneId) -> u16 {
    match plane {
        PlaneId::A => 0,
        PlaneId::B => 1,
        PlaneId::Window => panic!("the window plane does not scroll"),
    }
}

/// Horizontal offset of `plane` on screen line `line`.
pub fn read_hscroll(vram: &Vram, table: u16, mode: HScrollMode, plane: PlaneId, line: usize) -> i16 {
    let entry = match mode {
        HScrollMode::FullScreen => 0,
        HScrollMode::EightPixelRows => (line & !7) as u16,
        HScrollMode::OnePixelRows => line as u16,
    };
    let addr = table
        .wrapping_add(entry.wrapping_mul(HSCROLL_ENTRY_BYTES))
        .wrapping_add(2 * plane_word(plane));
    vram.read_u16(addr) as i16
}

/// Vertical offset of `plane` for screen block column `block_col`.
pub fn read_vscroll(vsram: &Vsram, mode: VScrollMode, plane: PlaneId, block_col: usize) -> i16 {
    let pair = match mode {
        VScrollMode::FullScreen => 0,
        VScrollMode::TwoCellColumns => (block_col / 2).min(Vsram::WORDS / 2 - 1),
    };
    vsram.word(2 * pair + plane_word(plane) as usize) as i16
}

/// Drives the full-screen scroll offsets of planes A and B with step timers.
#[derive(Debug, Clone, Default)]
pub struct ScrollManager {
    h: [StepTimer; 2],
    v: [StepTimer; 2],
    h_dirty: bool,
    v_dirty: bool,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start horizontal scrolling of A and B towards the given offsets.
    pub fn set_hscroll_timers(
        &mut self,
        dest_a: i16,
        incr_a: u16,
        delay_a: u16,
        dest_b: i16,
        incr_b: u16,
        delay_b: u16,
    ) {
        self.h[0].start(dest_a, incr_a, delay_a);
        self.h[1].start(dest_b, incr_b, delay_b);
        self.h_dirty = true;
    }

    /// Start vertical scrolling of A and B towards the given offsets.
    pub fn set_vscroll_timers(
        &mut self,
        dest_a: i16,
        incr_a: u16,
        delay_a: u16,
        dest_b: i16,
        incr_b: u16,
        delay_b: u16,
    ) {
        self.v[0].start(dest_a, incr_a, delay_a);
        self.v[1].start(dest_b, incr_b, delay_b);
        self.v_dirty = true;
    }

    pub fn hscroll(&self, plane: PlaneId) -> i16 {
        self.h[plane_word(plane) as usize].current()
    }

    pub fn vscroll(&self, plane: PlaneId) -> i16 {
        self.v[plane_word(plane) as usize].current()
    }

    pub fn is_idle(&self) -> bool {
        self.h.iter().chain(self.v.iter()).all(StepTimer::is_idle)
    }

    /// Advance every timer one frame and publish changed offsets.
    pub fn update(&mut self, renderer: &mut Renderer) {
        for t in &mut self.h {
            self.h_dirty |= t.tick();
        }
        for t in &mut self.v {
            self.v_dirty |= t.tick();
        }

        if self.h_dirty {
            let table = renderer.hscroll_table_location();
            renderer.write_u16_vram(table, self.h[0].current() as u16);
            renderer.write_u16_vram(table.wrapping_add(2), self.h[1].current() as u16);
            self.h_dirty = false;
        }
        if self.v_dirty {
            renderer.write_u16_vsram(0, self.v[0].current() as u16);
            renderer.write_u16_vsram(2, self.v[1].current() as u16);
            self.v_dirty = false;
        }
    }
}
