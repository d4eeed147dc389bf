// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-frame driver
//!
//! This module provides the struct that coordinates the compositor, sprite
//! writer, palette faders and scroll timers once per displayed frame.

use crate::animator::Animator;
use crate::config::LayoutConfig;
use crate::core::Page;
use crate::palette::Palettes;
use crate::vdp::Renderer;
use crate::vdp::scroll::ScrollManager;

/// Display state driven by the embedding frame loop
pub struct Display {
    pub renderer: Renderer,
    pub animator: Animator,
    pub palettes: Palettes,
    pub scroll: ScrollManager,

    pub frame_count: u64,
}

impl Display {
    /// Target framerate: 60 Hz (NTSC)
    pub const TARGET_FPS: u64 = 60;

    pub fn new() -> Self {
        Self::with_layout(&LayoutConfig::default())
    }

    pub fn with_layout(layout: &LayoutConfig) -> Self {
        Self {
            renderer: Renderer::with_layout(layout),
            animator: Animator::new(),
            palettes: Palettes::new(),
            scroll: ScrollManager::new(),
            frame_count: 0,
        }
    }

    /// Switch to a new screen layout, dropping all sprites.
    pub fn reset(&mut self, layout: &LayoutConfig) {
        self.renderer.apply_layout(layout);
        self.animator.clear_all();
        self.scroll = ScrollManager::new();
        self.frame_count = 0;
    }

    /// Advance timers, publish sprites and composite the full screen.
    pub fn run_frame(&mut self, page: &mut dyn Page) {
        self.palettes.update();
        self.scroll.update(&mut self.renderer);
        self.animator.commit(&mut self.renderer);
        self.renderer.render(page, -1, -1, -1, -1, false);
        self.frame_count += 1;
    }

    pub fn run_frames(&mut self, page: &mut dyn Page, num_frames: u64) {
        for _ in 0..num_frames {
            self.run_frame(page);
        }
    }

    pub fn stats(&self) -> DisplayStats {
        DisplayStats {
            frame_count: self.frame_count,
            priority_fragments: self.renderer.last_priority_fragments(),
            active_sprites: self.animator.order().len(),
            fading: (0..crate::palette::PALETTE_COUNT).any(|p| self.palettes.fader(p).is_fading()),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayStats {
    pub frame_count: u64,
    pub priority_fragments: usize,
    pub active_sprites: usize,
    pub fading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PixelBuffer;
    use crate::palette::NullHost;
    use crate::vdp::plane::PlaneId;
    use crate::vdp::tile::TILE_BYTES;

    #[test]
    fn display_initialization() {
        let display = Display::new();
        assert_eq!(display.frame_count, 0);
        assert_eq!(display.renderer.width(), 320);
        assert!(!display.stats().fading);
    }

    #[test]
    fn run_frame_commits_sprites() {
        let mut display = Display::new();
        display.renderer.load_to_vram(&[0x33; TILE_BYTES], TILE_BYTES as u16);
        display.animator.set_slot(0, 16, 8, 0x8001, 0);

        let mut page = PixelBuffer::new(320, 224);
        display.run_frame(&mut page);

        assert_eq!(page.pixel(16, 8), 3);
        let stats = display.stats();
        assert_eq!(stats.frame_count, 1);
        assert_eq!(stats.active_sprites, 1);
        assert_eq!(stats.priority_fragments, 8);
        assert!(!display.animator.is_dirty());
    }

    #[test]
    fn run_frames_ticks_faders_and_scroll() {
        let mut display = Display::new();
        display.palettes.fade_palette(1, -3, None, false, false, &mut NullHost);
        display.scroll.set_hscroll_timers(16, 4, 1, 0, 1, 0);

        let mut page = PixelBuffer::new(320, 224);
        display.run_frames(&mut page, 4);

        assert_eq!(display.frame_count, 4);
        assert_eq!(display.palettes.brightness(2), -3);
        assert_eq!(display.scroll.hscroll(PlaneId::A), 16);
        let table = display.renderer.hscroll_table_location();
        assert_eq!(display.renderer.read_u16_vram(table), 16);
        assert!(!display.stats().fading);
    }

    #[test]
    fn reset_drops_sprites() {
        let mut display = Display::new();
        display.animator.set_slot(4, 0, 0, 0, 0);
        let mut page = PixelBuffer::new(320, 224);
        display.run_frame(&mut page);
        display.reset(&LayoutConfig::default());
        assert_eq!(display.frame_count, 0);
        assert!(display.animator.order().is_empty());
    }
}
