// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sprite attribute table entries and the sprite compositing pass.

use log::warn;

use crate::core::{Page, Rect};
use crate::vdp::Renderer;
use crate::vdp::priority::{PrioDrawTask, draw_fragment};
use crate::vdp::tile::{NameTableEntry, fetch_tile_row};

/// Sprite table capacity
pub const MAX_SPRITES: usize = 80;
/// Bytes per sprite table entry
pub const SPRITE_ENTRY_BYTES: usize = 8;
/// Offset added to on-screen sprite coordinates in the table
pub const SPRITE_BIAS: i32 = 128;

const Y_MASK: u16 = 0x03FF;
const X_MASK: u16 = 0x01FF;
const LINK_MASK: u16 = 0x007F;

/// Encode a sprite size in blocks as the 4-bit size flags (`wwhh`, minus one).
pub fn size_flags(width_blocks: u8, height_blocks: u8) -> u8 {
    assert!(
        (1..=4).contains(&width_blocks) && (1..=4).contains(&height_blocks),
        "sprite size {width_blocks}x{height_blocks} blocks out of range"
    );
    ((width_blocks - 1) << 2) | (height_blocks - 1)
}

/// One decoded sprite attribute table entry.
///
/// Wire format, four big-endian words:
/// `------yy yyyyyyyy`, `----wwhh -lllllll`, name-table style pattern word,
/// `-------x xxxxxxxx`. Coordinates carry a +128 bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteEntry {
    pub y_pos: u16,
    pub width_blocks: u8,
    pub height_blocks: u8,
    pub next_link: u8,
    pub pattern: NameTableEntry,
    pub x_pos: u16,
}

impl SpriteEntry {
    pub fn from_words(words: [u16; 4]) -> Self {
        let size = (words[1] >> 8) as u8;
        Self {
            y_pos: words[0] & Y_MASK,
            width_blocks: ((size >> 2) & 0x03) + 1,
            height_blocks: (size & 0x03) + 1,
            next_link: (words[1] & LINK_MASK) as u8,
            pattern: NameTableEntry::from_word(words[2]),
            x_pos: words[3] & X_MASK,
        }
    }

    pub fn to_words(self) -> [u16; 4] {
        [
            self.y_pos & Y_MASK,
            ((size_flags(self.width_blocks, self.height_blocks) as u16) << 8)
                | (self.next_link as u16 & LINK_MASK),
            self.pattern.to_word(),
            self.x_pos & X_MASK,
        ]
    }

    /// On-screen top-left corner
    pub fn screen_pos(&self) -> (i32, i32) {
        (self.x_pos as i32 - SPRITE_BIAS, self.y_pos as i32 - SPRITE_BIAS)
    }

    /// A table x of 0 on a visible line never comes out of the sprite writer,
    /// which always adds the bias. Such entries are refused.
    pub fn violates_position_contract(&self) -> bool {
        self.x_pos == 0 && self.y_pos as i32 >= SPRITE_BIAS
    }
}

/// A zeroed table entry: a 1x1 block sprite at table position (0, 0).
impl Default for SpriteEntry {
    fn default() -> Self {
        Self::from_words([0; 4])
    }
}

impl Renderer {
    /// Decode the sprite table entry at `index`.
    pub fn sprite_entry(&self, index: usize) -> SpriteEntry {
        assert!(index < MAX_SPRITES, "sprite index {index} out of range");
        let base = self.sprite_table.wrapping_add((index * SPRITE_ENTRY_BYTES) as u16);
        let mut words = [0u16; 4];
        for (i, w) in words.iter_mut().enumerate() {
            *w = self.vram.read_u16(base.wrapping_add(2 * i as u16));
        }
        SpriteEntry::from_words(words)
    }

    /// Walk the linked sprite table from slot 0 and draw every sprite,
    /// earlier entries occluding later ones.
    pub(super) fn render_sprites(&mut self, page: &mut dyn Page, clip: Rect) {
        self.mask.fill(false);

        let mut index = 0usize;
        let mut visited = 0usize;
        loop {
            if visited == MAX_SPRITES {
                warn!("sprite link chain exceeds {MAX_SPRITES} entries, stopping");
                break;
            }
            visited += 1;

            let entry = self.sprite_entry(index);
            if entry.violates_position_contract() {
                warn!("ignoring sprite {index} at table x=0, y={}", entry.y_pos);
            } else {
                self.draw_sprite(page, &entry, clip);
            }

            if entry.next_link == 0 {
                break;
            }
            index = entry.next_link as usize;
            if index >= MAX_SPRITES {
                warn!("sprite link {index} beyond table capacity, stopping");
                break;
            }
        }
    }

    fn draw_sprite(&mut self, page: &mut dyn Page, entry: &SpriteEntry, clip: Rect) {
        let (x0, y0) = entry.screen_pos();
        let w = entry.width_blocks as i32;
        let h = entry.height_blocks as i32;

        if x0 + 8 * w <= clip.x as i32
            || y0 + 8 * h <= clip.y as i32
            || x0 >= clip.right() as i32
            || y0 >= clip.bottom() as i32
        {
            return;
        }

        let pattern = entry.pattern;
        // tiles are stored column by column
        for col in 0..w {
            let src_col = if pattern.h_flip() { w - 1 - col } else { col };
            for row in 0..h {
                let src_row = if pattern.v_flip() { h - 1 - row } else { row };
                let tile = pattern.tile_index.wrapping_add((src_col * h + src_row) as u16) & 0x07FF;
                self.draw_sprite_tile(page, tile, x0 + 8 * col, y0 + 8 * row, pattern, clip);
            }
        }
    }

    fn draw_sprite_tile(
        &mut self,
        page: &mut dyn Page,
        tile: u16,
        tx: i32,
        ty: i32,
        pattern: NameTableEntry,
        clip: Rect,
    ) {
        let start = (clip.x as i32 - tx).clamp(0, 8);
        let end = (clip.right() as i32 - tx).clamp(0, 8);
        if start >= end {
            return;
        }

        for row in 0..8 {
            let y = ty + row;
            if y < clip.y as i32 || y >= clip.bottom() as i32 {
                continue;
            }
            let task = PrioDrawTask {
                dst_x: (tx + start) as usize,
                dst_y: y as usize,
                masked: true,
                src: fetch_tile_row(&self.vram, tile, row as usize, pattern.v_flip()),
                start: start as u8,
                end: end as u8,
                palette: pattern.palette_bits(),
                h_flip: pattern.h_flip(),
            };
            if pattern.priority() {
                self.prio.enqueue(task);
            } else {
                draw_fragment(page, Some(self.mask.as_mut_bitslice()), &task);
            }
        }
    }
}
