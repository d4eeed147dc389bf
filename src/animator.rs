// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Logical sprite slots and their serialisation into the sprite table.

use log::debug;

use crate::vdp::Renderer;
use crate::vdp::sprite::{MAX_SPRITES, SPRITE_BIAS, SPRITE_ENTRY_BYTES, SpriteEntry};
use crate::vdp::tile::NameTableEntry;

/// Number of logical sprite slots
pub const SPRITE_SLOTS: usize = MAX_SPRITES;

/// X value marking a slot as unused
pub const DISABLED_X: i16 = 0x4000;

/// One logical sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSlot {
    pub x: i16,
    pub y: i16,
    /// Name-table style pattern word: priority, palette, flips, tile
    pub tile_ref: u16,
    /// `wwhh` size in blocks minus one
    pub size_flags: u8,
}

impl SpriteSlot {
    pub const DISABLED: SpriteSlot = SpriteSlot {
        x: DISABLED_X,
        y: 0,
        tile_ref: 0,
        size_flags: 0,
    };

    pub fn is_enabled(&self) -> bool {
        self.x != DISABLED_X
    }
}

/// Keeps the sprite slots and the draw order, and writes them to the sprite
/// table when something changed.
pub struct Animator {
    slots: [SpriteSlot; SPRITE_SLOTS],
    // enabled slot ids, ascending
    order: Vec<usize>,
    dirty: bool,
}

impl Animator {
    pub fn new() -> Self {
        Self {
            slots: [SpriteSlot::DISABLED; SPRITE_SLOTS],
            order: Vec::with_capacity(SPRITE_SLOTS),
            dirty: true,
        }
    }

    pub fn slot(&self, id: usize) -> &SpriteSlot {
        &self.slots[id]
    }

    /// Enabled slot ids in draw order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Place sprite `id` at screen position `(x, y)`.
    pub fn set_slot(&mut self, id: usize, x: i16, y: i16, tile_ref: u16, size_flags: u8) {
        assert!(id < SPRITE_SLOTS, "sprite slot {id} out of range");
        assert!(x != DISABLED_X, "sprite slot {id}: x collides with the disabled marker");
        assert!(
            (1 - SPRITE_BIAS..512 - SPRITE_BIAS).contains(&(x as i32)),
            "sprite slot {id}: x={x} not representable"
        );
        assert!(
            (-SPRITE_BIAS..1024 - SPRITE_BIAS).contains(&(y as i32)),
            "sprite slot {id}: y={y} not representable"
        );
        assert!(size_flags <= 0x0F, "sprite slot {id}: bad size flags 0x{size_flags:02X}");

        self.slots[id] = SpriteSlot {
            x,
            y,
            tile_ref,
            size_flags,
        };
        if let Err(pos) = self.order.binary_search(&id) {
            self.order.insert(pos, id);
        }
        self.dirty = true;
    }

    pub fn disable_slot(&mut self, id: usize) {
        assert!(id < SPRITE_SLOTS, "sprite slot {id} out of range");
        self.slots[id] = SpriteSlot::DISABLED;
        if let Ok(pos) = self.order.binary_search(&id) {
            self.order.remove(pos);
        }
        self.dirty = true;
    }

    pub fn clear_all(&mut self) {
        self.slots = [SpriteSlot::DISABLED; SPRITE_SLOTS];
        self.order.clear();
        self.dirty = true;
    }

    /// Sprite table image for the current slots. Enabled slots are packed
    /// in slot order, each linking to the next; the rest is zero.
    pub fn table_bytes(&self) -> Vec<u8> {
        let mut table = vec![0u8; SPRITE_SLOTS * SPRITE_ENTRY_BYTES];
        for (n, &id) in self.order.iter().enumerate() {
            let slot = &self.slots[id];
            let next_link = if n + 1 < self.order.len() { n + 1 } else { 0 };
            let entry = SpriteEntry {
                y_pos: (slot.y as i32 + SPRITE_BIAS) as u16,
                width_blocks: ((slot.size_flags >> 2) & 0x03) + 1,
                height_blocks: (slot.size_flags & 0x03) + 1,
                next_link: next_link as u8,
                pattern: NameTableEntry::from_word(slot.tile_ref),
                x_pos: (slot.x as i32 + SPRITE_BIAS) as u16,
            };
            let out = &mut table[n * SPRITE_ENTRY_BYTES..(n + 1) * SPRITE_ENTRY_BYTES];
            for (chunk, word) in out.chunks_exact_mut(2).zip(entry.to_words()) {
                chunk.copy_from_slice(&word.to_be_bytes());
            }
        }
        table
    }

    /// Write the sprite table into the renderer's VRAM if anything changed.
    /// Returns whether a write happened.
    pub fn commit(&mut self, renderer: &mut Renderer) -> bool {
        if !self.dirty {
            return false;
        }
        let table = self.table_bytes();
        renderer.load_to_vram(&table, renderer.sprite_table_location());
        debug!("committed {} sprites", self.order.len());
        self.dirty = false;
        true
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}
