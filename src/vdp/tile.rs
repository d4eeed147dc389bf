// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tile descriptors and 4bpp pattern access.

use bitflags::bitflags;

use crate::core::Vram;

/// Bytes per 8x8 4bpp tile
pub const TILE_BYTES: usize = 32;
/// Bytes per tile row (8 pixels, two per byte)
pub const TILE_ROW_BYTES: usize = 4;

bitflags! {
    /// Attribute bits of a packed name-table word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TileAttr: u16 {
        const H_FLIP = 0x0800;
        const V_FLIP = 0x1000;
        const PRIORITY = 0x8000;
    }
}

const TILE_INDEX_MASK: u16 = 0x07FF;
const PALETTE_SHIFT: u16 = 13;

/// One decoded name-table cell.
///
/// The packed 16-bit form is `p bb v h tttttttttt t`: priority, palette bank,
/// vertical flip, horizontal flip and an 11-bit tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameTableEntry {
    pub tile_index: u16,
    pub palette: u8,
    pub attrs: TileAttr,
}

impl NameTableEntry {
    pub fn new(tile_index: u16, palette: u8, attrs: TileAttr) -> Self {
        assert!(tile_index <= TILE_INDEX_MASK, "tile index {tile_index} exceeds 11 bits");
        assert!(palette < 4, "palette bank {palette} out of range");
        Self {
            tile_index,
            palette,
            attrs,
        }
    }

    pub fn from_word(word: u16) -> Self {
        Self {
            tile_index: word & TILE_INDEX_MASK,
            palette: ((word >> PALETTE_SHIFT) & 0x03) as u8,
            attrs: TileAttr::from_bits_truncate(word),
        }
    }

    pub fn to_word(self) -> u16 {
        (self.tile_index & TILE_INDEX_MASK)
            | ((self.palette as u16 & 0x03) << PALETTE_SHIFT)
            | self.attrs.bits()
    }

    pub fn h_flip(&self) -> bool {
        self.attrs.contains(TileAttr::H_FLIP)
    }

    pub fn v_flip(&self) -> bool {
        self.attrs.contains(TileAttr::V_FLIP)
    }

    pub fn priority(&self) -> bool {
        self.attrs.contains(TileAttr::PRIORITY)
    }

    /// Palette bank shifted into the high nibble of an output pixel.
    pub fn palette_bits(&self) -> u8 {
        self.palette << 4
    }
}

/// Fetch one row of a tile's pattern data. `row` is the displayed row; the
/// vertical flip is applied here.
pub fn fetch_tile_row(vram: &Vram, tile_index: u16, row: usize, v_flip: bool) -> [u8; TILE_ROW_BYTES] {
    let row = if v_flip { 7 - (row & 7) } else { row & 7 };
    let addr = tile_index as usize * TILE_BYTES + row * TILE_ROW_BYTES;
    let mut out = [0u8; TILE_ROW_BYTES];
    out.copy_from_slice(vram.slice(addr, TILE_ROW_BYTES));
    out
}

/// Colour index of displayed pixel `x` (0..8) in a fetched tile row.
///
/// Even source pixels live in the high nibble. A horizontal flip reverses the
/// byte order and swaps the nibble parity.
#[inline]
pub fn row_pixel(row: &[u8; TILE_ROW_BYTES], x: usize, h_flip: bool) -> u8 {
    let px = if h_flip { 7 - x } else { x };
    let byte = row[px >> 1];
    if px & 1 == 0 { byte >> 4 } else { byte & 0x0F }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_table_word_decoding() {
        let entry = NameTableEntry::from_word(0xB805);
        assert_eq!(
            entry,
            NameTableEntry {
                tile_index: 5,
                palette: 1,
                attrs: TileAttr::PRIORITY | TileAttr::V_FLIP | TileAttr::H_FLIP,
            }
        );
        assert!(entry.priority());
        assert_eq!(entry.palette_bits(), 0x10);
    }

    #[test]
    fn name_table_word_packing_is_lossless() {
        for word in [0x0000, 0x07FF, 0x6001, 0x45A0, 0xF9AB] {
            assert_eq!(NameTableEntry::from_word(word).to_word(), word);
        }
    }

    #[test]
    #[should_panic(expected = "palette bank")]
    fn palette_bank_is_checked() {
        NameTableEntry::new(0, 4, TileAttr::empty());
    }

    #[test]
    fn row_pixels_respect_flip() {
        let row = [0x12, 0x34, 0x56, 0x78];
        let plain: Vec<u8> = (0..8).map(|x| row_pixel(&row, x, false)).collect();
        let flipped: Vec<u8> = (0..8).map(|x| row_pixel(&row, x, true)).collect();
        assert_eq!(plain, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(flipped, vec![8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn tile_rows_respect_vertical_flip() {
        let mut vram = Vram::new();
        let base = 3 * TILE_BYTES;
        vram.load(base, &[0x11; TILE_ROW_BYTES]);
        vram.load(base + 7 * TILE_ROW_BYTES, &[0x77; TILE_ROW_BYTES]);
        assert_eq!(fetch_tile_row(&vram, 3, 0, false), [0x11; 4]);
        assert_eq!(fetch_tile_row(&vram, 3, 0, true), [0x77; 4]);
    }
}
