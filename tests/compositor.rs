// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

use pretty_assertions::assert_eq;
use vdpcomp_core::palette::{FadeHost, FadeStatus, PALETTE_COUNT, Rgb};
use vdpcomp_core::vdp::sprite::size_flags;
use vdpcomp_core::vdp::tile::{NameTableEntry, TILE_BYTES, TileAttr};
use vdpcomp_core::{Animator, Page, Palettes, PixelBuffer, PlaneId, Renderer, VdpError};

fn solid_tile(r: &mut Renderer, index: u16, color: u8) {
    r.load_to_vram(&[color << 4 | color; TILE_BYTES], index * TILE_BYTES as u16);
}

fn full_frame(r: &mut Renderer) -> PixelBuffer {
    let mut page = PixelBuffer::new(r.width(), r.height());
    r.render(&mut page, -1, -1, -1, -1, false);
    page
}

#[test]
fn filled_rect_reads_back() {
    let mut r = Renderer::new();
    r.fill_rect_with_tiles(PlaneId::A, 3, 2, 4, 5, 0x1234, false, false, None);

    for y in 0..10 {
        for x in 0..10 {
            let inside = (3..7).contains(&x) && (2..7).contains(&y);
            let expected = if inside { 0x1234 } else { 0 };
            assert_eq!(r.name_table_entry(PlaneId::A, x, y).to_word(), expected, "cell ({x}, {y})");
        }
    }
    assert_eq!(r.name_table_entry(PlaneId::B, 3, 2).to_word(), 0);
}

#[test]
fn incrementing_fill_follows_fill_order() {
    let mut r = Renderer::new();
    r.fill_rect_with_tiles(PlaneId::A, 1, 1, 3, 2, 10, true, false, None);
    let row_major: Vec<u16> = [(1, 1), (2, 1), (3, 1), (1, 2), (2, 2), (3, 2)]
        .iter()
        .map(|&(x, y)| r.name_table_entry(PlaneId::A, x, y).to_word())
        .collect();
    assert_eq!(row_major, vec![10, 11, 12, 13, 14, 15]);

    r.fill_rect_with_tiles(PlaneId::B, 1, 1, 3, 2, 10, true, true, None);
    let column_major: Vec<u16> = [(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]
        .iter()
        .map(|&(x, y)| r.name_table_entry(PlaneId::B, x, y).to_word())
        .collect();
    assert_eq!(column_major, vec![10, 11, 12, 13, 14, 15]);
}

#[test]
fn pattern_fill_offsets_entry() {
    let mut r = Renderer::new();
    let pattern = [0u16, 5, 9, 2];
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 2, 2, 0x2000, false, false, Some(&pattern));
    assert_eq!(r.name_table_entry(PlaneId::A, 1, 0), NameTableEntry::from_word(0x2005));
    assert_eq!(r.name_table_entry(PlaneId::A, 0, 1), NameTableEntry::from_word(0x2009));
    assert_eq!(r.name_table_entry(PlaneId::A, 1, 1).tile_index, 2);
}

#[test]
fn rendering_is_idempotent() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 2);
    solid_tile(&mut r, 2, 3);
    r.fill_rect_with_tiles(PlaneId::B, 0, 0, 64, 32, 1, false, false, None);
    r.fill_rect_with_tiles(PlaneId::A, 4, 4, 6, 6, 0x8002, false, false, None);
    let mut anim = Animator::new();
    anim.set_slot(0, 30, 30, 0x8001, 0x05);
    anim.set_slot(1, 34, 34, 0x2002, 0x00);
    anim.commit(&mut r);

    let first = full_frame(&mut r);
    let mut page = first.clone();
    r.render(&mut page, -1, -1, -1, -1, false);
    assert_eq!(page.pixels(), first.pixels());
    assert_eq!(full_frame(&mut r).pixels(), first.pixels());
}

#[test]
fn earlier_sprite_wins_overlap() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 3);
    solid_tile(&mut r, 2, 4);
    let mut anim = Animator::new();
    anim.set_slot(0, 8, 8, 0x0001, 0);
    anim.set_slot(1, 12, 8, 0x0002, 0);
    anim.commit(&mut r);

    let page = full_frame(&mut r);
    assert_eq!(page.pixel(8, 8), 3);
    assert_eq!(page.pixel(15, 8), 3);
    assert_eq!(page.pixel(16, 8), 4);
}

#[test]
fn priority_sprite_covers_priority_tile() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 5);
    solid_tile(&mut r, 2, 6);
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 1, 1, 0x8001, false, false, None);
    let mut anim = Animator::new();
    anim.set_slot(0, 0, 0, 0x8002, 0);
    anim.commit(&mut r);

    let page = full_frame(&mut r);
    assert_eq!(page.pixel(3, 3), 6);
}

#[test]
fn priority_tile_covers_plain_sprite() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 5);
    solid_tile(&mut r, 2, 6);
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 1, 1, 0x8001, false, false, None);
    let mut anim = Animator::new();
    anim.set_slot(0, 4, 0, 0x0002, 0);
    anim.commit(&mut r);

    let page = full_frame(&mut r);
    assert_eq!(page.pixel(4, 0), 5);
    assert_eq!(page.pixel(8, 0), 6);
    assert_eq!(r.last_priority_fragments(), 8);
}

#[test]
fn horizontal_scroll_wraps_around_plane() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 1);
    solid_tile(&mut r, 2, 2);
    solid_tile(&mut r, 3, 7);
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 64, 32, 1, false, false, None);
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 1, 32, 2, false, false, None);
    r.fill_rect_with_tiles(PlaneId::A, 62, 0, 1, 32, 3, false, false, None);
    let table = r.hscroll_table_location();
    r.write_u16_vram(table, 16);

    let page = full_frame(&mut r);
    // screen block x shows plane column (x - 2) mod 64
    assert_eq!(page.pixel(0, 0), 7);
    assert_eq!(page.pixel(8, 100), 1);
    assert_eq!(page.pixel(16, 0), 2);
}

#[test]
fn small_plane_renders_incrementing_tiles() {
    let mut r = Renderer::new();
    r.set_pitch(8);
    r.setup_plane_ab(64, 64);
    for tile in 0..16u16 {
        solid_tile(&mut r, tile, (tile % 15) as u8 + 1);
    }
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 8, 8, 0, true, false, None);

    let mut page = PixelBuffer::new(320, 224);
    r.render(&mut page, 0, 0, 2, 2, false);
    assert_eq!(page.pixel(0, 0), 1);
    assert_eq!(page.pixel(8, 0), 2);
    assert_eq!(page.pixel(0, 8), 9);
    assert_eq!(page.pixel(15, 15), 10);
    // outside the region stays untouched
    assert_eq!(page.pixel(16, 0), 0);
}

fn write_sprite(r: &mut Renderer, index: u16, pos: u16, link: u16) {
    let base = r.sprite_table_location() + index * 8;
    r.write_u16_vram(base, 128 + pos);
    r.write_u16_vram(base + 2, link);
    r.write_u16_vram(base + 4, 1);
    r.write_u16_vram(base + 6, 128 + pos);
}

#[test]
fn sprite_link_cycle_terminates() {
    let mut r = Renderer::new();
    solid_tile(&mut r, 1, 4);
    // 0 -> 1 -> 2 -> 1 -> ...
    write_sprite(&mut r, 0, 0, 1);
    write_sprite(&mut r, 1, 10, 2);
    write_sprite(&mut r, 2, 20, 1);

    let page = full_frame(&mut r);
    assert_eq!(page.pixel(0, 0), 4);
    assert_eq!(page.pixel(10, 10), 4);
    assert_eq!(page.pixel(20, 20), 4);

    // a link past the table end stops the walk
    write_sprite(&mut r, 2, 20, 0x7F);
    let page = full_frame(&mut r);
    assert_eq!(page.pixel(20, 20), 4);
}

#[test]
fn oversized_stream_is_rejected() {
    let mut r = Renderer::new();
    let payload = vec![0xAAu8; 0x200];
    let err = r.load_stream_to_vram(&mut payload.as_slice(), 0xFF00).unwrap_err();
    assert!(matches!(err, VdpError::StreamTooLarge { addr: 0xFF00, len: 0x200 }));
    assert_eq!(r.read_u8_vram(0xFF00), 0);

    let n = r.load_stream_to_vram(&mut &payload[..0x100], 0xFF00).unwrap();
    assert_eq!(n, 0x100);
    assert_eq!(r.read_u8_vram(0xFFFF), 0xAA);
}

struct CountingHost {
    frames: usize,
}

impl FadeHost for CountingHost {
    fn present(&mut self, _palette: &[Rgb; 64]) {
        self.frames += 1;
    }
}

#[test]
fn blocking_fade_completes_at_target() {
    let mut pals = Palettes::new();
    let mut host = CountingHost { frames: 0 };
    let status = pals.fade_palette(3, 5, None, true, false, &mut host);
    assert_eq!(status, FadeStatus::Completed);
    for p in 0..PALETTE_COUNT {
        assert_eq!(pals.brightness(p), 5);
        assert!(!pals.fader(p).is_fading());
    }
    assert_eq!(host.frames, 15);
}

/// Solid tile with colour 15 in its top-left pixel.
fn marked_tile(r: &mut Renderer, index: u16, color: u8) {
    let mut data = [color << 4 | color; TILE_BYTES];
    data[0] = 0xF0 | color;
    r.load_to_vram(&data, index * TILE_BYTES as u16);
}

/// A 2x2 block sprite at the screen origin using tiles 1..=4.
fn flipped_sprite_frame(flip_bits: u16) -> PixelBuffer {
    let mut r = Renderer::new();
    for tile in 1..=4u16 {
        marked_tile(&mut r, tile, tile as u8);
    }
    let mut anim = Animator::new();
    anim.set_slot(0, 0, 0, flip_bits | 0x0001, size_flags(2, 2));
    anim.commit(&mut r);
    full_frame(&mut r)
}

/// Colour at the centre of each 8x8 block of the sprite, row by row.
fn block_colors(page: &PixelBuffer) -> [u8; 4] {
    [page.pixel(4, 4), page.pixel(12, 4), page.pixel(4, 12), page.pixel(12, 12)]
}

#[test]
fn sprite_tiles_are_column_major() {
    let page = flipped_sprite_frame(0);
    assert_eq!(block_colors(&page), [1, 3, 2, 4]);
    assert_eq!(page.pixel(0, 0), 15);
}

#[test]
fn sprite_h_flip_mirrors_columns_and_pixels() {
    let page = flipped_sprite_frame(TileAttr::H_FLIP.bits());
    assert_eq!(block_colors(&page), [3, 1, 4, 2]);
    // tile 1 now sits in the right column with its marker on the right edge
    assert_eq!(page.pixel(15, 0), 15);
    assert_eq!(page.pixel(8, 0), 1);
}

#[test]
fn sprite_v_flip_mirrors_rows_and_pixels() {
    let page = flipped_sprite_frame(TileAttr::V_FLIP.bits());
    assert_eq!(block_colors(&page), [2, 4, 1, 3]);
    assert_eq!(page.pixel(0, 15), 15);
    assert_eq!(page.pixel(0, 8), 1);
}

#[test]
fn sprite_hv_flip_rotates_half_turn() {
    let page = flipped_sprite_frame((TileAttr::H_FLIP | TileAttr::V_FLIP).bits());
    assert_eq!(block_colors(&page), [4, 2, 3, 1]);
    assert_eq!(page.pixel(15, 15), 15);
    assert_eq!(page.pixel(0, 0), 4);
}

fn flipped_plane_row(flip_bits: u16, row: usize) -> Vec<u8> {
    let mut r = Renderer::new();
    marked_tile(&mut r, 1, 1);
    solid_tile(&mut r, 2, 2);
    r.fill_rect_with_tiles(PlaneId::A, 0, 0, 1, 1, flip_bits | 1, false, false, None);
    r.fill_rect_with_tiles(PlaneId::A, 1, 0, 1, 1, 2, false, false, None);
    let table = r.hscroll_table_location();
    r.write_u16_vram(table, (-3i16) as u16);

    let mut page = PixelBuffer::new(320, 224);
    r.render(&mut page, 0, 0, 1, 1, false);
    (0..8).map(|x| page.pixel(x, row)).collect()
}

#[test]
fn flipped_plane_cell_with_sub_tile_scroll() {
    let plain = flipped_plane_row(0, 0);
    assert_eq!(plain, vec![1, 1, 1, 1, 1, 2, 2, 2]);

    // the marker moves to tile pixel 7, displayed at x = 7 - 3
    let h_flipped = flipped_plane_row(TileAttr::H_FLIP.bits(), 0);
    assert_eq!(h_flipped, vec![1, 1, 1, 1, 15, 2, 2, 2]);

    let hv_top = flipped_plane_row((TileAttr::H_FLIP | TileAttr::V_FLIP).bits(), 0);
    assert_eq!(hv_top, vec![1, 1, 1, 1, 1, 2, 2, 2]);
    let hv_bottom = flipped_plane_row((TileAttr::H_FLIP | TileAttr::V_FLIP).bits(), 7);
    assert_eq!(hv_bottom, vec![1, 1, 1, 1, 15, 2, 2, 2]);
}

#[test]
fn flipped_priority_cell_replays_flipped() {
    let with_priority = flipped_plane_row(0x8000 | TileAttr::H_FLIP.bits(), 0);
    assert_eq!(with_priority, vec![1, 1, 1, 1, 15, 2, 2, 2]);
}
