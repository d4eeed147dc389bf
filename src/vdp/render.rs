// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Frame compositing: planes, window, sprites, then deferred priority
//! fragments.

use log::trace;

use crate::core::{Page, Rect};
use crate::vdp::Renderer;
use crate::vdp::plane::PlaneId;
use crate::vdp::priority::{PrioDrawTask, draw_fragment};
use crate::vdp::scroll::{read_hscroll, read_vscroll};
use crate::vdp::tile::fetch_tile_row;

impl Renderer {
    /// Composite one frame into `page`.
    ///
    /// The region is given in 8x8 blocks; a negative value selects the
    /// screen edge (origin) or the rest of the screen (size). With
    /// `sprites_only` the planes are skipped and only sprites are drawn over
    /// the cleared region.
    pub fn render(
        &mut self,
        page: &mut dyn Page,
        region_x: i32,
        region_y: i32,
        region_w: i32,
        region_h: i32,
        sprites_only: bool,
    ) {
        assert!(
            page.width() == self.width && page.height() >= self.height,
            "page {}x{} does not match the {}x{} output",
            page.width(),
            page.height(),
            self.width,
            self.height
        );

        let cols = self.width / 8;
        let rows = self.height / 8;
        let bx = region_x.max(0) as usize;
        let by = region_y.max(0) as usize;
        let bw = if region_w < 0 { cols.saturating_sub(bx) } else { region_w as usize };
        let bh = if region_h < 0 { rows.saturating_sub(by) } else { region_h as usize };
        assert!(bx + bw <= cols && by + bh <= rows, "render region ({bx}, {by}, {bw}, {bh}) exceeds the screen");

        let region = Rect::new(bx, by, bw, bh);
        let pixels = Rect::new(bx * 8, by * 8, bw * 8, bh * 8);

        page.fill_rect(pixels, 0);
        page.mark_dirty(pixels);

        if !sprites_only {
            self.render_plane(page, PlaneId::B, region);

            let window = self.planes[PlaneId::Window.index()];
            if window.is_empty() {
                self.render_plane(page, PlaneId::A, region);
            } else {
                let win = window.block_rect();
                let parts = [
                    Rect::new(0, 0, win.x, rows),
                    Rect::new(win.x, 0, win.w, win.y),
                    Rect::new(win.right(), 0, cols - win.right(), rows),
                    Rect::new(win.x, win.bottom(), win.w, rows - win.bottom()),
                ];
                for part in parts {
                    self.render_plane(page, PlaneId::A, region.intersect(&part));
                }
                self.render_plane(page, PlaneId::Window, region.intersect(&win));
            }
        }

        self.render_sprites(page, pixels);

        self.last_prio_fragments = self.prio.drain_and_render(page, self.mask.as_mut_bitslice());
        trace!(
            "rendered region {region:?} sprites_only={sprites_only}, {} priority fragments",
            self.last_prio_fragments
        );
    }

    /// Draw every pixel row of `blocks` from `plane`.
    fn render_plane(&mut self, page: &mut dyn Page, plane: PlaneId, blocks: Rect) {
        if blocks.is_empty() {
            return;
        }

        let p = self.planes[plane.index()];
        for y in blocks.y * 8..blocks.bottom() * 8 {
            if plane == PlaneId::Window {
                for bx in blocks.x..blocks.right() {
                    self.emit_tile_fragment(page, plane, (bx, y / 8), y & 7, 0, 8, bx * 8, y);
                }
                continue;
            }

            let plane_w = p.width_px() as i32;
            let plane_h = p.wrap_height as i32;
            let hscroll = read_hscroll(&self.vram, self.hscroll_table, self.hscroll_mode, plane, y) as i32;

            for bx in blocks.x..blocks.right() {
                let vscroll = read_vscroll(&self.vsram, self.vscroll_mode, plane, bx) as i32;
                let sy = (y as i32 + vscroll).rem_euclid(plane_h) as usize;
                let sx = ((bx * 8) as i32 - hscroll).rem_euclid(plane_w) as usize;
                let col = sx / 8;
                let sub = sx % 8;
                let dst_x = bx * 8;

                self.emit_tile_fragment(page, plane, (col, sy / 8), sy & 7, sub, 8, dst_x, y);
                if sub != 0 {
                    // the destination block straddles two source tiles
                    let next = (col + 1) % p.width_blocks;
                    self.emit_tile_fragment(page, plane, (next, sy / 8), sy & 7, 0, sub, dst_x + 8 - sub, y);
                }
            }
        }
    }

    /// Draw displayed pixels `start..end` of one tile row at `(dst_x, dst_y)`,
    /// or defer them when the cell has priority.
    #[allow(clippy::too_many_arguments)]
    fn emit_tile_fragment(
        &mut self,
        page: &mut dyn Page,
        plane: PlaneId,
        cell: (usize, usize),
        line: usize,
        start: usize,
        end: usize,
        dst_x: usize,
        dst_y: usize,
    ) {
        let entry = self.name_table_entry(plane, cell.0, cell.1);
        let task = PrioDrawTask {
            dst_x,
            dst_y,
            masked: false,
            src: fetch_tile_row(&self.vram, entry.tile_index, line, entry.v_flip()),
            start: start as u8,
            end: end as u8,
            palette: entry.palette_bits(),
            h_flip: entry.h_flip(),
        };
        if entry.priority() {
            self.prio.enqueue(task);
        } else {
            draw_fragment(page, None, &task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PixelBuffer;
    use crate::vdp::plane::WindowMode;
    use crate::vdp::tile::TILE_BYTES;

    fn solid_tile(r: &mut Renderer, index: u16, color: u8) {
        r.load_to_vram(&[color << 4 | color; TILE_BYTES], index * TILE_BYTES as u16);
    }

    #[test]
    fn plane_a_covers_plane_b() {
        let mut r = Renderer::new();
        solid_tile(&mut r, 1, 3);
        solid_tile(&mut r, 2, 4);
        r.fill_rect_with_tiles(PlaneId::B, 0, 0, 40, 28, 1, false, false, None);
        r.fill_rect_with_tiles(PlaneId::A, 0, 0, 1, 1, 0x2002, false, false, None);

        let mut page = PixelBuffer::new(320, 224);
        r.render(&mut page, -1, -1, -1, -1, false);
        assert_eq!(page.pixel(0, 0), 0x14);
        assert_eq!(page.pixel(8, 0), 0x03);
    }

    #[test]
    fn window_occludes_plane_a() {
        let mut r = Renderer::new();
        solid_tile(&mut r, 1, 5);
        solid_tile(&mut r, 2, 6);
        r.fill_rect_with_tiles(PlaneId::A, 0, 0, 64, 32, 1, false, false, None);
        r.fill_rect_with_tiles(PlaneId::Window, 0, 0, 40, 28, 2, false, false, None);
        r.setup_window_plane(0, 20, WindowMode::ToRightOrBottom, WindowMode::ToRightOrBottom);

        let mut page = PixelBuffer::new(320, 224);
        r.render(&mut page, -1, -1, -1, -1, false);
        assert_eq!(page.pixel(10, 20 * 8 - 1), 5);
        assert_eq!(page.pixel(10, 20 * 8), 6);
        assert_eq!(page.pixel(319, 223), 6);
    }

    #[test]
    fn sub_tile_scroll_blends_neighbours() {
        let mut r = Renderer::new();
        solid_tile(&mut r, 1, 1);
        solid_tile(&mut r, 2, 2);
        // even columns tile 1, odd columns tile 2
        for col in 0..64 {
            let tile = 1 + (col % 2) as u16;
            r.fill_rect_with_tiles(PlaneId::A, col, 0, 1, 32, tile, false, false, None);
        }
        let table = r.hscroll_table_location();
        r.write_u16_vram(table, (-3i16) as u16);

        let mut page = PixelBuffer::new(320, 224);
        r.render(&mut page, 0, 0, 1, 1, false);
        assert_eq!(&page.pixels()[0..8], &[1, 1, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn sprites_only_skips_planes() {
        let mut r = Renderer::new();
        solid_tile(&mut r, 1, 7);
        r.fill_rect_with_tiles(PlaneId::B, 0, 0, 40, 28, 1, false, false, None);

        let mut page = PixelBuffer::new(320, 224);
        page.fill_rect(Rect::new(0, 0, 320, 224), 0xFF);
        r.render(&mut page, 1, 1, 2, 2, true);
        assert_eq!(page.pixel(8, 8), 0);
        assert_eq!(page.pixel(0, 0), 0xFF);
        assert_eq!(page.take_dirty(), vec![Rect::new(8, 8, 16, 16)]);
    }

    #[test]
    fn vertical_scroll_wraps() {
        let mut r = Renderer::new();
        solid_tile(&mut r, 1, 9);
        r.fill_rect_with_tiles(PlaneId::B, 0, 31, 64, 1, 1, false, false, None);
        r.write_u16_vsram(2, (-8i16) as u16);

        let mut page = PixelBuffer::new(320, 224);
        r.render(&mut page, -1, -1, -1, -1, false);
        assert_eq!(page.pixel(0, 0), 9);
        assert_eq!(page.pixel(0, 8), 0);
    }
}
