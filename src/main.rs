// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

// A simple demo scene for the compositor, written out as a PPM image.
use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use vdpcomp_core::palette::{COLORS_PER_PALETTE, FadeStatus, PaletteBank, Rgb};
use vdpcomp_core::vdp::sprite::size_flags;
use vdpcomp_core::vdp::tile::TILE_BYTES;
use vdpcomp_core::{Display, FadeHost, Page, PixelBuffer, PlaneId, WindowMode};

const DEFAULT_OUTPUT: &str = "vdpcomp.ppm";

/// Counts frames delivered during a blocking fade.
struct FrameCounter {
    frames: usize,
}

impl FadeHost for FrameCounter {
    fn present(&mut self, _palette: &[Rgb; 64]) {
        self.frames += 1;
    }
}

/// 4bpp tile with a one-pixel border in `edge` around a `fill` body.
fn framed_tile(fill: u8, edge: u8) -> [u8; TILE_BYTES] {
    let mut tile = [0u8; TILE_BYTES];
    for row in 0..8 {
        for x in 0..8 {
            let c = if row == 0 || row == 7 || x == 0 || x == 7 { edge } else { fill };
            let byte = &mut tile[row * 4 + x / 2];
            *byte |= if x % 2 == 0 { c << 4 } else { c };
        }
    }
    tile
}

/// Sixteen-step ramp from black through the given channel weights.
fn ramp(r: u16, g: u16, b: u16) -> [u16; COLORS_PER_PALETTE] {
    std::array::from_fn(|i| {
        let level = (i as u16 / 2).min(7);
        (((level * b / 7) & 7) << 9) | (((level * g / 7) & 7) << 5) | (((level * r / 7) & 7) << 1)
    })
}

fn write_ppm(path: &str, page: &PixelBuffer, palette: &[Rgb; 64]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{} {}\n255\n", page.width(), page.height())?;
    for &index in page.pixels() {
        let rgb = palette[(index & 0x3F) as usize];
        out.write_all(&[rgb.r, rgb.g, rgb.b])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    println!("vdpcomp v{}", env!("CARGO_PKG_VERSION"));
    println!("==============");
    println!();

    let mut display = Display::new();
    let r = &mut display.renderer;

    // tiles 1..=4: framed blocks in increasing colours
    for tile in 1..=4u16 {
        let data = framed_tile(tile as u8 * 3, 15);
        r.load_to_vram(&data, tile * TILE_BYTES as u16);
    }

    // checkerboard background on B, stripes on A, status strip in the window
    for y in 0..32 {
        for x in 0..64 {
            let tile = if (x + y) % 2 == 0 { 1 } else { 2 };
            r.fill_rect_with_tiles(PlaneId::B, x, y, 1, 1, 0x2000 | tile, false, false, None);
        }
    }
    r.fill_rect_with_tiles(PlaneId::A, 0, 4, 64, 2, 3, false, false, None);
    r.fill_rect_with_tiles(PlaneId::A, 0, 12, 64, 2, 0x8003, false, false, None);
    r.fill_rect_with_tiles(PlaneId::Window, 0, 25, 40, 3, 0x4004, false, false, None);
    r.setup_window_plane(0, 25, WindowMode::ToRightOrBottom, WindowMode::ToRightOrBottom);

    let size = size_flags(2, 2);
    display.animator.set_slot(0, 40, 40, 0x6001, size);
    display.animator.set_slot(1, 48, 96, 0xE002, size);
    display.animator.set_slot(2, 160, 80, 0x6003, size_flags(4, 1));

    let mut bank = PaletteBank::new();
    bank.insert(0, ramp(7, 7, 7));
    bank.insert(1, ramp(2, 4, 7));
    bank.insert(2, ramp(7, 3, 1));
    bank.insert(3, ramp(3, 7, 2));
    for slot in 0..4 {
        display.palettes.select_palette(&bank, slot, slot, false)?;
    }

    display.palettes.set_brightness(None, -7);
    display.scroll.set_hscroll_timers(-12, 3, 1, 6, 1, 2);

    let mut page = PixelBuffer::new(display.renderer.width(), display.renderer.height());
    let mut host = FrameCounter { frames: 0 };
    let status = display.palettes.fade_to_neutral(1, &mut host);
    if status != FadeStatus::Completed {
        anyhow::bail!("fade-in did not complete: {status:?}");
    }
    display.run_frames(&mut page, 8);

    let stats = display.stats();
    println!("Frames rendered:     {}", stats.frame_count);
    println!(
        "Fade frames:         {} ({:.2}s at {} Hz)",
        host.frames,
        host.frames as f64 / Display::TARGET_FPS as f64,
        Display::TARGET_FPS
    );
    println!("Active sprites:      {}", stats.active_sprites);
    println!("Priority fragments:  {}", stats.priority_fragments);

    write_ppm(&output, &page, display.palettes.display())?;
    println!("Wrote {output}");
    Ok(())
}
