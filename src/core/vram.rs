// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

/// Flat 64KB video memory bank holding tile patterns, name tables, the
/// h-scroll table and the sprite attribute table.
///
/// Words are stored big-endian, matching the layout the asset pipeline
/// produces.
pub struct Vram {
    bytes: Vec<u8>,
}

impl Vram {
    pub const SIZE: usize = 0x10000; // 64KB

    pub fn new() -> Self {
        Self {
            bytes: vec![0; Self::SIZE],
        }
    }

    fn check_range(addr: usize, len: usize) {
        assert!(
            addr.checked_add(len).is_some_and(|end| end <= Self::SIZE),
            "VRAM access out of bounds: addr=0x{addr:05X} len=0x{len:X}"
        );
    }

    /// Read a byte
    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Write a byte
    pub fn write_u8(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }

    /// Read big-endian u16. The second byte wraps at the end of the bank.
    pub fn read_u16(&self, addr: u16) -> u16 {
        let hi = self.read_u8(addr) as u16;
        let lo = self.read_u8(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write big-endian u16
    pub fn write_u16(&mut self, addr: u16, v: u16) {
        self.write_u8(addr, (v >> 8) as u8);
        self.write_u8(addr.wrapping_add(1), (v & 0xFF) as u8);
    }

    /// Copy a payload into VRAM starting at `addr`.
    pub fn load(&mut self, addr: usize, data: &[u8]) {
        Self::check_range(addr, data.len());
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
    }

    /// Fill `len` bytes starting at `addr` with `value`.
    pub fn fill(&mut self, addr: usize, value: u8, len: usize) {
        Self::check_range(addr, len);
        self.bytes[addr..addr + len].fill(value);
    }

    /// Borrow a byte range, asserting it lies inside the bank.
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        Self::check_range(addr, len);
        &self.bytes[addr..addr + len]
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertical scroll RAM: one word per two-cell column for each of planes A and B.
pub struct Vsram {
    words: [u16; Self::WORDS],
}

impl Vsram {
    pub const WORDS: usize = 40;

    pub fn new() -> Self {
        Self {
            words: [0; Self::WORDS],
        }
    }

    /// Read a word by byte address (must be even)
    pub fn read_u16(&self, addr: u16) -> u16 {
        assert!(addr & 1 == 0, "unaligned VSRAM read at 0x{addr:02X}");
        self.words[addr as usize >> 1]
    }

    /// Write a word by byte address (must be even)
    pub fn write_u16(&mut self, addr: u16, value: u16) {
        assert!(addr & 1 == 0, "unaligned VSRAM write at 0x{addr:02X}");
        let idx = addr as usize >> 1;
        assert!(idx < Self::WORDS, "VSRAM write out of bounds at 0x{addr:02X}");
        self.words[idx] = value;
    }

    /// Word by index
    pub fn word(&self, index: usize) -> u16 {
        self.words[index]
    }
}

impl Default for Vsram {
    fn default() -> Self {
        Self::new()
    }
}
