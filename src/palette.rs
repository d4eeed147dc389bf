// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display palettes and timed brightness fading.
//!
//! Four 16-colour palettes are active at once. Each has its own
//! [`PaletteFader`] moving a signed brightness in `-7..=7` towards a target.
//! Brightness is added to every 3-bit colour channel, clamped to `0..=7`, and
//! the result is scaled to 8 bits for the display palette.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::timer::StepTimer;

pub const PALETTE_COUNT: usize = 4;
pub const COLORS_PER_PALETTE: usize = 16;
pub const MIN_BRIGHTNESS: i16 = -7;
pub const MAX_BRIGHTNESS: i16 = 7;

// i * 255 / 7
const CHANNEL_LEVELS: [u8; 8] = [0, 36, 73, 109, 146, 182, 219, 255];

/// Palette colour word, `----bbb-ggg-rrr-`.
pub type ColorWord = u16;

/// 8-bit display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Apply `brightness` to a colour word.
pub fn adjust_color(word: ColorWord, brightness: i16) -> Rgb {
    let channel = |shift: u16| {
        let level = ((word >> shift) & 0x07) as i16 + brightness;
        CHANNEL_LEVELS[level.clamp(0, 7) as usize]
    };
    Rgb::new(channel(1), channel(5), channel(9))
}

/// Palette errors.
#[derive(Debug, Error, PartialEq)]
pub enum PaletteError {
    #[error("unknown palette resource {0}")]
    UnknownPalette(usize),
    #[error("invalid palette op {0}")]
    InvalidOp(i16),
    #[error("display palette {0} out of range")]
    InvalidSlot(usize),
}

/// Source of unfaded palettes, addressed by resource id.
pub trait PaletteSource {
    fn palette(&self, id: usize) -> Option<[ColorWord; COLORS_PER_PALETTE]>;
}

/// In-memory palette resource.
#[derive(Debug, Clone, Default)]
pub struct PaletteBank {
    palettes: HashMap<usize, [ColorWord; COLORS_PER_PALETTE]>,
}

impl PaletteBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: usize, colors: [ColorWord; COLORS_PER_PALETTE]) {
        self.palettes.insert(id, colors);
    }
}

impl PaletteSource for PaletteBank {
    fn palette(&self, id: usize) -> Option<[ColorWord; COLORS_PER_PALETTE]> {
        self.palettes.get(&id).copied()
    }
}

/// Frame loop hooks used while a fade blocks.
pub trait FadeHost {
    /// Deliver one frame using the current display palette.
    fn present(&mut self, palette: &[Rgb; PALETTE_COUNT * COLORS_PER_PALETTE]);

    /// Quit or skip requested; a blocking fade returns early when set.
    fn abort_requested(&self) -> bool {
        false
    }
}

/// Host that does nothing, for non-blocking callers.
pub struct NullHost;

impl FadeHost for NullHost {
    fn present(&mut self, _palette: &[Rgb; PALETTE_COUNT * COLORS_PER_PALETTE]) {}
}

/// How a fade request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStatus {
    /// All addressed palettes reached their target
    Completed,
    /// Started without waiting
    Running,
    /// The host asked to stop; brightness stays at its last value
    Aborted,
}

/// Brightness state of one palette.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteFader {
    timer: StepTimer,
    needs_refresh: bool,
}

impl PaletteFader {
    pub fn brightness(&self) -> i16 {
        self.timer.current()
    }

    pub fn target(&self) -> i16 {
        self.timer.target()
    }

    pub fn is_fading(&self) -> bool {
        !self.timer.is_idle()
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }
}

/// Raw palette operation, as issued by scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteOp {
    /// Fade one palette, non-blocking
    Fade { palette: usize, delay: u16, target: i16 },
    /// Fade all palettes, non-blocking
    FadeAll { delay: u16, target: i16 },
    /// Jump every palette to a brightness
    SetBrightness(i16),
    /// Recompute and push every palette
    Refresh,
}

impl PaletteOp {
    /// Decode `(op, param1, param2)`: ops 0..=3 fade that palette with delay
    /// `param1` to brightness `param2`, 4 fades all, 5 sets brightness
    /// `param2` immediately, 6 refreshes.
    pub fn decode(op: i16, param1: u16, param2: u16) -> Result<Self, PaletteError> {
        let target = param2 as i16;
        match op {
            0..=3 => Ok(PaletteOp::Fade {
                palette: op as usize,
                delay: param1,
                target,
            }),
            4 => Ok(PaletteOp::FadeAll { delay: param1, target }),
            5 => Ok(PaletteOp::SetBrightness(target)),
            6 => Ok(PaletteOp::Refresh),
            _ => Err(PaletteError::InvalidOp(op)),
        }
    }
}

/// The four display palettes and their faders.
pub struct Palettes {
    faders: [PaletteFader; PALETTE_COUNT],
    base: [[ColorWord; COLORS_PER_PALETTE]; PALETTE_COUNT],
    display: [Rgb; PALETTE_COUNT * COLORS_PER_PALETTE],
}

impl Palettes {
    pub fn new() -> Self {
        Self {
            faders: [PaletteFader::default(); PALETTE_COUNT],
            base: [[0; COLORS_PER_PALETTE]; PALETTE_COUNT],
            display: [Rgb::default(); PALETTE_COUNT * COLORS_PER_PALETTE],
        }
    }

    /// Active display palette, 64 entries indexed by output pixel value.
    pub fn display(&self) -> &[Rgb; PALETTE_COUNT * COLORS_PER_PALETTE] {
        &self.display
    }

    pub fn fader(&self, palette: usize) -> &PaletteFader {
        &self.faders[palette]
    }

    pub fn brightness(&self, palette: usize) -> i16 {
        self.faders[palette].brightness()
    }

    /// Copy resource `src_id` into display palette `dst`, optionally
    /// pushing it to the display right away.
    pub fn select_palette(
        &mut self,
        source: &dyn PaletteSource,
        src_id: usize,
        dst: usize,
        apply: bool,
    ) -> Result<(), PaletteError> {
        if dst >= PALETTE_COUNT {
            return Err(PaletteError::InvalidSlot(dst));
        }
        self.base[dst] = source.palette(src_id).ok_or(PaletteError::UnknownPalette(src_id))?;
        self.faders[dst].needs_refresh = true;
        if apply {
            self.refresh();
        }
        Ok(())
    }

    fn selected(palette: Option<usize>) -> std::ops::Range<usize> {
        match palette {
            Some(p) => {
                assert!(p < PALETTE_COUNT, "palette {p} out of range");
                p..p + 1
            }
            None => 0..PALETTE_COUNT,
        }
    }

    /// Start fading `palette` (or all palettes for `None`) to `target`,
    /// stepping once every `delay` frames. A zero delay applies the target
    /// immediately.
    ///
    /// With `wait`, ticks and presents frames through `host` until the fade
    /// completes or the host aborts. `no_update` suppresses frame delivery
    /// during the wait.
    pub fn fade_palette(
        &mut self,
        delay: u16,
        target: i16,
        palette: Option<usize>,
        wait: bool,
        no_update: bool,
        host: &mut dyn FadeHost,
    ) -> FadeStatus {
        let target = target.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        let range = Self::selected(palette);
        debug!("fade palettes {range:?} to {target} every {delay} frames");

        for fader in &mut self.faders[range.clone()] {
            fader.timer.start(target, 1, delay);
            fader.needs_refresh = true;
        }
        if delay == 0 {
            self.refresh();
        }

        if !wait {
            return if self.faders[range].iter().any(PaletteFader::is_fading) {
                FadeStatus::Running
            } else {
                FadeStatus::Completed
            };
        }

        while self.faders[range.clone()].iter().any(PaletteFader::is_fading) {
            if host.abort_requested() {
                warn!("palette fade aborted at brightness {}", self.faders[range.start].brightness());
                return FadeStatus::Aborted;
            }
            self.update();
            if !no_update {
                host.present(&self.display);
            }
        }
        FadeStatus::Completed
    }

    pub fn fade_to_black(&mut self, delay: u16, host: &mut dyn FadeHost) -> FadeStatus {
        self.fade_palette(delay, MIN_BRIGHTNESS, None, true, false, host)
    }

    pub fn fade_to_white(&mut self, delay: u16, host: &mut dyn FadeHost) -> FadeStatus {
        self.fade_palette(delay, MAX_BRIGHTNESS, None, true, false, host)
    }

    pub fn fade_to_neutral(&mut self, delay: u16, host: &mut dyn FadeHost) -> FadeStatus {
        self.fade_palette(delay, 0, None, true, false, host)
    }

    /// Jump `palette` (or all) to `brightness` without fading.
    pub fn set_brightness(&mut self, palette: Option<usize>, brightness: i16) {
        let brightness = brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        for fader in &mut self.faders[Self::selected(palette)] {
            fader.timer.set(brightness);
            fader.needs_refresh = true;
        }
        self.refresh();
    }

    /// Execute a raw palette op.
    pub fn palette_op(
        &mut self,
        op: i16,
        param1: u16,
        param2: u16,
        host: &mut dyn FadeHost,
    ) -> Result<FadeStatus, PaletteError> {
        let status = match PaletteOp::decode(op, param1, param2)? {
            PaletteOp::Fade {
                palette,
                delay,
                target,
            } => self.fade_palette(delay, target, Some(palette), false, false, host),
            PaletteOp::FadeAll { delay, target } => self.fade_palette(delay, target, None, false, false, host),
            PaletteOp::SetBrightness(b) => {
                self.set_brightness(None, b);
                FadeStatus::Completed
            }
            PaletteOp::Refresh => {
                self.faders.iter_mut().for_each(|f| f.needs_refresh = true);
                self.refresh();
                FadeStatus::Completed
            }
        };
        Ok(status)
    }

    /// Per-frame tick: step every fader, then push changed palettes.
    pub fn update(&mut self) {
        for fader in &mut self.faders {
            if fader.timer.tick() {
                fader.needs_refresh = true;
            }
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        for (i, fader) in self.faders.iter_mut().enumerate() {
            if !fader.needs_refresh {
                continue;
            }
            let brightness = fader.brightness();
            let out = &mut self.display[i * COLORS_PER_PALETTE..(i + 1) * COLORS_PER_PALETTE];
            for (dst, &word) in out.iter_mut().zip(self.base[i].iter()) {
                *dst = adjust_color(word, brightness);
            }
            fader.needs_refresh = false;
        }
    }
}

impl Default for Palettes {
    fn default() -> Self {
        Self::new()
    }
}
