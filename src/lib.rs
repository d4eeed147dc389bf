// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! VDP-style tile and sprite compositor
//!
//! This library renders 4bpp tiles from a 64KB video memory image through two
//! scrollable planes, a fixed window plane and a linked sprite table into an
//! 8-bit indexed page, with palette brightness fading on top.

pub mod animator;
pub mod config;
pub mod core;
pub mod display;
pub mod palette;
pub mod timer;
pub mod vdp;

// Re-export commonly used types
pub use animator::Animator;
pub use config::LayoutConfig;
pub use core::{Page, PixelBuffer, Rect};
pub use display::{Display, DisplayStats};
pub use palette::{FadeHost, FadeStatus, PaletteBank, Palettes, Rgb};
pub use vdp::plane::{PlaneId, WindowMode};
pub use vdp::scroll::{HScrollMode, ScrollManager, VScrollMode};
pub use vdp::{Renderer, VdpError};
