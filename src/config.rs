// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Screen layout configuration.
//!
//! A [`LayoutConfig`] captures every geometry setting of one screen layout.
//! With the `serde-spec` feature it can be read from YAML or JSON.

use crate::vdp::plane::WindowMode;
use crate::vdp::scroll::{HScrollMode, VScrollMode};

/// Geometry of one screen layout. Addresses are VRAM byte addresses, the
/// window split is in blocks, everything else in pixels or entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-spec", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-spec", serde(default))]
pub struct LayoutConfig {
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
    pub plane_width: usize,
    pub plane_height: usize,
    pub plane_a_table: u16,
    pub plane_b_table: u16,
    pub window_table: u16,
    pub hscroll_table: u16,
    pub sprite_table: u16,
    pub hscroll_mode: HScrollMode,
    pub vscroll_mode: VScrollMode,
    pub window_x: usize,
    pub window_y: usize,
    pub window_h_mode: WindowMode,
    pub window_v_mode: WindowMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 224,
            pitch: 64,
            plane_width: 512,
            plane_height: 256,
            plane_a_table: 0xC000,
            plane_b_table: 0xE000,
            window_table: 0xF000,
            hscroll_table: 0xD800,
            sprite_table: 0xDC00,
            hscroll_mode: HScrollMode::FullScreen,
            vscroll_mode: VScrollMode::FullScreen,
            window_x: 0,
            window_y: 0,
            window_h_mode: WindowMode::ToLeftOrTop,
            window_v_mode: WindowMode::ToLeftOrTop,
        }
    }
}

#[cfg(feature = "serde-spec")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid YAML layout: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON layout: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "serde-spec")]
impl LayoutConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
