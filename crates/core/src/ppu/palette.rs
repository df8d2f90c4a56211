//! Shade palettes used to turn color ids into pixels for previews.
//!
//! The target itself has no RGB colors: each of the four color ids is mapped
//! through a palette register onto one of four shades. Previews reproduce that
//! mapping so a tile sheet looks the way it will on the device.

use serde::{Deserialize, Serialize};

use super::tile::Color;

/// Anything that maps a color index onto a 32-bit ARGB color (0xAARRGGBB).
pub trait IndexedPalette {
    /// Get the ARGB color for a palette index.
    fn get_color(&self, index: usize) -> u32;

    /// Get the number of colors in this palette.
    fn len(&self) -> usize;

    /// Check if the palette is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classic four-shade LCD greens, lightest first.
pub const DMG_GREEN: [u32; 4] = [0xFF9BBC0F, 0xFF8BAC0F, 0xFF306230, 0xFF0F380F];

/// Plain grayscale, lightest first.
pub const GRAYSCALE: [u32; 4] = [0xFFFFFFFF, 0xFFAAAAAA, 0xFF555555, 0xFF000000];

/// Four shades plus the palette register that maps color ids onto them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadePalette {
    shades: [u32; 4],
    register: u8,
}

impl ShadePalette {
    /// Palette with an identity register (id N shows shade N).
    pub const fn new(shades: [u32; 4]) -> Self {
        Self {
            shades,
            register: 0b11_10_01_00,
        }
    }

    /// Same shades with a different palette register value.
    pub const fn with_register(self, register: u8) -> Self {
        Self {
            shades: self.shades,
            register,
        }
    }

    pub const fn register(&self) -> u8 {
        self.register
    }

    /// Shade number (0-3) the register assigns to `color`.
    pub const fn shade_of(&self, color: Color) -> u8 {
        (self.register >> (color.id() * 2)) & 0b11
    }

    pub fn color_of(&self, color: Color) -> u32 {
        self.shades[self.shade_of(color) as usize]
    }
}

impl Default for ShadePalette {
    fn default() -> Self {
        Self::new(DMG_GREEN)
    }
}

impl IndexedPalette for ShadePalette {
    fn get_color(&self, index: usize) -> u32 {
        if index < 4 {
            self.color_of(Color::from_bits(index as u8))
        } else {
            0xFF000000
        }
    }

    fn len(&self) -> usize {
        4
    }
}
