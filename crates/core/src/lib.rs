//! Core primitives for compiling tile graphics ahead of time.
//!
//! Nothing in here knows about a particular console's memory map: the tile
//! codec, shade palettes, preview framebuffers and the logging facility are
//! shared by every target backend.

pub mod logging;
pub mod ppu;
pub mod types {
    use serde::{Deserialize, Serialize};

    /// ARGB framebuffer used for previews.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        /// Set one pixel; writes outside the frame are ignored.
        pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
            if x < self.width && y < self.height {
                self.pixels[(y * self.width + x) as usize] = argb;
            }
        }

        pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
            if x < self.width && y < self.height {
                Some(self.pixels[(y * self.width + x) as usize])
            } else {
                None
            }
        }

        /// Pixels as tightly packed RGBA bytes, the layout image encoders expect.
        pub fn to_rgba(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(self.pixels.len() * 4);
            for &argb in &self.pixels {
                out.push((argb >> 16) as u8);
                out.push((argb >> 8) as u8);
                out.push(argb as u8);
                out.push((argb >> 24) as u8);
            }
            out
        }
    }
}

pub use ppu::{Color, ColorRemap, Tile, TileColors};
