//! Tile graphics building blocks shared by every target backend.
//!
//! The codec turns authored color grids into the hardware's planar bitmap
//! format, and the palette helpers turn bitmaps back into pixels for previews.

pub mod palette;
pub mod tile;

pub use palette::{IndexedPalette, ShadePalette};
pub use tile::{
    build_tile, build_tile_remapped, Color, ColorRemap, GameBoy2BppDecoder, Tile, TileColors,
    TileDecoder, C0, C1, C2, C3, TILE_BYTES, TILE_SIZE,
};
