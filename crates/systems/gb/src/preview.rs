//! Tile sheet previews of tile memory.

use vramc_core::ppu::{IndexedPalette, TILE_BYTES, TILE_SIZE};
use vramc_core::types::Frame;

use crate::address::{TileAddress, OBJECT_TILE_BASE};
use crate::vram::{Vram, TILE_DATA_END};

/// Tiles per sheet row.
pub const SHEET_COLUMNS: usize = 16;

/// Tiles in $8000-$97FF.
pub const SHEET_TILES: usize = (TILE_DATA_END - OBJECT_TILE_BASE) as usize / TILE_BYTES;

pub const SHEET_ROWS: usize = SHEET_TILES / SHEET_COLUMNS;

/// Render all of tile data as a 16x24 grid of tiles (128x192 pixels), tile 0
/// at the top left. Each pixel's color id is looked up in `palette`.
pub fn render_tile_sheet<P: IndexedPalette + ?Sized>(vram: &Vram, palette: &P) -> Frame {
    let mut frame = Frame::new(
        (SHEET_COLUMNS * TILE_SIZE) as u32,
        (SHEET_ROWS * TILE_SIZE) as u32,
    );

    for n in 0..SHEET_TILES {
        let address = TileAddress(OBJECT_TILE_BASE + (n * TILE_BYTES) as u16);
        let tile = vram.tile_at(address);
        let origin_x = (n % SHEET_COLUMNS * TILE_SIZE) as u32;
        let origin_y = (n / SHEET_COLUMNS * TILE_SIZE) as u32;
        for (y, row) in tile.to_colors().iter().enumerate() {
            for (x, &color) in row.iter().enumerate() {
                frame.set_pixel(
                    origin_x + x as u32,
                    origin_y + y as u32,
                    palette.get_color(color.id() as usize),
                );
            }
        }
    }

    frame
}
