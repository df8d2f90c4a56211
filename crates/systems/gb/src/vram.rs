//! Tile memory targets.

use vramc_core::ppu::TILE_BYTES;
use vramc_core::Tile;

use crate::address::TileAddress;

/// Size of the video RAM window $8000-$9FFF.
pub const VRAM_SIZE: usize = 0x2000;

/// First address past tile data; $9800-$9FFF holds the tile maps.
pub const TILE_DATA_END: u16 = 0x9800;

/// Destination of materialized tiles.
pub trait TileSink {
    fn write_tile(&mut self, address: TileAddress, tile: &Tile);
}

/// Image of video RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vram {
    bytes: Box<[u8; VRAM_SIZE]>,
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; VRAM_SIZE]),
        }
    }

    /// Read from VRAM (0x8000-0x9FFF)
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr & 0x1FFF) as usize]
    }

    /// Write to VRAM (0x8000-0x9FFF)
    pub fn write(&mut self, addr: u16, val: u8) {
        self.bytes[(addr & 0x1FFF) as usize] = val;
    }

    /// The 16 bytes starting at `address`.
    pub fn tile_at(&self, address: TileAddress) -> Tile {
        let mut data = [0u8; TILE_BYTES];
        for (offset, byte) in data.iter_mut().enumerate() {
            *byte = self.read(address.get().wrapping_add(offset as u16));
        }
        Tile::from_bytes(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl TileSink for Vram {
    fn write_tile(&mut self, address: TileAddress, tile: &Tile) {
        for (offset, &byte) in tile.as_bytes().iter().enumerate() {
            self.write(address.get().wrapping_add(offset as u16), byte);
        }
    }
}

/// Sink that only records what was written, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteLog {
    pub writes: Vec<(TileAddress, Tile)>,
}

impl WriteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn addresses(&self) -> Vec<TileAddress> {
        self.writes.iter().map(|(address, _)| *address).collect()
    }
}

impl TileSink for WriteLog {
    fn write_tile(&mut self, address: TileAddress, tile: &Tile) {
        self.writes.push((address, *tile));
    }
}
