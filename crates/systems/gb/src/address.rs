//! Tile index to tile-data address arithmetic.
//!
//! Tile data lives at $8000-$97FF. Objects always index it unsigned from
//! $8000; the background and window can instead index it signed from $9000,
//! so indices 128-255 reach back into $8800-$8FFF. That overlap is what the
//! shared table uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use vramc_core::ppu::TILE_BYTES;

/// Base of the unsigned (object) addressing window.
pub const OBJECT_TILE_BASE: u16 = 0x8000;

/// Base of the signed background/window addressing window.
pub const SIGNED_TILE_BASE: u16 = 0x9000;

/// Slot position inside one hardware bank, the value tile maps and OAM hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileIndex(pub u8);

impl TileIndex {
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute address of a tile's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileAddress(pub u16);

impl TileAddress {
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:04X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// Unsigned from $8000. Objects always use this.
    Object,
    /// Signed from $9000 (LCDC bit 4 clear).
    BgWindowSigned,
}

impl AddressingMode {
    /// Background/window with LCDC bit 4 set addresses exactly like objects.
    pub const BG_WINDOW_UNSIGNED: AddressingMode = AddressingMode::Object;
}

/// Resolve `index` to an address. Total over every index and mode.
pub const fn tile_address(index: TileIndex, mode: AddressingMode) -> TileAddress {
    let stride = TILE_BYTES as u16;
    match mode {
        AddressingMode::Object => {
            TileAddress(OBJECT_TILE_BASE.wrapping_add(stride.wrapping_mul(index.0 as u16)))
        }
        AddressingMode::BgWindowSigned => {
            let offset = (index.0 as i8 as i16 as u16).wrapping_mul(stride);
            TileAddress(SIGNED_TILE_BASE.wrapping_add(offset))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_addressing() {
        assert_eq!(tile_address(TileIndex(0), AddressingMode::Object), TileAddress(0x8000));
        assert_eq!(tile_address(TileIndex(2), AddressingMode::Object), TileAddress(0x8020));
        assert_eq!(tile_address(TileIndex(255), AddressingMode::Object), TileAddress(0x8FF0));
    }

    #[test]
    fn test_signed_addressing() {
        let mode = AddressingMode::BgWindowSigned;
        assert_eq!(tile_address(TileIndex(0), mode), TileAddress(0x9000));
        assert_eq!(tile_address(TileIndex(1), mode), TileAddress(0x9010));
        assert_eq!(tile_address(TileIndex(127), mode), TileAddress(0x97F0));
        assert_eq!(tile_address(TileIndex(128), mode), TileAddress(0x8800));
        assert_eq!(tile_address(TileIndex(255), mode), TileAddress(0x8FF0));
    }

    #[test]
    fn test_upper_half_is_shared_between_modes() {
        for index in 128..=255u8 {
            assert_eq!(
                tile_address(TileIndex(index), AddressingMode::Object),
                tile_address(TileIndex(index), AddressingMode::BgWindowSigned)
            );
        }
    }

    #[test]
    fn test_addressing_is_total() {
        for mode in [AddressingMode::Object, AddressingMode::BgWindowSigned] {
            for index in 0..=255u8 {
                let address = tile_address(TileIndex(index), mode);
                assert!((0x8000..0x9800).contains(&address.get()));
                assert_eq!(address.get() % 16, 0);
                assert_eq!(address, tile_address(TileIndex(index), mode));
            }
        }
    }

    #[test]
    fn test_unsigned_alias() {
        assert_eq!(AddressingMode::BG_WINDOW_UNSIGNED, AddressingMode::Object);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(TileAddress(0x8800).to_string(), "$8800");
    }
}
