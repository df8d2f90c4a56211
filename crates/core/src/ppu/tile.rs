//! 2bpp planar tile encoding and decoding.
//!
//! The target stores every 8x8 tile in 16 bytes with interleaved bitplanes:
//! - Bytes 0-1: Low and high bitplanes for row 0
//! - Bytes 2-3: Low and high bitplanes for row 1
//! - And so on...
//!
//! The leftmost pixel of a row lives in bit 7 of both plane bytes. The
//! encoder is a `const fn` so that tiles can be authored as Rust constants and
//! never cost anything on the target.

use serde::{Deserialize, Serialize};

/// Width and height of a tile in pixels.
pub const TILE_SIZE: usize = 8;

/// Size of one encoded tile in bytes.
pub const TILE_BYTES: usize = 16;

/// Symbolic 2-bit color id. The palette decides what each id looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[default]
    Id0 = 0,
    Id1 = 1,
    Id2 = 2,
    Id3 = 3,
}

pub const C0: Color = Color::Id0;
pub const C1: Color = Color::Id1;
pub const C2: Color = Color::Id2;
pub const C3: Color = Color::Id3;

impl Color {
    /// Numeric color id (0-3).
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Color for the low two bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Color::Id0,
            1 => Color::Id1,
            2 => Color::Id2,
            _ => Color::Id3,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color digit {0:?} (expected 0-3 or '.')")]
pub struct ParseColorError(pub char);

impl TryFrom<char> for Color {
    type Error = ParseColorError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '0' | '.' => Ok(Color::Id0),
            '1' => Ok(Color::Id1),
            '2' => Ok(Color::Id2),
            '3' => Ok(Color::Id3),
            other => Err(ParseColorError(other)),
        }
    }
}

/// An 8x8 grid of symbolic colors, row-major.
pub type TileColors = [[Color; TILE_SIZE]; TILE_SIZE];

/// Substitution applied to every pixel before encoding.
///
/// Lets one authored grid produce several tiles, e.g. the same pill shape in
/// different shades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorRemap(pub [Color; 4]);

impl ColorRemap {
    pub const IDENTITY: ColorRemap = ColorRemap([C0, C1, C2, C3]);

    pub const fn new(remap_0: Color, remap_1: Color, remap_2: Color, remap_3: Color) -> Self {
        ColorRemap([remap_0, remap_1, remap_2, remap_3])
    }

    pub const fn apply(&self, color: Color) -> Color {
        self.0[color as usize]
    }
}

impl Default for ColorRemap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One encoded tile. Two tiles are the same tile iff their bytes match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    data: [u8; TILE_BYTES],
}

impl Tile {
    pub const fn from_bytes(data: [u8; TILE_BYTES]) -> Self {
        Self { data }
    }

    /// Tile with every byte set to `byte`.
    pub const fn filled(byte: u8) -> Self {
        Self {
            data: [byte; TILE_BYTES],
        }
    }

    pub const fn as_bytes(&self) -> &[u8; TILE_BYTES] {
        &self.data
    }

    /// Color id of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u8, y: u8) -> Color {
        Color::from_bits(GameBoy2BppDecoder.decode_pixel(&self.data, x, y))
    }

    /// Decode the whole tile back into a color grid.
    pub fn to_colors(&self) -> TileColors {
        let mut colors = [[C0; TILE_SIZE]; TILE_SIZE];
        for (y, row) in colors.iter_mut().enumerate() {
            for (x, color) in row.iter_mut().enumerate() {
                *color = self.pixel(x as u8, y as u8);
            }
        }
        colors
    }
}

/// Encode a color grid without remapping.
pub const fn build_tile(colors: &TileColors) -> Tile {
    build_tile_remapped(colors, ColorRemap::IDENTITY)
}

/// Encode a color grid, passing every pixel through `remap` first.
pub const fn build_tile_remapped(colors: &TileColors, remap: ColorRemap) -> Tile {
    let mut data = [0u8; TILE_BYTES];
    let mut row = 0;
    while row < TILE_SIZE {
        let mut low = 0u8;
        let mut high = 0u8;
        let mut column = 0;
        while column < TILE_SIZE {
            let color = remap.apply(colors[row][column]).id();
            low = (low << 1) | (color & 1);
            high = (high << 1) | ((color >> 1) & 1);
            column += 1;
        }
        data[2 * row] = low;
        data[2 * row + 1] = high;
        row += 1;
    }
    Tile { data }
}

/// Trait for decoding tile data into pixel indices.
pub trait TileDecoder {
    /// Decode a single pixel from a tile.
    ///
    /// # Arguments
    /// * `tile_data` - The raw tile data
    /// * `x` - X coordinate within the tile (0-7)
    /// * `y` - Y coordinate within the tile (0-7)
    ///
    /// # Returns
    /// The palette index for this pixel (0-3)
    fn decode_pixel(&self, tile_data: &[u8], x: u8, y: u8) -> u8;
}

/// Decoder for the interleaved 2bpp layout produced by [`build_tile`].
#[derive(Debug, Clone, Copy)]
pub struct GameBoy2BppDecoder;

impl TileDecoder for GameBoy2BppDecoder {
    fn decode_pixel(&self, tile_data: &[u8], x: u8, y: u8) -> u8 {
        if tile_data.len() < TILE_BYTES || x > 7 || y > 7 {
            return 0;
        }

        let row_offset = (y as usize) * 2;
        let lo = tile_data[row_offset];
        let hi = tile_data[row_offset + 1];
        let bit = 7 - x;

        (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADIENT: TileColors = [
        [C0, C1, C2, C3, C0, C1, C2, C3],
        [C3, C3, C3, C3, C3, C3, C3, C3],
        [C0, C0, C0, C0, C0, C0, C0, C0],
        [C1, C1, C1, C1, C1, C1, C1, C1],
        [C2, C2, C2, C2, C2, C2, C2, C2],
        [C3, C0, C0, C0, C0, C0, C0, C0],
        [C0, C0, C0, C0, C0, C0, C0, C2],
        [C1, C0, C1, C0, C1, C0, C1, C0],
    ];

    const ENCODED: Tile = build_tile(&GRADIENT);

    #[test]
    fn test_encode_row_bit_layout() {
        let bytes = ENCODED.as_bytes();
        // Row 0: ids 0,1,2,3,0,1,2,3 -> low 01010101, high 00110011
        assert_eq!(bytes[0], 0b0101_0101);
        assert_eq!(bytes[1], 0b0011_0011);
        // Row 1: all id 3
        assert_eq!(bytes[2], 0xFF);
        assert_eq!(bytes[3], 0xFF);
        // Row 2: all id 0
        assert_eq!(bytes[4], 0x00);
        assert_eq!(bytes[5], 0x00);
        // Row 3: id 1 only sets the low plane
        assert_eq!(bytes[6], 0xFF);
        assert_eq!(bytes[7], 0x00);
        // Row 4: id 2 only sets the high plane
        assert_eq!(bytes[8], 0x00);
        assert_eq!(bytes[9], 0xFF);
        // Leftmost pixel is the most significant bit
        assert_eq!(bytes[10], 0b1000_0000);
        assert_eq!(bytes[11], 0b1000_0000);
        // Rightmost pixel is the least significant bit
        assert_eq!(bytes[12], 0b0000_0000);
        assert_eq!(bytes[13], 0b0000_0001);
        assert_eq!(bytes[14], 0b1010_1010);
        assert_eq!(bytes[15], 0b0000_0000);
    }

    #[test]
    fn test_remap_swaps_colors_before_encoding() {
        let solid_one = [[C1; TILE_SIZE]; TILE_SIZE];
        let remapped = build_tile_remapped(&solid_one, ColorRemap::new(C0, C2, C1, C3));
        let solid_two = build_tile(&[[C2; TILE_SIZE]; TILE_SIZE]);
        assert_eq!(remapped, solid_two);
        assert_eq!(remapped.as_bytes()[0], 0x00);
        assert_eq!(remapped.as_bytes()[1], 0xFF);
    }

    #[test]
    fn test_identity_remap_is_default() {
        assert_eq!(
            build_tile_remapped(&GRADIENT, ColorRemap::default()),
            build_tile(&GRADIENT)
        );
    }

    #[test]
    fn test_decode_matches_authored_grid() {
        assert_eq!(ENCODED.to_colors(), GRADIENT);
        assert_eq!(ENCODED.pixel(3, 0), C3);
        assert_eq!(ENCODED.pixel(7, 6), C2);
    }

    #[test]
    fn test_decoder_out_of_bounds() {
        let tile_data = [0xFFu8; TILE_BYTES];
        let decoder = GameBoy2BppDecoder;

        assert_eq!(decoder.decode_pixel(&tile_data, 8, 0), 0);
        assert_eq!(decoder.decode_pixel(&tile_data, 0, 8), 0);
        assert_eq!(decoder.decode_pixel(&tile_data[..4], 0, 0), 0);
    }

    #[test]
    fn test_color_digits() {
        assert_eq!(Color::try_from('0'), Ok(C0));
        assert_eq!(Color::try_from('.'), Ok(C0));
        assert_eq!(Color::try_from('3'), Ok(C3));
        assert_eq!(Color::try_from('4'), Err(ParseColorError('4')));
    }

    #[test]
    fn test_tile_equality_is_byte_exact() {
        assert_eq!(Tile::filled(0xEE), Tile::from_bytes([0xEE; 16]));
        assert_ne!(Tile::filled(0xEE), Tile::filled(0x0E));
    }
}
