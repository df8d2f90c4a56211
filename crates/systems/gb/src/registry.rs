//! Content-addressed store of unique tile bitmaps.

use std::fmt;

use serde::{Deserialize, Serialize};
use vramc_core::logging::{log, LogCategory, LogLevel};
use vramc_core::Tile;

use crate::AllocError;

/// Default number of unique tiles one registry accepts.
pub const MAX_REGISTERED_TILES: usize = 1024;

/// Identity of a unique tile inside one [`TileRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistryIndex(pub u16);

impl RegistryIndex {
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegistryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered list of byte-distinct tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRegistry {
    tiles: Vec<Tile>,
    capacity: usize,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_REGISTERED_TILES)
    }

    /// Registry accepting at most `capacity` unique tiles (clamped to what a
    /// [`RegistryIndex`] can name).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(u16::MAX as usize + 1);
        Self {
            tiles: Vec::with_capacity(capacity.min(MAX_REGISTERED_TILES)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Index of a byte-identical tile, if one was registered.
    pub fn find(&self, tile: &Tile) -> Option<RegistryIndex> {
        self.tiles
            .iter()
            .position(|other| other == tile)
            .map(|index| RegistryIndex(index as u16))
    }

    /// Register `tile`, returning the existing index for known content.
    pub fn register(&mut self, tile: Tile) -> Result<RegistryIndex, AllocError> {
        if let Some(found) = self.find(&tile) {
            log(LogCategory::Registry, LogLevel::Trace, || {
                format!("reusing {} for {:02X?}", found, tile.as_bytes())
            });
            return Ok(found);
        }

        if self.tiles.len() >= self.capacity {
            return Err(AllocError::RegistryFull {
                capacity: self.capacity,
            });
        }

        let index = RegistryIndex(self.tiles.len() as u16);
        self.tiles.push(tile);
        log(LogCategory::Registry, LogLevel::Debug, || {
            format!("registered new tile {}", index)
        });
        Ok(index)
    }

    pub fn get(&self, index: RegistryIndex) -> Option<&Tile> {
        self.tiles.get(index.get())
    }

    pub fn contains(&self, index: RegistryIndex) -> bool {
        index.get() < self.tiles.len()
    }

    /// All tiles in registration order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegistryIndex, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (RegistryIndex(index as u16), tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TileRegistry::new();
        let tile = Tile::filled(0x3C);
        let first = registry.register(tile).unwrap();
        for _ in 0..5 {
            assert_eq!(registry.register(tile).unwrap(), first);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_tiles_get_distinct_indices() {
        let mut registry = TileRegistry::new();
        let a = registry.register(Tile::filled(0xEE)).unwrap();
        let b = registry.register(Tile::filled(0x0E)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, RegistryIndex(0));
        assert_eq!(b, RegistryIndex(1));
    }

    #[test]
    fn test_find_unknown_tile() {
        let mut registry = TileRegistry::new();
        registry.register(Tile::filled(0)).unwrap();
        assert_eq!(registry.find(&Tile::filled(1)), None);
        assert_eq!(registry.find(&Tile::filled(0)), Some(RegistryIndex(0)));
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut registry = TileRegistry::with_capacity(2);
        registry.register(Tile::filled(1)).unwrap();
        registry.register(Tile::filled(2)).unwrap();
        // Known content still resolves once full
        assert_eq!(registry.register(Tile::filled(1)), Ok(RegistryIndex(0)));
        assert_eq!(
            registry.register(Tile::filled(3)),
            Err(AllocError::RegistryFull { capacity: 2 })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iteration_order() {
        let mut registry = TileRegistry::new();
        for byte in [9u8, 4, 9, 7] {
            registry.register(Tile::filled(byte)).unwrap();
        }
        let order: Vec<_> = registry.iter().map(|(i, t)| (i.0, t.as_bytes()[0])).collect();
        assert_eq!(order, vec![(0, 9), (1, 4), (2, 7)]);
        assert!(registry.contains(RegistryIndex(2)));
        assert!(!registry.contains(RegistryIndex(3)));
    }
}
