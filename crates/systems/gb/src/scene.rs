//! Per-scene slot allocation.
//!
//! A scene owns three fixed-size slot tables (background, sprite, shared).
//! Tiles are placed by open addressing: the registry index modulo the table
//! size is the preferred slot, so the same content tends to land on the same
//! slot in independently built scenes, and collisions step forward with
//! wraparound. Slots are never freed.

use std::fmt;

use serde::{Deserialize, Serialize};
use vramc_core::logging::{log, LogCategory, LogLevel};
use vramc_core::Tile;

use crate::address::{tile_address, AddressingMode, TileAddress, TileIndex};
use crate::registry::{RegistryIndex, TileRegistry};
use crate::AllocError;

/// Slots per hardware tile bank.
pub const TILES_PER_REGION: usize = 128;

/// Objects the hardware can show at once.
pub const SPRITE_LIMIT: usize = 40;

/// Tile index of shared slot 0. Indices 128-255 address $8800-$8FFF in both
/// addressing modes.
pub const SHARED_INDEX_BASE: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Background,
    Sprite,
    Shared,
}

impl TableKind {
    /// Order in which tables are materialized.
    pub const ALL: [TableKind; 3] = [TableKind::Sprite, TableKind::Shared, TableKind::Background];

    pub const fn addressing_mode(self) -> AddressingMode {
        match self {
            TableKind::Sprite => AddressingMode::Object,
            TableKind::Background | TableKind::Shared => AddressingMode::BgWindowSigned,
        }
    }

    /// Largest table of this kind. Shared slots sit above index 128, so only
    /// 128 of them exist.
    pub const fn max_capacity(self) -> usize {
        match self {
            TableKind::Shared => 256 - SHARED_INDEX_BASE as usize,
            TableKind::Background | TableKind::Sprite => 256,
        }
    }

    /// Tile index that names `slot` of this table.
    ///
    /// Shared slots past 127 cannot exist (see [`TableKind::max_capacity`]);
    /// the index wraps instead of overflowing.
    pub const fn tile_index(self, slot: u8) -> TileIndex {
        match self {
            TableKind::Shared => TileIndex(SHARED_INDEX_BASE.wrapping_add(slot)),
            TableKind::Background | TableKind::Sprite => TileIndex(slot),
        }
    }

    pub const fn slot_address(self, slot: u8) -> TileAddress {
        tile_address(self.tile_index(slot), self.addressing_mode())
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Background => "background",
            TableKind::Sprite => "sprite",
            TableKind::Shared => "shared",
        };
        f.write_str(name)
    }
}

/// Table sizes for one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    pub tiles_per_region: usize,
    pub sprite_limit: usize,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            tiles_per_region: TILES_PER_REGION,
            sprite_limit: SPRITE_LIMIT,
        }
    }
}

impl SceneLayout {
    pub fn is_valid(&self) -> bool {
        (1..=TILES_PER_REGION).contains(&self.tiles_per_region)
    }
}

/// Fixed-capacity open-addressing table of registry indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    kind: TableKind,
    slots: Vec<Option<RegistryIndex>>,
}

impl SlotTable {
    /// # Panics
    /// If `capacity` is 0 or above [`TableKind::max_capacity`] (256 for
    /// background and sprite tables, 128 for the shared table).
    pub fn new(kind: TableKind, capacity: usize) -> Self {
        assert!(
            (1..=kind.max_capacity()).contains(&capacity),
            "{} table capacity must be 1-{}, got {}",
            kind,
            kind.max_capacity(),
            capacity
        );
        Self {
            kind,
            slots: vec![None; capacity],
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<RegistryIndex> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<RegistryIndex>] {
        &self.slots
    }

    /// Occupied slots in ascending slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (u8, RegistryIndex)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.map(|index| (slot as u8, index)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|entry| entry.is_some()).count()
    }

    fn hint(&self, index: RegistryIndex) -> usize {
        index.get() % self.capacity()
    }

    /// Slot holding `index`, searching forward from its hint.
    pub fn position_of(&self, index: RegistryIndex) -> Option<u8> {
        let capacity = self.capacity();
        let start = self.hint(index);
        (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&slot| self.slots[slot] == Some(index))
            .map(|slot| slot as u8)
    }

    fn ensure_absent(&self, index: RegistryIndex) -> Result<(), AllocError> {
        match self.position_of(index) {
            Some(slot) => Err(AllocError::DuplicateInsertion {
                table: self.kind,
                index,
                slot,
            }),
            None => Ok(()),
        }
    }

    /// Place `index` at its hint or the next free slot after it.
    pub fn insert(&mut self, index: RegistryIndex) -> Result<u8, AllocError> {
        self.ensure_absent(index)?;

        let capacity = self.capacity();
        let start = self.hint(index);
        for step in 0..capacity {
            let slot = (start + step) % capacity;
            if self.slots[slot].is_none() {
                self.slots[slot] = Some(index);
                log(LogCategory::Allocation, LogLevel::Trace, || {
                    format!("{} {} -> slot {} (hint {})", self.kind, index, slot, start)
                });
                return Ok(slot as u8);
            }
            log(LogCategory::Allocation, LogLevel::Debug, || {
                format!("{} {}: slot {} taken, trying next", self.kind, index, slot)
            });
        }

        Err(AllocError::TableFull {
            table: self.kind,
            capacity,
        })
    }

    /// Place a double-height pair on two adjacent free slots, the upper half
    /// on the even one. Returns the even slot.
    pub fn insert_double_height(
        &mut self,
        upper: RegistryIndex,
        lower: RegistryIndex,
    ) -> Result<u8, AllocError> {
        if upper == lower {
            return Err(AllocError::IdenticalPairHalves {
                table: self.kind,
                index: upper,
            });
        }
        self.ensure_absent(upper)?;
        self.ensure_absent(lower)?;

        let capacity = self.capacity();
        let pair_count = capacity / 2;
        let start_pair = if pair_count == 0 {
            0
        } else {
            (self.hint(upper) / 2) % pair_count
        };
        for step in 0..pair_count {
            let slot = ((start_pair + step) % pair_count) * 2;
            if self.slots[slot].is_none() && self.slots[slot + 1].is_none() {
                self.slots[slot] = Some(upper);
                self.slots[slot + 1] = Some(lower);
                log(LogCategory::Allocation, LogLevel::Trace, || {
                    format!(
                        "{} pair {}/{} -> slots {}/{}",
                        self.kind,
                        upper,
                        lower,
                        slot,
                        slot + 1
                    )
                });
                return Ok(slot as u8);
            }
        }

        Err(AllocError::TableFull {
            table: self.kind,
            capacity,
        })
    }
}

/// One allocation context: everything resident in tile memory at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    background: SlotTable,
    sprite: SlotTable,
    shared: SlotTable,
    sprites: Vec<TileIndex>,
    sprite_limit: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_layout(SceneLayout::default())
    }

    /// # Panics
    /// If the layout's `tiles_per_region` is outside 1-128.
    pub fn with_layout(layout: SceneLayout) -> Self {
        assert!(
            layout.is_valid(),
            "tiles_per_region must be 1-{}, got {}",
            TILES_PER_REGION,
            layout.tiles_per_region
        );
        Self {
            background: SlotTable::new(TableKind::Background, layout.tiles_per_region),
            sprite: SlotTable::new(TableKind::Sprite, layout.tiles_per_region),
            shared: SlotTable::new(TableKind::Shared, layout.tiles_per_region),
            sprites: Vec::new(),
            sprite_limit: layout.sprite_limit,
        }
    }

    pub fn table(&self, kind: TableKind) -> &SlotTable {
        match kind {
            TableKind::Background => &self.background,
            TableKind::Sprite => &self.sprite,
            TableKind::Shared => &self.shared,
        }
    }

    fn table_mut(&mut self, kind: TableKind) -> &mut SlotTable {
        match kind {
            TableKind::Background => &mut self.background,
            TableKind::Sprite => &mut self.sprite,
            TableKind::Shared => &mut self.shared,
        }
    }

    /// Tile indices of every registered sprite, in registration order.
    pub fn sprites(&self) -> &[TileIndex] {
        &self.sprites
    }

    pub fn sprite_limit(&self) -> usize {
        self.sprite_limit
    }

    fn ensure_sprite_capacity(&self) -> Result<(), AllocError> {
        if self.sprites.len() >= self.sprite_limit {
            return Err(AllocError::SpriteLimit {
                limit: self.sprite_limit,
            });
        }
        Ok(())
    }

    fn register_into(
        &mut self,
        registry: &mut TileRegistry,
        kind: TableKind,
        tile: Tile,
    ) -> Result<TileIndex, AllocError> {
        let index = registry.register(tile)?;
        let slot = self.table_mut(kind).insert(index)?;
        Ok(kind.tile_index(slot))
    }

    pub fn register_background_tile(
        &mut self,
        registry: &mut TileRegistry,
        tile: Tile,
    ) -> Result<TileIndex, AllocError> {
        self.register_into(registry, TableKind::Background, tile)
    }

    /// Register a tile reachable from both backgrounds and sprites.
    pub fn register_shared_tile(
        &mut self,
        registry: &mut TileRegistry,
        tile: Tile,
    ) -> Result<TileIndex, AllocError> {
        self.register_into(registry, TableKind::Shared, tile)
    }

    pub fn register_sprite_tile(
        &mut self,
        registry: &mut TileRegistry,
        tile: Tile,
    ) -> Result<TileIndex, AllocError> {
        self.ensure_sprite_capacity()?;
        let index = self.register_into(registry, TableKind::Sprite, tile)?;
        self.sprites.push(index);
        Ok(index)
    }

    /// Register an 8x16 sprite. Returns the index of the upper half; the
    /// lower half always sits at the next index.
    pub fn register_sprite_tiles(
        &mut self,
        registry: &mut TileRegistry,
        upper: Tile,
        lower: Tile,
    ) -> Result<TileIndex, AllocError> {
        self.ensure_sprite_capacity()?;
        let upper = registry.register(upper)?;
        let lower = registry.register(lower)?;
        let slot = self.sprite.insert_double_height(upper, lower)?;
        let index = TableKind::Sprite.tile_index(slot);
        self.sprites.push(index);
        Ok(index)
    }

    /// Resolve where `tile` was placed in the `kind` table.
    pub fn tile_index(
        &self,
        registry: &TileRegistry,
        kind: TableKind,
        tile: &Tile,
    ) -> Result<TileIndex, AllocError> {
        let index = registry
            .find(tile)
            .ok_or(AllocError::TileNotFound { table: kind })?;
        let slot = self
            .table(kind)
            .position_of(index)
            .ok_or(AllocError::TileNotFound { table: kind })?;
        Ok(kind.tile_index(slot))
    }

    pub fn tile_address(
        &self,
        registry: &TileRegistry,
        kind: TableKind,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        let index = self.tile_index(registry, kind, tile)?;
        Ok(tile_address(index, kind.addressing_mode()))
    }

    pub fn background_tile_index(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileIndex, AllocError> {
        self.tile_index(registry, TableKind::Background, tile)
    }

    pub fn background_tile_address(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        self.tile_address(registry, TableKind::Background, tile)
    }

    pub fn sprite_tile_index(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileIndex, AllocError> {
        self.tile_index(registry, TableKind::Sprite, tile)
    }

    pub fn sprite_tile_address(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        self.tile_address(registry, TableKind::Sprite, tile)
    }

    pub fn shared_tile_index(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileIndex, AllocError> {
        self.tile_index(registry, TableKind::Shared, tile)
    }

    pub fn shared_tile_address(
        &self,
        registry: &TileRegistry,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        self.tile_address(registry, TableKind::Shared, tile)
    }
}
