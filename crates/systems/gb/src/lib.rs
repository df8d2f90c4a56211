//! Game Boy tile-memory allocation.
//!
//! Tiles are deduplicated into a [`TileRegistry`], placed into per-scene slot
//! tables, resolved to hardware addresses and finally copied into tile memory
//! by the materializer. Everything that can fail does so at build time.

pub mod address;
pub mod codegen;
pub mod manifest;
pub mod materialize;
pub mod preview;
pub mod registry;
pub mod report;
pub mod scene;
pub mod scenes;
pub mod vram;

pub use address::{tile_address, AddressingMode, TileAddress, TileIndex};
pub use manifest::{CompiledAssets, Manifest, ManifestError};
pub use materialize::{setup_tiles_for_scene, ScenePlan, TileCopy};
pub use registry::{RegistryIndex, TileRegistry, MAX_REGISTERED_TILES};
pub use scene::{Scene, SceneLayout, SlotTable, TableKind, SPRITE_LIMIT, TILES_PER_REGION};
pub use scenes::{SceneId, SceneSet};
pub use vram::{TileSink, Vram, WriteLog};

/// Allocation failures. All of them are fatal to the build.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("tile registry full ({capacity} unique tiles)")]
    RegistryFull { capacity: usize },
    #[error("{table} table full ({capacity} slots)")]
    TableFull { table: TableKind, capacity: usize },
    #[error("tile {index} already placed in {table} slot {slot}")]
    DuplicateInsertion {
        table: TableKind,
        index: RegistryIndex,
        slot: u8,
    },
    #[error("double-height sprite uses tile {index} for both halves")]
    IdenticalPairHalves { table: TableKind, index: RegistryIndex },
    #[error("tile not placed in {table} table")]
    TileNotFound { table: TableKind },
    #[error("sprite limit of {limit} reached")]
    SpriteLimit { limit: usize },
    #[error("no scene with id {0}")]
    UnknownScene(usize),
    #[error("slot references unregistered tile {0}")]
    InvalidRegistryIndex(RegistryIndex),
}
