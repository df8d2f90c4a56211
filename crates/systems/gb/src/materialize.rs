//! Copying a scene's tiles into tile memory.
//!
//! All address resolution happens in [`ScenePlan::for_scene`]; applying a
//! plan is a plain sequence of 16-byte copies that cannot fail.

use serde::Serialize;
use vramc_core::logging::{log, LogCategory, LogLevel};
use vramc_core::Tile;

use crate::address::TileAddress;
use crate::registry::RegistryIndex;
use crate::scene::{Scene, TableKind};
use crate::scenes::{SceneId, SceneSet};
use crate::vram::TileSink;
use crate::AllocError;

/// One tile copy, with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileCopy {
    pub address: TileAddress,
    pub registry_index: RegistryIndex,
    pub table: TableKind,
    pub slot: u8,
    #[serde(skip)]
    pub tile: Tile,
}

/// Resolved copies for one scene: sprite table first, then shared, then
/// background, each in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePlan {
    copies: Vec<TileCopy>,
}

impl ScenePlan {
    pub fn for_scene(set: &SceneSet, id: SceneId) -> Result<Self, AllocError> {
        Self::resolve(set, set.scene(id)?)
    }

    fn resolve(set: &SceneSet, scene: &Scene) -> Result<Self, AllocError> {
        let registry = set.registry();
        let mut copies = Vec::new();
        for table in TableKind::ALL {
            for (slot, registry_index) in scene.table(table).occupied() {
                let tile = *registry
                    .get(registry_index)
                    .ok_or(AllocError::InvalidRegistryIndex(registry_index))?;
                copies.push(TileCopy {
                    address: table.slot_address(slot),
                    registry_index,
                    table,
                    slot,
                    tile,
                });
            }
        }
        Ok(Self { copies })
    }

    pub fn copies(&self) -> &[TileCopy] {
        &self.copies
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Write every tile to `sink`. Returns the number of tiles written.
    pub fn apply<S: TileSink + ?Sized>(&self, sink: &mut S) -> usize {
        for copy in &self.copies {
            log(LogCategory::Materialize, LogLevel::Trace, || {
                format!(
                    "{} slot {} ({}) -> {}",
                    copy.table, copy.slot, copy.registry_index, copy.address
                )
            });
            sink.write_tile(copy.address, &copy.tile);
        }
        log(LogCategory::Materialize, LogLevel::Debug, || {
            format!("materialized {} tiles", self.copies.len())
        });
        self.copies.len()
    }
}

/// Materialize scene `id` of `set` into `sink`.
pub fn setup_tiles_for_scene<S: TileSink + ?Sized>(
    set: &SceneSet,
    id: SceneId,
    sink: &mut S,
) -> Result<usize, AllocError> {
    let plan = ScenePlan::for_scene(set, id)?;
    Ok(plan.apply(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TileRegistry;
    use crate::scene::SceneLayout;
    use crate::vram::{Vram, WriteLog};

    #[test]
    fn test_empty_slots_are_skipped() {
        let mut registry = TileRegistry::new();
        let a = Tile::filled(0xA0);
        let b = Tile::filled(0xB0);
        // Four fillers push B to registry index 4
        for byte in 1..=4u8 {
            registry.register(Tile::filled(byte)).unwrap();
        }
        let mut scene = Scene::with_layout(SceneLayout {
            tiles_per_region: 8,
            sprite_limit: 40,
        });
        scene.register_background_tile(&mut registry, b).unwrap();
        assert_eq!(registry.find(&b), Some(RegistryIndex(4)));
        let a_index = registry.register(a).unwrap();
        assert_eq!(a_index, RegistryIndex(5));

        let set = SceneSet::new(registry, vec![scene]).unwrap();
        let mut log = WriteLog::new();
        assert_eq!(setup_tiles_for_scene(&set, 0, &mut log), Ok(1));
        assert_eq!(log.addresses(), vec![TileAddress(0x9040)]);
    }

    #[test]
    fn test_two_writes_for_two_occupied_slots() {
        let mut registry = TileRegistry::new();
        let a = Tile::filled(0xA0);
        let b = Tile::filled(0xB0);
        let mut scene = Scene::with_layout(SceneLayout {
            tiles_per_region: 8,
            sprite_limit: 40,
        });
        // A hints slot 0
        scene.register_background_tile(&mut registry, a).unwrap();
        for byte in 1..=4u8 {
            registry.register(Tile::filled(byte)).unwrap();
        }
        // B is registry index 5 and hints slot 5
        scene.register_background_tile(&mut registry, b).unwrap();
        let table = scene.table(TableKind::Background);
        assert!(table.get(3).is_none());
        assert_eq!(table.get(5), Some(RegistryIndex(5)));

        let set = SceneSet::new(registry, vec![scene]).unwrap();
        let mut log = WriteLog::new();
        let written = setup_tiles_for_scene(&set, 0, &mut log).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            log.writes,
            vec![(TileAddress(0x9000), a), (TileAddress(0x9050), b)]
        );
    }

    #[test]
    fn test_table_order() {
        let mut registry = TileRegistry::new();
        let mut scene = Scene::new();
        scene.register_background_tile(&mut registry, Tile::filled(1)).unwrap();
        scene.register_shared_tile(&mut registry, Tile::filled(2)).unwrap();
        scene.register_sprite_tile(&mut registry, Tile::filled(3)).unwrap();
        let set = SceneSet::new(registry, vec![scene]).unwrap();

        let plan = ScenePlan::for_scene(&set, 0).unwrap();
        let tables: Vec<_> = plan.copies().iter().map(|c| c.table).collect();
        assert_eq!(tables, vec![TableKind::Sprite, TableKind::Shared, TableKind::Background]);
        assert_eq!(
            plan.copies().iter().map(|c| c.address).collect::<Vec<_>>(),
            vec![TileAddress(0x8020), TileAddress(0x8810), TileAddress(0x9000)]
        );
    }

    #[test]
    fn test_apply_into_vram() {
        let mut registry = TileRegistry::new();
        let mut scene = Scene::new();
        let tile = Tile::filled(0x5A);
        scene.register_sprite_tile(&mut registry, tile).unwrap();
        let set = SceneSet::new(registry, vec![scene]).unwrap();

        let mut vram = Vram::new();
        setup_tiles_for_scene(&set, 0, &mut vram).unwrap();
        assert_eq!(vram.tile_at(TileAddress(0x8000)), tile);
        assert_eq!(vram.read(0x8010), 0);
    }

    #[test]
    fn test_unknown_scene() {
        let set = SceneSet::new(TileRegistry::new(), Vec::new()).unwrap();
        assert_eq!(
            ScenePlan::for_scene(&set, 0),
            Err(AllocError::UnknownScene(0))
        );
    }
}
