//! A registry bundled with every scene built against it.

use vramc_core::logging::{log, LogCategory, LogLevel};
use vramc_core::Tile;

use crate::address::{TileAddress, TileIndex};
use crate::registry::TileRegistry;
use crate::scene::{Scene, TableKind};
use crate::AllocError;

/// Position of a scene inside its [`SceneSet`].
pub type SceneId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSet {
    registry: TileRegistry,
    scenes: Vec<Scene>,
}

impl SceneSet {
    /// Bundle `registry` with `scenes`, checking that every occupied slot
    /// names a tile the registry actually holds.
    pub fn new(registry: TileRegistry, scenes: Vec<Scene>) -> Result<Self, AllocError> {
        for scene in &scenes {
            for kind in TableKind::ALL {
                for (_, index) in scene.table(kind).occupied() {
                    if !registry.contains(index) {
                        return Err(AllocError::InvalidRegistryIndex(index));
                    }
                }
            }
        }
        log(LogCategory::Allocation, LogLevel::Info, || {
            format!(
                "scene set ready: {} scenes, {} unique tiles",
                scenes.len(),
                registry.len()
            )
        });
        Ok(Self { registry, scenes })
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene(&self, id: SceneId) -> Result<&Scene, AllocError> {
        self.scenes.get(id).ok_or(AllocError::UnknownScene(id))
    }

    pub fn tile_index(
        &self,
        id: SceneId,
        kind: TableKind,
        tile: &Tile,
    ) -> Result<TileIndex, AllocError> {
        self.scene(id)?.tile_index(&self.registry, kind, tile)
    }

    pub fn tile_address(
        &self,
        id: SceneId,
        kind: TableKind,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        self.scene(id)?.tile_address(&self.registry, kind, tile)
    }

    pub fn background_tile_index(&self, id: SceneId, tile: &Tile) -> Result<TileIndex, AllocError> {
        self.tile_index(id, TableKind::Background, tile)
    }

    pub fn background_tile_address(
        &self,
        id: SceneId,
        tile: &Tile,
    ) -> Result<TileAddress, AllocError> {
        self.tile_address(id, TableKind::Background, tile)
    }

    pub fn sprite_tile_index(&self, id: SceneId, tile: &Tile) -> Result<TileIndex, AllocError> {
        self.tile_index(id, TableKind::Sprite, tile)
    }

    pub fn sprite_tile_address(&self, id: SceneId, tile: &Tile) -> Result<TileAddress, AllocError> {
        self.tile_address(id, TableKind::Sprite, tile)
    }

    pub fn shared_tile_index(&self, id: SceneId, tile: &Tile) -> Result<TileIndex, AllocError> {
        self.tile_index(id, TableKind::Shared, tile)
    }

    pub fn shared_tile_address(&self, id: SceneId, tile: &Tile) -> Result<TileAddress, AllocError> {
        self.tile_address(id, TableKind::Shared, tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryIndex;

    fn two_scenes() -> (SceneSet, Tile, Tile) {
        let mut registry = TileRegistry::new();
        let a = Tile::filled(0x11);
        let b = Tile::filled(0x22);
        let mut first = Scene::new();
        first.register_background_tile(&mut registry, a).unwrap();
        let mut second = Scene::new();
        second.register_sprite_tile(&mut registry, b).unwrap();
        second.register_background_tile(&mut registry, a).unwrap();
        (SceneSet::new(registry, vec![first, second]).unwrap(), a, b)
    }

    #[test]
    fn test_queries_are_scoped_by_scene() {
        let (set, a, b) = two_scenes();
        assert_eq!(set.background_tile_address(0, &a), Ok(TileAddress(0x9000)));
        assert_eq!(set.sprite_tile_address(1, &b), Ok(TileAddress(0x8010)));
        assert!(matches!(
            set.sprite_tile_index(0, &b),
            Err(AllocError::TileNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_scene() {
        let (set, a, _) = two_scenes();
        assert_eq!(set.len(), 2);
        assert_eq!(set.background_tile_index(7, &a), Err(AllocError::UnknownScene(7)));
        assert!(set.scene(2).is_err());
    }

    #[test]
    fn test_rejects_scene_from_foreign_registry() {
        let mut foreign = TileRegistry::new();
        let mut scene = Scene::new();
        scene.register_background_tile(&mut foreign, Tile::filled(1)).unwrap();
        scene.register_background_tile(&mut foreign, Tile::filled(2)).unwrap();

        let mut registry = TileRegistry::new();
        registry.register(Tile::filled(1)).unwrap();
        assert_eq!(
            SceneSet::new(registry, vec![scene]),
            Err(AllocError::InvalidRegistryIndex(RegistryIndex(1)))
        );
    }
}
