//! Allocation reports for `inspect`.

use std::fmt;

use serde::Serialize;

use crate::address::TileAddress;
use crate::manifest::CompiledAssets;
use crate::materialize::ScenePlan;
use crate::registry::RegistryIndex;
use crate::scene::TableKind;
use crate::AllocError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    pub table: TableKind,
    pub slot: u8,
    pub tile_index: u8,
    pub address: TileAddress,
    pub registry_index: RegistryIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableUsage {
    pub table: TableKind,
    pub occupied: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneReport {
    pub id: usize,
    pub name: String,
    pub sprites: Vec<u8>,
    pub sprite_limit: usize,
    pub usage: Vec<TableUsage>,
    /// In materialization order.
    pub entries: Vec<SlotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationReport {
    pub unique_tiles: usize,
    pub registry_capacity: usize,
    pub scenes: Vec<SceneReport>,
}

impl AllocationReport {
    pub fn build(assets: &CompiledAssets) -> Result<Self, AllocError> {
        let set = assets.set();
        let mut scenes = Vec::with_capacity(set.len());
        for id in 0..set.len() {
            let scene = set.scene(id)?;
            let plan = ScenePlan::for_scene(set, id)?;
            scenes.push(SceneReport {
                id,
                name: assets.scene_name(id).unwrap_or_default().to_string(),
                sprites: scene.sprites().iter().map(|index| index.get()).collect(),
                sprite_limit: scene.sprite_limit(),
                usage: TableKind::ALL
                    .iter()
                    .map(|&table| TableUsage {
                        table,
                        occupied: scene.table(table).occupied_count(),
                        capacity: scene.table(table).capacity(),
                    })
                    .collect(),
                entries: plan
                    .copies()
                    .iter()
                    .map(|copy| SlotEntry {
                        table: copy.table,
                        slot: copy.slot,
                        tile_index: copy.table.tile_index(copy.slot).get(),
                        address: copy.address,
                        registry_index: copy.registry_index,
                    })
                    .collect(),
            });
        }
        Ok(Self {
            unique_tiles: set.registry().len(),
            registry_capacity: set.registry().capacity(),
            scenes,
        })
    }
}

impl fmt::Display for AllocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "registry: {}/{} unique tiles",
            self.unique_tiles, self.registry_capacity
        )?;
        for scene in &self.scenes {
            writeln!(f)?;
            writeln!(f, "scene {} '{}'", scene.id, scene.name)?;
            for usage in &scene.usage {
                writeln!(
                    f,
                    "  {:<10} {:>3}/{} slots",
                    usage.table.to_string(),
                    usage.occupied,
                    usage.capacity
                )?;
            }
            writeln!(f, "  sprites    {:>3}/{}", scene.sprites.len(), scene.sprite_limit)?;
            writeln!(f, "  {:<10} {:>4} {:>5} {:>7} {:>8}", "table", "slot", "index", "address", "tile")?;
            for entry in &scene.entries {
                writeln!(
                    f,
                    "  {:<10} {:>4} {:>5} {:>7} {:>8}",
                    entry.table.to_string(),
                    entry.slot,
                    entry.tile_index,
                    entry.address.to_string(),
                    entry.registry_index.to_string()
                )?;
            }
        }
        Ok(())
    }
}
