//! JSON asset manifests.
//!
//! A manifest names every tile once and then lists, scene by scene, which
//! table each tile is registered into. Compiling it runs the registrations in
//! order against one shared registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vramc_core::logging::{log, LogCategory, LogLevel};
use vramc_core::ppu::{build_tile_remapped, TILE_SIZE};
use vramc_core::{Color, ColorRemap, Tile, TileColors};

use crate::address::TileIndex;
use crate::registry::{TileRegistry, MAX_REGISTERED_TILES};
use crate::scene::{Scene, SceneLayout, TableKind, SPRITE_LIMIT, TILES_PER_REGION};
use crate::scenes::{SceneId, SceneSet};
use crate::AllocError;

#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tiles_per_region must be 1-{}, got {got}", TILES_PER_REGION)]
    InvalidLayout { got: usize },
    #[error("tile '{tile}': {reason}")]
    MalformedTile { tile: String, reason: String },
    #[error("scene '{scene}' uses unknown tile '{tile}'")]
    UnknownTile { scene: String, tile: String },
    #[error("scene '{0}' is defined more than once")]
    DuplicateScene(String),
    #[error("scene '{scene}': {source}")]
    Scene {
        scene: String,
        #[source]
        source: AllocError,
    },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Table and registry sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub tiles_per_region: usize,
    pub sprite_limit: usize,
    pub registry_capacity: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tiles_per_region: TILES_PER_REGION,
            sprite_limit: SPRITE_LIMIT,
            registry_capacity: MAX_REGISTERED_TILES,
        }
    }
}

impl LayoutConfig {
    pub fn scene_layout(&self) -> SceneLayout {
        SceneLayout {
            tiles_per_region: self.tiles_per_region,
            sprite_limit: self.sprite_limit,
        }
    }
}

/// A tile as authored: eight rows of color digits, optionally remapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileSource {
    Rows(Vec<String>),
    Remapped {
        rows: Vec<String>,
        #[serde(default)]
        remap: Option<[u8; 4]>,
    },
}

impl TileSource {
    fn rows(&self) -> &[String] {
        match self {
            TileSource::Rows(rows) | TileSource::Remapped { rows, .. } => rows,
        }
    }

    fn remap(&self, name: &str) -> Result<ColorRemap, ManifestError> {
        let entries = match self {
            TileSource::Remapped {
                remap: Some(entries),
                ..
            } => entries,
            _ => return Ok(ColorRemap::IDENTITY),
        };
        let mut colors = [Color::Id0; 4];
        for (color, &id) in colors.iter_mut().zip(entries) {
            if id > 3 {
                return Err(ManifestError::MalformedTile {
                    tile: name.to_string(),
                    reason: format!("remap entry {} is not a color id", id),
                });
            }
            *color = Color::from_bits(id);
        }
        Ok(ColorRemap(colors))
    }

    /// Encode the authored grid.
    pub fn to_tile(&self, name: &str) -> Result<Tile, ManifestError> {
        let malformed = |reason: String| ManifestError::MalformedTile {
            tile: name.to_string(),
            reason,
        };

        let rows = self.rows();
        if rows.len() != TILE_SIZE {
            return Err(malformed(format!("expected {} rows, got {}", TILE_SIZE, rows.len())));
        }

        let mut colors: TileColors = [[Color::Id0; TILE_SIZE]; TILE_SIZE];
        for (y, row) in rows.iter().enumerate() {
            let digits: Vec<char> = row.chars().collect();
            if digits.len() != TILE_SIZE {
                return Err(malformed(format!(
                    "row {} has {} pixels, expected {}",
                    y,
                    digits.len(),
                    TILE_SIZE
                )));
            }
            for (x, &digit) in digits.iter().enumerate() {
                colors[y][x] =
                    Color::try_from(digit).map_err(|e| malformed(format!("row {}: {}", y, e)))?;
            }
        }

        Ok(build_tile_remapped(&colors, self.remap(name)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    Background(String),
    Sprite(String),
    /// Upper and lower half of an 8x16 sprite.
    TallSprite(String, String),
    Shared(String),
}

impl Registration {
    /// Table the registration goes into and the tile names it uses.
    pub fn placements(&self) -> Vec<(TableKind, &str)> {
        match self {
            Registration::Background(name) => vec![(TableKind::Background, name.as_str())],
            Registration::Sprite(name) => vec![(TableKind::Sprite, name.as_str())],
            Registration::TallSprite(upper, lower) => vec![
                (TableKind::Sprite, upper.as_str()),
                (TableKind::Sprite, lower.as_str()),
            ],
            Registration::Shared(name) => vec![(TableKind::Shared, name.as_str())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub name: String,
    #[serde(default)]
    pub registrations: Vec<Registration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub tiles: BTreeMap<String, TileSource>,
    #[serde(default)]
    pub scenes: Vec<SceneSpec>,
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let contents = fs::read_to_string(path.as_ref())?;
        log(LogCategory::Manifest, LogLevel::Debug, || {
            format!("read manifest {}", path.as_ref().display())
        });
        Self::from_json_str(&contents)
    }

    /// Encode every tile and run all registrations.
    pub fn compile(&self) -> Result<CompiledAssets, ManifestError> {
        let layout = self.layout.scene_layout();
        if !layout.is_valid() {
            return Err(ManifestError::InvalidLayout {
                got: layout.tiles_per_region,
            });
        }

        let tiles = self
            .tiles
            .iter()
            .map(|(name, source)| source.to_tile(name).map(|tile| (name.clone(), tile)))
            .collect::<Result<BTreeMap<_, _>, ManifestError>>()?;

        let mut registry = TileRegistry::with_capacity(self.layout.registry_capacity);
        let mut scenes = Vec::with_capacity(self.scenes.len());
        let mut compiled = Vec::with_capacity(self.scenes.len());

        for spec in &self.scenes {
            if compiled.iter().any(|c: &CompiledScene| c.name == spec.name) {
                return Err(ManifestError::DuplicateScene(spec.name.clone()));
            }

            let lookup = |name: &str| {
                tiles
                    .get(name)
                    .copied()
                    .ok_or_else(|| ManifestError::UnknownTile {
                        scene: spec.name.clone(),
                        tile: name.to_string(),
                    })
            };
            let in_scene = |source: AllocError| ManifestError::Scene {
                scene: spec.name.clone(),
                source,
            };

            let mut scene = Scene::with_layout(layout);
            let mut named = Vec::new();
            for registration in &spec.registrations {
                match registration {
                    Registration::Background(name) => {
                        scene
                            .register_background_tile(&mut registry, lookup(name)?)
                            .map_err(in_scene)?;
                    }
                    Registration::Sprite(name) => {
                        scene
                            .register_sprite_tile(&mut registry, lookup(name)?)
                            .map_err(in_scene)?;
                    }
                    Registration::TallSprite(upper, lower) => {
                        scene
                            .register_sprite_tiles(&mut registry, lookup(upper)?, lookup(lower)?)
                            .map_err(in_scene)?;
                    }
                    Registration::Shared(name) => {
                        scene
                            .register_shared_tile(&mut registry, lookup(name)?)
                            .map_err(in_scene)?;
                    }
                }
                for (table, name) in registration.placements() {
                    if !named.iter().any(|(t, n): &(TableKind, String)| *t == table && n == name) {
                        named.push((table, name.to_string()));
                    }
                }
            }

            log(LogCategory::Manifest, LogLevel::Info, || {
                format!(
                    "scene '{}': {} registrations, {} sprites",
                    spec.name,
                    spec.registrations.len(),
                    scene.sprites().len()
                )
            });
            scenes.push(scene);
            compiled.push(CompiledScene {
                name: spec.name.clone(),
                named,
            });
        }

        Ok(CompiledAssets {
            set: SceneSet::new(registry, scenes)?,
            tiles,
            scenes: compiled,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledScene {
    name: String,
    /// (table, tile name) in first-registration order.
    named: Vec<(TableKind, String)>,
}

/// A named tile and where it ended up in one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPlacement {
    pub table: TableKind,
    pub name: String,
    pub index: TileIndex,
}

/// Result of compiling a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAssets {
    set: SceneSet,
    tiles: BTreeMap<String, Tile>,
    scenes: Vec<CompiledScene>,
}

impl CompiledAssets {
    pub fn set(&self) -> &SceneSet {
        &self.set
    }

    pub fn tile(&self, name: &str) -> Option<&Tile> {
        self.tiles.get(name)
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|scene| scene.name.as_str())
    }

    pub fn scene_name(&self, id: SceneId) -> Option<&str> {
        self.scenes.get(id).map(|scene| scene.name.as_str())
    }

    pub fn scene_id(&self, name: &str) -> Option<SceneId> {
        self.scenes.iter().position(|scene| scene.name == name)
    }

    /// Scene by name, or by numeric id when no scene has that name.
    pub fn find_scene(&self, key: &str) -> Option<SceneId> {
        self.scene_id(key).or_else(|| {
            key.parse::<SceneId>()
                .ok()
                .filter(|&id| id < self.scenes.len())
        })
    }

    /// Every named tile placed in scene `id`, with its resolved index.
    pub fn named_placements(&self, id: SceneId) -> Result<Vec<NamedPlacement>, AllocError> {
        let compiled = self.scenes.get(id).ok_or(AllocError::UnknownScene(id))?;
        compiled
            .named
            .iter()
            .map(|(table, name)| -> Result<NamedPlacement, AllocError> {
                let tile = self
                    .tiles
                    .get(name)
                    .ok_or(AllocError::TileNotFound { table: *table })?;
                Ok(NamedPlacement {
                    table: *table,
                    name: name.clone(),
                    index: self.set.tile_index(id, *table, tile)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SOLID: &str = "33333333";
    const EMPTY: &str = "........";

    fn solid() -> serde_json::Value {
        json!([SOLID, SOLID, SOLID, SOLID, SOLID, SOLID, SOLID, SOLID])
    }

    fn empty() -> serde_json::Value {
        json!([EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, EMPTY])
    }

    fn compile(value: serde_json::Value) -> Result<CompiledAssets, ManifestError> {
        Manifest::from_json_str(&value.to_string())?.compile()
    }

    #[test]
    fn test_layout_defaults() {
        let manifest = Manifest::from_json_str("{}").unwrap();
        assert_eq!(manifest.layout, LayoutConfig::default());
        assert!(manifest.scenes.is_empty());
    }

    #[test]
    fn test_rows_encode_to_tile() {
        let assets = compile(json!({
            "tiles": { "solid": solid(), "empty": empty() }
        }))
        .unwrap();
        assert_eq!(assets.tile("solid"), Some(&Tile::filled(0xFF)));
        assert_eq!(assets.tile("empty"), Some(&Tile::filled(0x00)));
    }

    #[test]
    fn test_remap_applies() {
        let assets = compile(json!({
            "tiles": { "swapped": { "rows": solid(), "remap": [0, 1, 2, 1] } }
        }))
        .unwrap();
        // Color 3 becomes 1: low plane set, high plane clear
        let bytes = assets.tile("swapped").unwrap().as_bytes();
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(bytes[1], 0x00);
    }

    #[test]
    fn test_malformed_rows() {
        let short = compile(json!({ "tiles": { "bad": ["0000"] } }));
        assert!(matches!(short, Err(ManifestError::MalformedTile { .. })));

        let mut rows = vec![EMPTY; 8];
        rows[4] = "0000x000";
        let digit = compile(json!({ "tiles": { "bad": rows } }));
        assert!(matches!(digit, Err(ManifestError::MalformedTile { tile, .. }) if tile == "bad"));

        let remap = compile(json!({
            "tiles": { "bad": { "rows": empty(), "remap": [0, 1, 2, 4] } }
        }));
        assert!(matches!(remap, Err(ManifestError::MalformedTile { .. })));
    }

    #[test]
    fn test_registrations_share_one_registry() {
        let assets = compile(json!({
            "tiles": { "solid": solid(), "also_solid": solid(), "empty": empty() },
            "scenes": [
                { "name": "a", "registrations": [ { "background": "solid" }, { "sprite": "empty" } ] },
                { "name": "b", "registrations": [ { "background": "also_solid" } ] }
            ]
        }))
        .unwrap();
        assert_eq!(assets.set().registry().len(), 2);
        assert_eq!(assets.set().len(), 2);
        assert_eq!(assets.scene_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_tall_sprite_and_shared() {
        let assets = compile(json!({
            "tiles": { "top": solid(), "bottom": empty(), "frame": { "rows": solid(), "remap": [0, 2, 2, 2] } },
            "scenes": [ { "name": "title", "registrations": [
                { "tall_sprite": ["top", "bottom"] },
                { "shared": "frame" }
            ] } ]
        }))
        .unwrap();
        let placements = assets.named_placements(0).unwrap();
        assert_eq!(
            placements,
            vec![
                NamedPlacement { table: TableKind::Sprite, name: "top".into(), index: TileIndex(0) },
                NamedPlacement { table: TableKind::Sprite, name: "bottom".into(), index: TileIndex(1) },
                NamedPlacement { table: TableKind::Shared, name: "frame".into(), index: TileIndex(130) },
            ]
        );
    }

    #[test]
    fn test_unknown_tile() {
        let result = compile(json!({
            "scenes": [ { "name": "s", "registrations": [ { "sprite": "ghost" } ] } ]
        }));
        assert!(matches!(result, Err(ManifestError::UnknownTile { tile, .. }) if tile == "ghost"));
    }

    #[test]
    fn test_duplicate_scene() {
        let result = compile(json!({
            "scenes": [ { "name": "s" }, { "name": "s" } ]
        }));
        assert!(matches!(result, Err(ManifestError::DuplicateScene(name)) if name == "s"));
    }

    #[test]
    fn test_duplicate_registration_fails_with_scene_context() {
        let result = compile(json!({
            "tiles": { "solid": solid() },
            "scenes": [ { "name": "s", "registrations": [ { "background": "solid" }, { "background": "solid" } ] } ]
        }));
        match result {
            Err(ManifestError::Scene { scene, source }) => {
                assert_eq!(scene, "s");
                assert!(matches!(source, AllocError::DuplicateInsertion { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_layout() {
        let result = compile(json!({ "layout": { "tiles_per_region": 0 } }));
        assert!(matches!(result, Err(ManifestError::InvalidLayout { got: 0 })));
    }

    #[test]
    fn test_find_scene_by_name_or_id() {
        let assets = compile(json!({ "scenes": [ { "name": "title" }, { "name": "level" } ] })).unwrap();
        assert_eq!(assets.find_scene("level"), Some(1));
        assert_eq!(assets.find_scene("0"), Some(0));
        assert_eq!(assets.find_scene("2"), None);
        assert_eq!(assets.find_scene("menu"), None);
        assert_eq!(assets.scene_name(1), Some("level"));
    }

    #[test]
    fn test_registration_serde_shape() {
        let registration: Registration =
            serde_json::from_value(json!({ "tall_sprite": ["a", "b"] })).unwrap();
        assert_eq!(registration, Registration::TallSprite("a".into(), "b".into()));
    }
}
