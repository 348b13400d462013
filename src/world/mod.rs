//! Read-only registries mapping monster/resource codes to map locations.
//!
//! Loaded once at startup, before any agent starts, then shared by
//! reference. Load failure aborts startup; there is no lazy or partial
//! population.

use std::collections::HashMap;

use crate::api::{GameApi, MapLocation};
use crate::error::ApiError;
use crate::model::Position;

#[derive(Debug, Clone)]
struct SpawnEntry {
    skin: Option<String>,
    position: Position,
}

/// The two location registries, keyed by content code plus optional skin.
#[derive(Debug, Default)]
pub struct WorldAtlas {
    monsters: HashMap<String, Vec<SpawnEntry>>,
    resources: HashMap<String, Vec<SpawnEntry>>,
}

impl WorldAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load both registries from the game API.
    pub async fn load(api: &dyn GameApi) -> Result<Self, ApiError> {
        let mut atlas = Self::new();
        for location in api.monster_locations().await? {
            atlas.insert_monster(location);
        }
        for location in api.resource_locations().await? {
            atlas.insert_resource(location);
        }
        tracing::info!(
            "World atlas loaded: {} monster codes, {} resource codes",
            atlas.monsters.len(),
            atlas.resources.len()
        );
        Ok(atlas)
    }

    pub fn insert_monster(&mut self, location: MapLocation) {
        insert(&mut self.monsters, location);
    }

    pub fn insert_resource(&mut self, location: MapLocation) {
        insert(&mut self.resources, location);
    }

    /// Resolve a monster spawn location.
    pub fn monster(&self, code: &str, skin: Option<&str>) -> Option<Position> {
        lookup(&self.monsters, code, skin)
    }

    /// Resolve a resource node location.
    pub fn resource(&self, code: &str, skin: Option<&str>) -> Option<Position> {
        lookup(&self.resources, code, skin)
    }
}

fn insert(registry: &mut HashMap<String, Vec<SpawnEntry>>, location: MapLocation) {
    registry.entry(location.code).or_default().push(SpawnEntry {
        skin: location.skin,
        position: location.position,
    });
}

/// With a skin: prefer the exact skin entry, fall back to the skinless
/// one. Without a skin: the code's first entry wins.
fn lookup(
    registry: &HashMap<String, Vec<SpawnEntry>>,
    code: &str,
    skin: Option<&str>,
) -> Option<Position> {
    let entries = registry.get(code)?;
    match skin {
        Some(skin) => entries
            .iter()
            .find(|e| e.skin.as_deref() == Some(skin))
            .or_else(|| entries.iter().find(|e| e.skin.is_none()))
            .map(|e| e.position),
        None => entries.first().map(|e| e.position),
    }
}
