//! Wire types for the game API. Private to this module; the rest of the
//! crate only sees the model types and the outcome structs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{ItemStack, Position};

use super::{ActionOutcome, FightOutcome, GatherOutcome, MapLocation};

/// Every successful response wraps its payload in a `data` field.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct CooldownData {
    pub expiration: DateTime<Utc>,
}

/// Payload for actions that only report a cooldown.
#[derive(Debug, Deserialize)]
pub(super) struct ActionData {
    #[serde(default)]
    pub cooldown: Option<CooldownData>,
}

impl From<ActionData> for ActionOutcome {
    fn from(data: ActionData) -> Self {
        ActionOutcome {
            cooldown: data.cooldown.map(|c| c.expiration),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct FightReport {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub drops: Vec<ItemStack>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FightData {
    pub fight: FightReport,
    #[serde(default)]
    pub cooldown: Option<CooldownData>,
}

impl From<FightData> for FightOutcome {
    fn from(data: FightData) -> Self {
        FightOutcome {
            xp: data.fight.xp,
            gold: data.fight.gold,
            drops: data.fight.drops,
            cooldown: data.cooldown.map(|c| c.expiration),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GatherReport {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GatherData {
    pub details: GatherReport,
    #[serde(default)]
    pub cooldown: Option<CooldownData>,
}

impl From<GatherData> for GatherOutcome {
    fn from(data: GatherData) -> Self {
        GatherOutcome {
            xp: data.details.xp,
            items: data.details.items,
            cooldown: data.cooldown.map(|c| c.expiration),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LocationData {
    pub code: String,
    #[serde(default)]
    pub skin: Option<String>,
    pub x: i32,
    pub y: i32,
}

impl From<LocationData> for MapLocation {
    fn from(data: LocationData) -> Self {
        MapLocation {
            code: data.code,
            skin: data.skin,
            position: Position::new(data.x, data.y),
        }
    }
}

/// Error payload shape, used to pull a human-readable message out of a
/// non-success body.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fight_data_decodes() {
        let raw = serde_json::json!({
            "fight": { "xp": 12, "gold": 3, "drops": [{ "code": "feather", "quantity": 2 }] },
            "cooldown": { "expiration": "2026-01-01T00:00:10Z" }
        });
        let outcome: FightOutcome = serde_json::from_value::<FightData>(raw).unwrap().into();
        assert_eq!(outcome.xp, 12);
        assert_eq!(outcome.gold, 3);
        assert_eq!(outcome.drops, vec![ItemStack::new("feather", 2)]);
        assert!(outcome.cooldown.is_some());
    }

    #[test]
    fn test_action_data_tolerates_missing_cooldown() {
        let outcome: ActionOutcome = serde_json::from_value::<ActionData>(serde_json::json!({}))
            .unwrap()
            .into();
        assert!(outcome.cooldown.is_none());
    }
}
