//! Character state as reported by the game API.

use serde::{Deserialize, Serialize};

/// A map coordinate. Equality decides whether a move is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One inventory slot; `code` is absent for an empty slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

/// An item code with a quantity, as carried in action results and bank
/// batch operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub code: String,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
        }
    }
}

/// A character as the game API reports it.
///
/// Never cached across an awaited action; agents re-fetch this every loop
/// iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub inventory: Vec<InventorySlot>,
}

impl Character {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Current HP as a percentage of the maximum, saturating at the edges.
    pub fn hp_percent(&self) -> u32 {
        (self.hp.max(0) as u64 * 100 / self.max_hp.max(1) as u64) as u32
    }

    /// Total quantity carried across all inventory slots.
    pub fn inventory_total(&self) -> u32 {
        self.inventory.iter().map(|slot| slot.quantity).sum()
    }

    /// The occupied slots as item stacks, ready for a bank batch.
    pub fn carried_stacks(&self) -> Vec<ItemStack> {
        self.inventory
            .iter()
            .filter(|slot| slot.quantity > 0)
            .filter_map(|slot| {
                slot.code
                    .as_ref()
                    .map(|code| ItemStack::new(code.clone(), slot.quantity))
            })
            .collect()
    }
}
