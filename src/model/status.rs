//! Published agent status snapshots and activity log entries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::ItemStack;

/// Cumulative crafting accounting for a `craft` agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CraftingStats {
    /// Item code -> quantity deposited as finished output.
    pub crafted: HashMap<String, u64>,
    /// Item code -> quantity of material withdrawn.
    pub consumed: HashMap<String, u64>,
    /// Successfully completed craft steps.
    pub crafts_completed: u64,
    /// Failed step attempts, counted once per attempt.
    pub crafts_failed: u64,
    /// `floor(current_step / total_steps * 100)` for the current pass.
    pub cycle_progress: u8,
}

/// Snapshot of one agent's state.
///
/// Consumers receive these as immutable values: the agent always
/// constructs a fresh snapshot for every publication and never mutates
/// one it already handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentStatus {
    pub running: bool,
    pub last_action: String,
    pub total_actions: u64,
    pub total_xp: u64,
    pub total_gold: u64,
    /// Item code -> cumulative quantity collected.
    pub items_collected: HashMap<String, u64>,
    pub hp: i32,
    pub max_hp: i32,
    pub last_error: Option<String>,
    pub crafting: Option<CraftingStats>,
}

impl AgentStatus {
    /// Fold dropped/gathered stacks into the collection map.
    pub fn record_items(&mut self, items: &[ItemStack]) {
        for stack in items {
            *self.items_collected.entry(stack.code.clone()).or_insert(0) +=
                u64::from(stack.quantity);
        }
    }
}

/// One line of the fleet activity log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub character: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Build a timestamped entry.
    pub fn new(character: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            character: character.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
