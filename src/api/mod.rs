//! Game API access.
//!
//! `GameApi` is the request/response contract the agents consume; the
//! production implementation is [`HttpGameClient`]. Keeping the contract
//! behind a trait lets tests drive agents against a recording mock.

mod client;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpGameClient;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::model::{Character, ItemStack, Position};

/// Outcome of an action that only carries a cooldown (move, rest, bank,
/// craft).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Absolute expiration of the server-imposed cooldown, if any.
    pub cooldown: Option<DateTime<Utc>>,
}

/// Outcome of a fight action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FightOutcome {
    pub xp: u64,
    pub gold: u64,
    pub drops: Vec<ItemStack>,
    pub cooldown: Option<DateTime<Utc>>,
}

/// Outcome of a gather action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatherOutcome {
    pub xp: u64,
    pub items: Vec<ItemStack>,
    pub cooldown: Option<DateTime<Utc>>,
}

/// One monster spawn or resource node on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLocation {
    pub code: String,
    pub skin: Option<String>,
    pub position: Position,
}

/// The remote game API, one operation per game action.
///
/// Implementations normalize every transport fault and non-success
/// response into a single [`ApiError`].
#[async_trait]
pub trait GameApi: Send + Sync {
    /// List the account's characters with their current state.
    async fn characters(&self) -> Result<Vec<Character>, ApiError>;

    /// Move a character to a map coordinate.
    async fn move_to(&self, name: &str, position: Position) -> Result<ActionOutcome, ApiError>;

    /// Gather at the character's current position.
    async fn gather(&self, name: &str) -> Result<GatherOutcome, ApiError>;

    /// Fight at the character's current position.
    async fn fight(&self, name: &str) -> Result<FightOutcome, ApiError>;

    /// Rest until the server decides the character has recovered.
    async fn rest(&self, name: &str) -> Result<ActionOutcome, ApiError>;

    /// Deposit one item stack into the bank.
    async fn deposit(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError>;

    /// Withdraw one item stack from the bank.
    async fn withdraw(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError>;

    /// Craft an item at the current position.
    async fn craft(&self, name: &str, item: &str, quantity: u32)
    -> Result<ActionOutcome, ApiError>;

    /// All monster spawn locations, for the atlas bulk load.
    async fn monster_locations(&self) -> Result<Vec<MapLocation>, ApiError>;

    /// All resource node locations, for the atlas bulk load.
    async fn resource_locations(&self) -> Result<Vec<MapLocation>, ApiError>;

    /// Deposit every stack, sleeping `spacing` between successive calls.
    ///
    /// The bank enforces a rate limit finer than the cooldown mechanism;
    /// the fixed spacing respects it. Returns the last call's cooldown.
    async fn deposit_all(
        &self,
        name: &str,
        stacks: &[ItemStack],
        spacing: Duration,
    ) -> Result<Option<DateTime<Utc>>, ApiError> {
        let mut last = None;
        for (i, stack) in stacks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(spacing).await;
            }
            last = self.deposit(name, &stack.code, stack.quantity).await?.cooldown;
        }
        Ok(last)
    }

    /// Withdraw every stack, sleeping `spacing` between successive calls.
    async fn withdraw_all(
        &self,
        name: &str,
        stacks: &[ItemStack],
        spacing: Duration,
    ) -> Result<Option<DateTime<Utc>>, ApiError> {
        let mut last = None;
        for (i, stack) in stacks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(spacing).await;
            }
            last = self
                .withdraw(name, &stack.code, stack.quantity)
                .await?
                .cooldown;
        }
        Ok(last)
    }
}
