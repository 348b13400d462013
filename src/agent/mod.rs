//! The per-character automation agent.
//!
//! One agent owns one character's behavior: a single uninterruptible
//! control loop that fetches fresh character state, applies the rest and
//! banking policies, and dispatches to the configured action strategy.
//! The loop is self-healing: every error is logged, delayed, and
//! retried; only `stop()` ends it.

mod crafting;

pub(crate) use crafting::CycleRunner;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};

use crate::api::GameApi;
use crate::error::AgentError;
use crate::model::{
    ActionKind, AgentConfig, AgentStatus, Character, CraftingStats, Position, Station,
};
use crate::settings::{INVENTORY_THRESHOLD, TimingSettings};
use crate::world::WorldAtlas;

/// Fire-and-forget notifications from an agent to its manager.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A fresh status snapshot. Never mutated after publication.
    Status(AgentStatus),
    /// A raw log message; the manager stamps it into a `LogEntry`.
    Log(String),
}

/// One character's automation unit.
pub struct Agent {
    config: AgentConfig,
    api: Arc<dyn GameApi>,
    atlas: Arc<WorldAtlas>,
    timing: TimingSettings,
    running: AtomicBool,
    status: RwLock<AgentStatus>,
    events: mpsc::UnboundedSender<AgentEvent>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        api: Arc<dyn GameApi>,
        atlas: Arc<WorldAtlas>,
        timing: TimingSettings,
        events: mpsc::UnboundedSender<AgentEvent>,
    ) -> Self {
        let status = AgentStatus {
            crafting: matches!(config.action, ActionKind::Craft).then(CraftingStats::default),
            ..AgentStatus::default()
        };

        Self {
            config,
            api,
            atlas,
            timing,
            running: AtomicBool::new(false),
            status: RwLock::new(status),
            events,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current status snapshot.
    pub async fn status(&self) -> AgentStatus {
        self.status.read().await.clone()
    }

    /// Begin the control loop on its own task. Idempotent: a second call
    /// while running is a no-op.
    pub async fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.publish(|s| {
            s.running = true;
            s.last_error = None;
        })
        .await;

        tokio::spawn(async move {
            tracing::info!("Agent loop started for {}", self.config.character);
            self.run().await;
            tracing::info!("Agent loop stopped for {}", self.config.character);
        });
    }

    /// Ask the loop to exit at its next boundary. In-flight actions are
    /// allowed to complete; the remote API has no cancel operation.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.publish(|s| s.running = false).await;
    }

    async fn run(&self) {
        let mut cycle = self.config.cycle.clone().map(CycleRunner::new);

        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.tick(&mut cycle).await {
                self.log(e.to_string());
                self.publish(|s| s.last_error = Some(e.to_string())).await;
                tokio::time::sleep(self.timing.error_retry).await;
            }
        }
    }

    /// One loop iteration. Extracted so tests can drive the loop
    /// deterministically.
    pub(crate) async fn tick(&self, cycle: &mut Option<CycleRunner>) -> Result<(), AgentError> {
        let character = self.fetch_character().await?;

        self.publish(|s| {
            s.hp = character.hp;
            s.max_hp = character.max_hp;
        })
        .await;

        self.apply_rest_policy(&character).await?;

        match self.config.action {
            ActionKind::Fight => self.fight_tick(&character).await,
            ActionKind::Gather => self.gather_tick(&character).await,
            ActionKind::Craft => {
                let runner = cycle.as_mut().ok_or(AgentError::MissingCycle)?;
                runner.step(self, &character).await
            }
        }
    }

    async fn fetch_character(&self) -> Result<Character, AgentError> {
        let characters = self.api.characters().await?;
        characters
            .into_iter()
            .find(|c| c.name == self.config.character)
            .ok_or(AgentError::CharacterNotFound)
    }

    /// Rest below the action kind's HP threshold, waiting out the rest
    /// cooldown before proceeding in the same iteration.
    async fn apply_rest_policy(&self, character: &Character) -> Result<(), AgentError> {
        let Some(threshold) = self.config.action.rest_threshold() else {
            return Ok(());
        };
        if character.hp_percent() >= threshold {
            return Ok(());
        }

        let outcome = self.api.rest(&self.config.character).await?;
        self.log(format!("Resting at {}% HP", character.hp_percent()));
        self.publish(|s| s.last_action = "Rested".to_string()).await;
        self.wait_cooldown(outcome.cooldown).await;
        Ok(())
    }

    async fn fight_tick(&self, character: &Character) -> Result<(), AgentError> {
        if character.inventory_total() >= INVENTORY_THRESHOLD {
            return self.bank_inventory(character).await;
        }

        if let Some(target) = &self.config.monster {
            let position = self
                .atlas
                .monster(&target.code, target.skin.as_deref())
                .ok_or_else(|| AgentError::UnresolvedTarget {
                    kind: "monster",
                    code: target.code.clone(),
                })?;
            self.move_if_needed(character, position).await?;
        }

        let outcome = self.api.fight(&self.config.character).await?;
        self.log(format!(
            "Fought: +{} xp, +{} gold, {} drops",
            outcome.xp,
            outcome.gold,
            outcome.drops.len()
        ));
        self.publish(|s| {
            s.total_actions += 1;
            s.total_xp += outcome.xp;
            s.total_gold += outcome.gold;
            s.record_items(&outcome.drops);
            s.last_action = "Fought".to_string();
            s.last_error = None;
        })
        .await;
        self.wait_cooldown(outcome.cooldown).await;
        Ok(())
    }

    async fn gather_tick(&self, character: &Character) -> Result<(), AgentError> {
        if character.inventory_total() >= INVENTORY_THRESHOLD {
            return self.bank_inventory(character).await;
        }

        if let Some(target) = &self.config.resource {
            let position = self
                .atlas
                .resource(&target.code, target.skin.as_deref())
                .ok_or_else(|| AgentError::UnresolvedTarget {
                    kind: "resource",
                    code: target.code.clone(),
                })?;
            self.move_if_needed(character, position).await?;
        }

        let outcome = self.api.gather(&self.config.character).await?;
        self.log(format!(
            "Gathered: +{} xp, {} stacks",
            outcome.xp,
            outcome.items.len()
        ));
        self.publish(|s| {
            s.total_actions += 1;
            s.total_xp += outcome.xp;
            s.record_items(&outcome.items);
            s.last_action = "Gathered".to_string();
            s.last_error = None;
        })
        .await;
        self.wait_cooldown(outcome.cooldown).await;
        Ok(())
    }

    /// Move to the bank and deposit the whole inventory, spacing the
    /// batch calls by the configured bank delay.
    pub(crate) async fn bank_inventory(&self, character: &Character) -> Result<(), AgentError> {
        self.move_if_needed(character, Station::Bank.position())
            .await?;

        let stacks = character.carried_stacks();
        let cooldown = self
            .api
            .deposit_all(
                &self.config.character,
                &stacks,
                self.timing.bank_batch_spacing,
            )
            .await?;

        self.log(format!(
            "Deposited full inventory ({} stacks)",
            stacks.len()
        ));
        self.publish(|s| s.last_action = "Banked inventory".to_string())
            .await;
        self.wait_cooldown(cooldown).await;
        Ok(())
    }

    /// Move unless already on the target tile; a same-tile move is a
    /// no-op the remote API would reject.
    pub(crate) async fn move_if_needed(
        &self,
        character: &Character,
        position: Position,
    ) -> Result<(), AgentError> {
        if character.position() == position {
            return Ok(());
        }
        let outcome = self.api.move_to(&self.config.character, position).await?;
        self.wait_cooldown(outcome.cooldown).await;
        Ok(())
    }

    /// Block until the cooldown expiration plus the safety margin has
    /// elapsed. Plain timed sleep, no busy wait.
    pub(crate) async fn wait_cooldown(&self, expiration: Option<DateTime<Utc>>) {
        let Some(expiration) = expiration else {
            return;
        };
        let wait = cooldown_wait(expiration, Utc::now(), self.timing.cooldown_margin);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Replace the status snapshot with a freshly constructed copy and
    /// publish it. Previously published snapshots are never touched.
    pub(crate) async fn publish<F: FnOnce(&mut AgentStatus)>(&self, update: F) {
        let mut status = self.status.read().await.clone();
        update(&mut status);
        *self.status.write().await = status.clone();
        let _ = self.events.send(AgentEvent::Status(status));
    }

    pub(crate) fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("[{}] {}", self.config.character, message);
        let _ = self.events.send(AgentEvent::Log(message));
    }
}

/// Remaining wait for a cooldown expiration: zero once expired, otherwise
/// the remaining time plus the safety margin.
fn cooldown_wait(expiration: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> Duration {
    match (expiration - now).to_std() {
        Ok(remaining) => remaining + margin,
        Err(_) => Duration::ZERO,
    }
}
