//! Recording mock of the game API for agent and fleet tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::error::ApiError;
use crate::model::{Character, Position};

use super::{ActionOutcome, FightOutcome, GameApi, GatherOutcome, MapLocation};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Characters,
    Move { name: String, position: Position },
    Gather { name: String },
    Fight { name: String },
    Rest { name: String },
    Deposit { name: String, item: String, quantity: u32 },
    Withdraw { name: String, item: String, quantity: u32 },
    Craft { name: String, item: String, quantity: u32 },
}

#[derive(Debug, Clone)]
pub(crate) struct TimedCall {
    pub call: Call,
    pub at: Instant,
}

/// A `GameApi` that answers from configured fixtures and records every
/// call with its (tokio) timestamp.
pub(crate) struct MockGameApi {
    characters: Mutex<Vec<Character>>,
    /// When set, every action response carries `now + this many seconds`
    /// as its cooldown expiration.
    cooldown_secs: Mutex<Option<i64>>,
    fight_outcome: Mutex<FightOutcome>,
    gather_outcome: Mutex<GatherOutcome>,
    monsters: Mutex<Vec<MapLocation>>,
    resources: Mutex<Vec<MapLocation>>,
    craft_fails: AtomicBool,
    calls: Mutex<Vec<TimedCall>>,
}

impl MockGameApi {
    pub fn new() -> Self {
        Self {
            characters: Mutex::new(Vec::new()),
            cooldown_secs: Mutex::new(None),
            fight_outcome: Mutex::new(FightOutcome::default()),
            gather_outcome: Mutex::new(GatherOutcome::default()),
            monsters: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
            craft_fails: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_characters(&self, characters: Vec<Character>) {
        *self.characters.lock().unwrap() = characters;
    }

    pub fn set_cooldown_secs(&self, secs: Option<i64>) {
        *self.cooldown_secs.lock().unwrap() = secs;
    }

    pub fn set_fight_outcome(&self, outcome: FightOutcome) {
        *self.fight_outcome.lock().unwrap() = outcome;
    }

    pub fn set_gather_outcome(&self, outcome: GatherOutcome) {
        *self.gather_outcome.lock().unwrap() = outcome;
    }

    pub fn set_monsters(&self, monsters: Vec<MapLocation>) {
        *self.monsters.lock().unwrap() = monsters;
    }

    pub fn set_resources(&self, resources: Vec<MapLocation>) {
        *self.resources.lock().unwrap() = resources;
    }

    pub fn set_craft_fails(&self, fails: bool) {
        self.craft_fails.store(fails, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<TimedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(TimedCall {
            call,
            at: Instant::now(),
        });
    }

    fn next_cooldown(&self) -> Option<DateTime<Utc>> {
        self.cooldown_secs
            .lock()
            .unwrap()
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
    }

    fn action_outcome(&self) -> ActionOutcome {
        ActionOutcome {
            cooldown: self.next_cooldown(),
        }
    }
}

#[async_trait]
impl GameApi for MockGameApi {
    async fn characters(&self) -> Result<Vec<Character>, ApiError> {
        self.record(Call::Characters);
        Ok(self.characters.lock().unwrap().clone())
    }

    async fn move_to(&self, name: &str, position: Position) -> Result<ActionOutcome, ApiError> {
        self.record(Call::Move {
            name: name.to_string(),
            position,
        });
        Ok(self.action_outcome())
    }

    async fn gather(&self, name: &str) -> Result<GatherOutcome, ApiError> {
        self.record(Call::Gather {
            name: name.to_string(),
        });
        let mut outcome = self.gather_outcome.lock().unwrap().clone();
        outcome.cooldown = self.next_cooldown();
        Ok(outcome)
    }

    async fn fight(&self, name: &str) -> Result<FightOutcome, ApiError> {
        self.record(Call::Fight {
            name: name.to_string(),
        });
        let mut outcome = self.fight_outcome.lock().unwrap().clone();
        outcome.cooldown = self.next_cooldown();
        Ok(outcome)
    }

    async fn rest(&self, name: &str) -> Result<ActionOutcome, ApiError> {
        self.record(Call::Rest {
            name: name.to_string(),
        });
        Ok(self.action_outcome())
    }

    async fn deposit(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        self.record(Call::Deposit {
            name: name.to_string(),
            item: item.to_string(),
            quantity,
        });
        Ok(self.action_outcome())
    }

    async fn withdraw(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        self.record(Call::Withdraw {
            name: name.to_string(),
            item: item.to_string(),
            quantity,
        });
        Ok(self.action_outcome())
    }

    async fn craft(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        self.record(Call::Craft {
            name: name.to_string(),
            item: item.to_string(),
            quantity,
        });
        if self.craft_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                code: 486,
                message: "missing materials".to_string(),
            });
        }
        Ok(self.action_outcome())
    }

    async fn monster_locations(&self) -> Result<Vec<MapLocation>, ApiError> {
        Ok(self.monsters.lock().unwrap().clone())
    }

    async fn resource_locations(&self) -> Result<Vec<MapLocation>, ApiError> {
        Ok(self.resources.lock().unwrap().clone())
    }
}
