//! Crafting cycles: ordered, looping step sequences.

use serde::{Deserialize, Serialize};

use crate::model::Position;

/// A named crafting station with a fixed map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    Bank,
    Woodcutting,
    Mining,
    Jewelry,
    Gearcrafting,
    Weaponcrafting,
    Cooking,
    Alchemy,
}

impl Station {
    /// The fixed station table. Stations never move.
    pub fn position(self) -> Position {
        match self {
            Station::Bank => Position::new(4, 1),
            Station::Woodcutting => Position::new(-2, -3),
            Station::Mining => Position::new(1, 5),
            Station::Jewelry => Position::new(1, 3),
            Station::Gearcrafting => Position::new(3, 1),
            Station::Weaponcrafting => Position::new(2, 1),
            Station::Cooking => Position::new(1, 1),
            Station::Alchemy => Position::new(2, 3),
        }
    }
}

/// Where a `move` step goes: a named station or an explicit coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveTarget {
    Station(Station),
    Position(Position),
}

impl MoveTarget {
    pub fn position(self) -> Position {
        match self {
            MoveTarget::Station(station) => station.position(),
            MoveTarget::Position(position) => position,
        }
    }
}

/// One step of a crafting cycle.
///
/// The kind set is closed; configurations carrying any other kind are
/// rejected when they are decoded at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CraftingStep {
    /// Take materials out of the bank.
    Withdraw { item: String, quantity: u32 },
    /// Put finished output into the bank.
    Deposit { item: String, quantity: u32 },
    /// Craft at the current position; reaching the station is a prior
    /// `move` step's job.
    Craft { item: String, quantity: u32 },
    /// Walk to a station or an explicit coordinate.
    Move { target: MoveTarget },
}

/// An ordered, looping production procedure.
///
/// After the final step the cycle restarts at the first, indefinitely,
/// until the agent is stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingCycle {
    pub id: String,
    pub name: String,
    pub steps: Vec<CraftingStep>,
}
