//! ironfleet automates a fleet of independently-controlled game
//! characters against a remote, cooldown-gated game API.
//!
//! Each character gets one [`agent::Agent`] running a sequential control
//! loop (fight, gather, or a multi-step crafting cycle), pacing itself by
//! the server-reported cooldowns. The [`fleet::FleetManager`] owns the
//! agents, replaces them wholesale on configuration changes, and fans
//! their status/log events out to observers via the [`gateway`].

pub mod agent;
pub mod api;
pub mod error;
pub mod fleet;
pub mod gateway;
pub mod model;
pub mod settings;
pub mod world;

pub use agent::{Agent, AgentEvent};
pub use api::{GameApi, HttpGameClient};
pub use error::{AgentError, ApiError, SettingsError};
pub use fleet::{FleetEvent, FleetManager};
pub use settings::Settings;
pub use world::WorldAtlas;
