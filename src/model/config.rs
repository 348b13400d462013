//! Per-agent configuration.
//!
//! An `AgentConfig` is immutable for the lifetime of one agent instance.
//! Changing any field means building a merged config and replacing the
//! whole agent; there is no in-place mutation.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::model::CraftingCycle;

/// A monster or resource target: content code plus optional skin variant
/// disambiguating multiple spawn instances of the same code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelector {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<String>,
}

impl TargetSelector {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            skin: None,
        }
    }

    pub fn with_skin(mut self, skin: impl Into<String>) -> Self {
        self.skin = Some(skin.into());
        self
    }
}

/// What an agent does each loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fight,
    Gather,
    Craft,
}

impl ActionKind {
    /// HP percentage below which the agent rests before acting.
    ///
    /// Crafting happens at fixed stations, not in the field, so it carries
    /// no HP risk and no rest check.
    pub fn rest_threshold(self) -> Option<u32> {
        match self {
            ActionKind::Fight => Some(crate::settings::FIGHT_REST_THRESHOLD),
            ActionKind::Gather => Some(crate::settings::GATHER_REST_THRESHOLD),
            ActionKind::Craft => None,
        }
    }
}

/// Configuration for one agent, immutable while that agent lives.
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub character: String,
    pub action: ActionKind,
    /// Fight target; absent means fight on the current tile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monster: Option<TargetSelector>,
    /// Gather target; absent means gather on the current tile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<TargetSelector>,
    /// Required when `action` is `craft`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CraftingCycle>,
    /// Account API token. Never serialized; the manager forces its own
    /// token over anything a patch supplies.
    #[serde(skip_serializing)]
    pub api_token: SecretString,
}

impl AgentConfig {
    /// The default roster entry: fight on the current tile.
    pub fn new(character: impl Into<String>, api_token: SecretString) -> Self {
        Self {
            character: character.into(),
            action: ActionKind::Fight,
            monster: None,
            resource: None,
            cycle: None,
            api_token,
        }
    }

    /// Apply a patch: supplied fields override, absent fields keep the
    /// current value. The caller is responsible for forcing the token
    /// afterwards.
    pub fn merged(&self, patch: AgentConfigPatch) -> AgentConfig {
        AgentConfig {
            character: self.character.clone(),
            action: patch.action.unwrap_or(self.action),
            monster: patch.monster.or_else(|| self.monster.clone()),
            resource: patch.resource.or_else(|| self.resource.clone()),
            cycle: patch.cycle.or_else(|| self.cycle.clone()),
            api_token: patch
                .api_token
                .map(SecretString::from)
                .unwrap_or_else(|| self.api_token.clone()),
        }
    }

    /// The same config with the crafting cycle removed.
    pub fn without_cycle(&self) -> AgentConfig {
        AgentConfig {
            cycle: None,
            ..self.clone()
        }
    }
}

/// Partial configuration override, as received from the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfigPatch {
    #[serde(default)]
    pub action: Option<ActionKind>,
    #[serde(default)]
    pub monster: Option<TargetSelector>,
    #[serde(default)]
    pub resource: Option<TargetSelector>,
    #[serde(default)]
    pub cycle: Option<CraftingCycle>,
    #[serde(default)]
    pub api_token: Option<String>,
}
