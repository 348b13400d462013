//! The fleet manager: owns the set of agents, mediates configuration
//! changes (which replace the whole agent), and fans agent events out to
//! observers through the [`EventHub`].

mod events;

pub use events::{EventHub, FleetEvent};

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::agent::{Agent, AgentEvent};
use crate::api::GameApi;
use crate::error::ApiError;
use crate::model::{AgentConfig, AgentConfigPatch, AgentStatus, LogEntry};
use crate::settings::{LOG_CAP, Settings, TimingSettings};
use crate::world::WorldAtlas;

struct AgentHandle {
    agent: Arc<Agent>,
    /// Pumps this agent's events into the hub; aborted on replacement so
    /// a late event from an outgoing agent cannot clobber its successor.
    forwarder: JoinHandle<()>,
}

/// Supervisor for all agents, keyed by character name.
///
/// All mutation goes through this type's methods, invoked from the single
/// gateway control plane; configuration changes for the same character
/// must not race each other.
pub struct FleetManager {
    api: Arc<dyn GameApi>,
    atlas: Arc<WorldAtlas>,
    timing: TimingSettings,
    token: SecretString,
    hub: Arc<EventHub>,
    agents: RwLock<HashMap<String, AgentHandle>>,
    configs: RwLock<HashMap<String, AgentConfig>>,
}

impl FleetManager {
    pub fn new(api: Arc<dyn GameApi>, atlas: Arc<WorldAtlas>, settings: &Settings) -> Self {
        Self {
            api,
            atlas,
            timing: settings.timing,
            token: settings.api.token.clone(),
            hub: Arc::new(EventHub::new(LOG_CAP)),
            agents: RwLock::new(HashMap::new()),
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the default roster: one agent per account character, each
    /// with the default configuration. Returns the roster size.
    pub async fn seed_roster(&self) -> Result<usize, ApiError> {
        let characters = self.api.characters().await?;
        for character in &characters {
            let config = AgentConfig::new(character.name.clone(), self.token.clone());
            self.install_agent(config).await;
        }
        tracing::info!("Seeded fleet roster with {} agents", characters.len());
        Ok(characters.len())
    }

    /// Create an agent from `config`, wire its events into the hub, and
    /// register it. Any previous entry for the name must already be gone.
    async fn install_agent(&self, config: AgentConfig) -> Arc<Agent> {
        let name = config.character.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let agent = Arc::new(Agent::new(
            config.clone(),
            Arc::clone(&self.api),
            Arc::clone(&self.atlas),
            self.timing,
            tx,
        ));

        let hub = Arc::clone(&self.hub);
        let forwarder_name = name.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    AgentEvent::Status(status) => {
                        hub.publish_status(&forwarder_name, status).await;
                    }
                    AgentEvent::Log(message) => {
                        hub.push_log(LogEntry::new(forwarder_name.as_str(), message))
                            .await;
                    }
                }
            }
        });

        // Make the character visible to status queries immediately, not
        // only after its first published change.
        self.hub.publish_status(&name, agent.status().await).await;

        self.agents.write().await.insert(
            name.clone(),
            AgentHandle {
                agent: Arc::clone(&agent),
                forwarder,
            },
        );
        self.configs.write().await.insert(name, config);
        agent
    }

    /// Merge `patch` over the character's configuration and replace its
    /// agent. Returns the merged config, or `None` for an unknown name.
    ///
    /// The old agent is stopped before the new one exists; whatever
    /// action or crafting-cycle position it was in is lost.
    pub async fn update_config(
        &self,
        name: &str,
        patch: AgentConfigPatch,
    ) -> Option<AgentConfig> {
        let current = self.configs.read().await.get(name).cloned()?;

        let mut merged = current.merged(patch);
        // Whatever the patch said, the token is the manager's.
        merged.api_token = self.token.clone();

        self.replace_agent(merged.clone()).await;
        Some(merged)
    }

    /// Replace the character's agent with one built from the config with
    /// its crafting cycle removed. Returns false for an unknown name.
    pub async fn remove_crafting_cycle(&self, name: &str) -> bool {
        let Some(current) = self.configs.read().await.get(name).cloned() else {
            return false;
        };
        self.replace_agent(current.without_cycle()).await;
        true
    }

    async fn replace_agent(&self, config: AgentConfig) {
        let name = config.character.clone();

        let was_running = match self.agents.write().await.remove(&name) {
            Some(handle) => {
                let running = handle.agent.is_running();
                handle.agent.stop().await;
                handle.forwarder.abort();
                running
            }
            None => false,
        };

        let agent = self.install_agent(config.clone()).await;
        if was_running {
            agent.start().await;
        }
        self.hub.publish_config(&name, &config);
    }

    pub async fn start_bot(&self, name: &str) -> bool {
        let Some(agent) = self.agent(name).await else {
            return false;
        };
        agent.start().await;
        self.hub.push_log(LogEntry::new(name, "Bot started")).await;
        true
    }

    pub async fn stop_bot(&self, name: &str) -> bool {
        let Some(agent) = self.agent(name).await else {
            return false;
        };
        agent.stop().await;
        self.hub.push_log(LogEntry::new(name, "Bot stopped")).await;
        true
    }

    pub async fn start_all(&self) {
        for agent in self.all_agents().await {
            agent.start().await;
        }
        self.hub
            .push_log(LogEntry::new("fleet", "All bots started"))
            .await;
    }

    pub async fn stop_all(&self) {
        for agent in self.all_agents().await {
            agent.stop().await;
        }
        self.hub
            .push_log(LogEntry::new("fleet", "All bots stopped"))
            .await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.hub.subscribe()
    }

    pub async fn bot_status(&self, name: &str) -> Option<AgentStatus> {
        self.hub.status_of(name).await
    }

    pub async fn bots_status(&self) -> HashMap<String, AgentStatus> {
        self.hub.statuses().await
    }

    pub async fn bot_config(&self, name: &str) -> Option<AgentConfig> {
        self.configs.read().await.get(name).cloned()
    }

    pub async fn all_configs(&self) -> Vec<AgentConfig> {
        self.configs.read().await.values().cloned().collect()
    }

    pub async fn running_bots(&self) -> Vec<String> {
        self.agents
            .read()
            .await
            .iter()
            .filter(|(_, handle)| handle.agent.is_running())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub async fn running_count(&self) -> usize {
        self.running_bots().await.len()
    }

    pub async fn bot_count(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn recent_logs(&self, n: usize) -> Vec<LogEntry> {
        self.hub.recent_logs(n).await
    }

    pub async fn all_logs(&self) -> Vec<LogEntry> {
        self.hub.all_logs().await
    }

    async fn agent(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents
            .read()
            .await
            .get(name)
            .map(|handle| Arc::clone(&handle.agent))
    }

    async fn all_agents(&self) -> Vec<Arc<Agent>> {
        self.agents
            .read()
            .await
            .values()
            .map(|handle| Arc::clone(&handle.agent))
            .collect()
    }
}
