//! Fleet-wide event hub: aggregated statuses, the bounded activity log,
//! and broadcast re-publication to observers.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};

use crate::model::{AgentConfig, AgentStatus, LogEntry};

/// Buffered broadcast capacity; slow observers miss events rather than
/// ever blocking an agent loop.
const EVENT_BUFFER: usize = 256;

/// A manager-level event, re-tagged with the character it concerns.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetEvent {
    Status {
        character: String,
        status: AgentStatus,
    },
    Log {
        entry: LogEntry,
    },
    Config {
        character: String,
        config: AgentConfig,
    },
}

/// Aggregation point for everything the agents publish.
///
/// Emission is fire-and-forget: with no subscribers the send result is
/// ignored, and a lagging subscriber misses events instead of exerting
/// backpressure.
pub struct EventHub {
    tx: broadcast::Sender<FleetEvent>,
    statuses: RwLock<HashMap<String, AgentStatus>>,
    log: RwLock<VecDeque<LogEntry>>,
    log_cap: usize,
}

impl EventHub {
    pub fn new(log_cap: usize) -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            tx,
            statuses: RwLock::new(HashMap::new()),
            log: RwLock::new(VecDeque::new()),
            log_cap,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.tx.subscribe()
    }

    /// Record the latest snapshot for a character and re-broadcast it.
    pub async fn publish_status(&self, character: &str, status: AgentStatus) {
        self.statuses
            .write()
            .await
            .insert(character.to_string(), status.clone());
        let _ = self.tx.send(FleetEvent::Status {
            character: character.to_string(),
            status,
        });
    }

    /// Insert at the front (most recent first), evicting beyond the cap.
    pub async fn push_log(&self, entry: LogEntry) {
        {
            let mut log = self.log.write().await;
            log.push_front(entry.clone());
            log.truncate(self.log_cap);
        }
        let _ = self.tx.send(FleetEvent::Log { entry });
    }

    pub fn publish_config(&self, character: &str, config: &AgentConfig) {
        let _ = self.tx.send(FleetEvent::Config {
            character: character.to_string(),
            config: config.clone(),
        });
    }

    pub async fn status_of(&self, character: &str) -> Option<AgentStatus> {
        self.statuses.read().await.get(character).cloned()
    }

    pub async fn statuses(&self) -> HashMap<String, AgentStatus> {
        self.statuses.read().await.clone()
    }

    /// The `n` most recent entries.
    pub async fn recent_logs(&self, n: usize) -> Vec<LogEntry> {
        self.log.read().await.iter().take(n).cloned().collect()
    }

    /// Defensive copy of the whole log, never the live sequence.
    pub async fn all_logs(&self) -> Vec<LogEntry> {
        self.log.read().await.iter().cloned().collect()
    }
}
