//! Process configuration from environment variables.
//!
//! All tunables are policy constants, not derived from any measured signal.
//! The defaults live here as named constants so the control-flow code never
//! hard-codes a number; each delay can be overridden via its environment
//! variable without touching any loop logic.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::SettingsError;

/// Safety margin added on top of every server-reported cooldown, absorbing
/// clock skew between this process and the game server.
pub const DEFAULT_COOLDOWN_MARGIN_MS: u64 = 500;

/// Fixed delay before an agent retries after any loop error.
pub const DEFAULT_ERROR_RETRY_MS: u64 = 5_000;

/// Fixed spacing between successive deposit/withdraw calls inside one bank
/// batch. The bank has a finer-grained rate limit that is not expressed as
/// a cooldown in the response.
pub const DEFAULT_BANK_BATCH_SPACING_MS: u64 = 3_500;

/// Total carried quantity at which an agent interrupts its work to bank the
/// whole inventory.
pub const INVENTORY_THRESHOLD: u32 = 100;

/// HP percentage below which a fighting agent rests first.
pub const FIGHT_REST_THRESHOLD: u32 = 50;

/// HP percentage below which a gathering agent rests first.
pub const GATHER_REST_THRESHOLD: u32 = 30;

/// Maximum number of retained activity log entries.
pub const LOG_CAP: usize = 1_000;

/// Where the gateway listens when `GATEWAY_ADDR` is unset.
pub const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:8088";

/// Connection to the remote game API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL of the game API, e.g. `https://api.example-game.com`.
    pub base_url: String,
    /// Account API token, sent as a bearer credential on every request.
    pub token: SecretString,
}

/// The fixed delays governing every agent's pacing.
#[derive(Debug, Clone, Copy)]
pub struct TimingSettings {
    pub cooldown_margin: Duration,
    pub error_retry: Duration,
    pub bank_batch_spacing: Duration,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            cooldown_margin: Duration::from_millis(DEFAULT_COOLDOWN_MARGIN_MS),
            error_retry: Duration::from_millis(DEFAULT_ERROR_RETRY_MS),
            bank_batch_spacing: Duration::from_millis(DEFAULT_BANK_BATCH_SPACING_MS),
        }
    }
}

/// Full process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub gateway_addr: SocketAddr,
    pub timing: TimingSettings,
}

impl Settings {
    /// Assemble settings from the environment.
    ///
    /// `GAME_API_URL` and `GAME_API_TOKEN` are required; everything else
    /// falls back to the defaults above.
    pub fn from_env() -> Result<Self, SettingsError> {
        let base_url = require_var("GAME_API_URL")?;
        let token = SecretString::from(require_var("GAME_API_TOKEN")?);

        let gateway_addr = optional_var("GATEWAY_ADDR")
            .unwrap_or_else(|| DEFAULT_GATEWAY_ADDR.to_string())
            .parse()
            .map_err(|e| SettingsError::Invalid {
                name: "GATEWAY_ADDR",
                reason: format!("{e}"),
            })?;

        let timing = TimingSettings {
            cooldown_margin: millis_var("COOLDOWN_MARGIN_MS", DEFAULT_COOLDOWN_MARGIN_MS)?,
            error_retry: millis_var("ERROR_RETRY_MS", DEFAULT_ERROR_RETRY_MS)?,
            bank_batch_spacing: millis_var(
                "BANK_BATCH_SPACING_MS",
                DEFAULT_BANK_BATCH_SPACING_MS,
            )?,
        };

        Ok(Self {
            api: ApiSettings { base_url, token },
            gateway_addr,
            timing,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, SettingsError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::MissingVar { name }),
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn millis_var(name: &'static str, default: u64) -> Result<Duration, SettingsError> {
    match optional_var(name) {
        None => Ok(Duration::from_millis(default)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| SettingsError::Invalid {
                name,
                reason: format!("{e}"),
            }),
    }
}
