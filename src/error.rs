//! Error types, one enum per failure domain.

use thiserror::Error;

/// Errors from the remote game API.
///
/// Every transport fault and every non-success HTTP response is normalized
/// into one of these variants; callers never see raw `reqwest` errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response (connect, timeout, TLS).
    #[error("game API request failed: {reason}")]
    RequestFailed { reason: String },

    /// The server answered with a non-success status.
    #[error("game API returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The server answered 2xx but the body did not decode.
    #[error("invalid game API response: {reason}")]
    InvalidResponse { reason: String },

    /// The API token was rejected.
    #[error("game API rejected the configured token")]
    AuthFailed,
}

/// Errors raised inside an agent's control loop.
///
/// None of these are fatal to the loop: every variant is logged, recorded
/// as the agent's `last_error`, and followed by the fixed retry delay.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The configured character is missing from the account's roster.
    #[error("Character not found")]
    CharacterNotFound,

    /// A configured monster/resource code has no known map location.
    #[error("no known location for {kind} '{code}'")]
    UnresolvedTarget { kind: &'static str, code: String },

    /// Action kind is `craft` but the config carries no crafting cycle.
    #[error("craft action configured without a crafting cycle")]
    MissingCycle,

    /// The configured crafting cycle has no steps to execute.
    #[error("crafting cycle '{name}' has no steps")]
    EmptyCycle { name: String },
}

/// Errors while assembling process configuration at startup.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
