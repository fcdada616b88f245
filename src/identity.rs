//! Session identity — the externally persisted `{id, username, token}` blob.
//!
//! The host owns persistence (browser storage originally); the engine only
//! reads the numeric user id and the bearer token. Logout is the host
//! clearing the blob and dropping the engine.

use serde::{Deserialize, Serialize};

/// Identity loaded at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub token: String,
}

impl Identity {
    /// Parse the externally persisted session blob.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Navigation signal for the host. Emitted when a credential is rejected;
/// the engine never navigates itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
}
