//! Access gate — does the user hold a currently active slot?
//!
//! Consumed by the restricted-access feature (remote bench control) that
//! sits next to the booking view. Shares the engine's identity and error
//! taxonomy but none of its sync machinery.

use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotError;

/// Result of the access-gate check. `slot_start`/`slot_end` are present only
/// while access is granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAccess {
    pub access: bool,
    #[serde(default)]
    pub slot_start: Option<String>,
    #[serde(default)]
    pub slot_end: Option<String>,
}

impl SlotAccess {
    fn denied() -> Self {
        Self { access: false, slot_start: None, slot_end: None }
    }
}

/// Ask the server whether the user's booked slot is active right now.
///
/// The server signals "no active slot" with HTTP 403, which is a normal
/// denied outcome here, not an error.
///
/// # Errors
///
/// `SnapshotError::Auth` on HTTP 401, `SnapshotError::Network` on any other
/// failure.
pub async fn check_slot_access(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
) -> Result<SlotAccess, SnapshotError> {
    let response = client
        .get(format!("{base_url}/check-slot-access"))
        .bearer_auth(token)
        .send()
        .await?;

    match response.status() {
        reqwest::StatusCode::UNAUTHORIZED => Err(SnapshotError::Auth),
        reqwest::StatusCode::FORBIDDEN => Ok(SlotAccess::denied()),
        _ => Ok(response.error_for_status()?.json::<SlotAccess>().await?),
    }
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
