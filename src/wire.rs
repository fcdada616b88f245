//! Wire protocol — events and commands exchanged with the booking server.
//!
//! ARCHITECTURE
//! ============
//! The push channel carries JSON envelopes of the form
//! `{"event": "<name>", "data": {...}}` in both directions. Server→client
//! events mutate the reconciliation store; client→server commands are
//! fire-and-forget booking intents. The snapshot endpoint returns a flat
//! array of `BookingRecord` rows.
//!
//! Field names are camelCase on the wire (`slotTime`, `userId`) to match the
//! authoritative server; Rust-side names stay snake_case via serde renames.

use serde::{Deserialize, Serialize};

use crate::slot::{Period, SlotId};

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// Server-originated push event. The only path through which a booking
/// intent ever becomes observable state (the "echo").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A slot gained (or changed) an owner.
    SlotUpdated {
        #[serde(rename = "slotTime")]
        slot_time: SlotId,
        #[serde(rename = "userId")]
        user_id: i64,
        username: String,
    },
    /// A slot became free. The user directory is untouched.
    SlotCleared {
        #[serde(rename = "slotTime")]
        slot_time: SlotId,
    },
    /// The server rejected a command. Surfaced to the user, never stored.
    BookingError { message: String },
}

// =============================================================================
// OUTBOUND COMMANDS
// =============================================================================

/// Client-originated booking command. At-most-once, unacknowledged beyond
/// the eventual echo; there is no correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Command {
    BookSlot {
        #[serde(rename = "slotTime")]
        slot_time: SlotId,
        /// Display hint only; slot identity stays 24-hour.
        #[serde(rename = "slotPeriod")]
        slot_period: Period,
    },
    UnbookSlot {
        #[serde(rename = "slotTime")]
        slot_time: SlotId,
    },
}

// =============================================================================
// SNAPSHOT ROWS
// =============================================================================

/// One row of the authoritative booking table as returned by `/bookings`.
///
/// `slot_time` is kept raw because the server may send either a bare `HH:MM`
/// or an absolute timestamp; the store resolves it via
/// [`SlotId::from_timestamp`] and skips rows it cannot resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(rename = "slotTime")]
    pub slot_time: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
