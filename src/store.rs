//! Reconciliation store — the single source of truth for slot ownership.
//!
//! ARCHITECTURE
//! ============
//! Two independent channels write here: the periodic snapshot poll (full
//! replace) and the push event stream (targeted upsert/delete). Both feed
//! one mpsc queue consumed by a single writer task, so every mutation is
//! applied sequentially in arrival order and no locks are needed. After each
//! applied update the task publishes a fresh [`SlotView`] on a watch channel
//! for readers (dispatcher, UI).
//!
//! DESIGN
//! ======
//! No speculative writes from user intent ever land here — booking intents
//! become visible only via the server echo. That removes any need for
//! version vectors: snapshot-replace and event-upsert/delete are each
//! idempotent, and last-applied-wins is sufficient. A racing poll can
//! briefly resurrect a just-cleared slot; the next resync heals it within
//! one poll interval.

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::channel::ConnectionState;
use crate::slot::SlotId;
use crate::wire::{BookingRecord, ServerEvent};

// =============================================================================
// TYPES
// =============================================================================

/// One unit of work for the store writer. Processed strictly in arrival
/// order; within one channel this preserves that channel's event order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreUpdate {
    /// Full authoritative booking table from the snapshot endpoint.
    Snapshot(Vec<BookingRecord>),
    /// One incremental push event.
    Event(ServerEvent),
    /// Connection status change reported by the supervisor.
    Connection(ConnectionState),
}

/// User-facing alert emitted by the store. Carries no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The server rejected a booking command.
    BookingRejected { message: String },
}

/// Published read model. Cheap to clone; readers get a consistent snapshot
/// of ownership, the display-name directory, and connection status.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    /// Slot → owning user. Absent key means the slot is free.
    pub ownership: HashMap<SlotId, i64>,
    /// User → display name. Append-only within a session.
    pub directory: HashMap<i64, String>,
    pub connection: ConnectionState,
}

impl Default for SlotView {
    fn default() -> Self {
        Self {
            ownership: HashMap::new(),
            directory: HashMap::new(),
            connection: ConnectionState::Connecting,
        }
    }
}

// =============================================================================
// SLOT TABLE
// =============================================================================

/// The mutable state behind the store task. Kept separate from the task so
/// reconciliation logic is plain, synchronous, and unit-testable.
#[derive(Debug, Default)]
pub struct SlotTable {
    ownership: HashMap<SlotId, i64>,
    directory: HashMap<i64, String>,
    connection: ConnectionState,
}

impl SlotTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update. Returns a notice when the update is purely
    /// user-facing (server-side booking rejection).
    pub fn apply(&mut self, update: StoreUpdate) -> Option<Notice> {
        match update {
            StoreUpdate::Snapshot(records) => {
                self.apply_snapshot(&records);
                None
            }
            StoreUpdate::Event(event) => self.apply_event(event),
            StoreUpdate::Connection(state) => {
                self.connection = state;
                None
            }
        }
    }

    /// Full replace of ownership; additive merge into the directory. This is
    /// the self-healing resync that bounds divergence from missed or
    /// reordered push events to one poll interval.
    fn apply_snapshot(&mut self, records: &[BookingRecord]) {
        let mut ownership = HashMap::with_capacity(records.len());
        for record in records {
            match SlotId::from_timestamp(&record.slot_time) {
                Ok(slot) => {
                    ownership.insert(slot, record.user_id);
                    self.directory
                        .insert(record.user_id, record.username.clone());
                }
                Err(e) => {
                    warn!(slot_time = %record.slot_time, error = %e, "skipping unresolvable snapshot row");
                }
            }
        }
        self.ownership = ownership;
    }

    fn apply_event(&mut self, event: ServerEvent) -> Option<Notice> {
        match event {
            ServerEvent::SlotUpdated { slot_time, user_id, username } => {
                self.ownership.insert(slot_time, user_id);
                // Directory entries are created on the fly for users first
                // seen through a push event.
                self.directory.insert(user_id, username);
                None
            }
            ServerEvent::SlotCleared { slot_time } => {
                self.ownership.remove(&slot_time);
                None
            }
            ServerEvent::BookingError { message } => Some(Notice::BookingRejected { message }),
        }
    }

    #[must_use]
    pub fn view(&self) -> SlotView {
        SlotView {
            ownership: self.ownership.clone(),
            directory: self.directory.clone(),
            connection: self.connection,
        }
    }
}

// =============================================================================
// WRITER TASK
// =============================================================================

/// Spawn the single-writer store task. Returns the view receiver and the
/// task handle. The task ends when every update sender is dropped.
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn spawn_store(
    mut updates: mpsc::Receiver<StoreUpdate>,
    notices: mpsc::Sender<Notice>,
) -> (watch::Receiver<SlotView>, JoinHandle<()>) {
    let (view_tx, view_rx) = watch::channel(SlotView::default());

    let handle = tokio::spawn(async move {
        let mut table = SlotTable::new();
        while let Some(update) = updates.recv().await {
            if let Some(notice) = table.apply(update) {
                // Best-effort: a slow consumer must not stall reconciliation.
                if notices.try_send(notice).is_err() {
                    warn!("notice queue full or closed; dropping booking alert");
                }
            }
            view_tx.send_replace(table.view());
        }
    });

    (view_rx, handle)
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
