//! Booking intent dispatcher — user clicks become validated commands.
//!
//! DESIGN
//! ======
//! A toggle is validated against the current view before anything touches
//! the network: the caller must be identified, the channel connected, and
//! the slot not owned by someone else. A request certain to be rejected
//! server-side is never sent.
//!
//! Dispatch is fire-and-forget. The local view is never mutated here — the
//! slot changes only when the server echoes `slot-updated`/`slot-cleared` —
//! so a dropped or duplicated command is harmless: the user perceives no
//! change and may click again.

use tokio::sync::{mpsc, watch};

use crate::channel::ConnectionState;
use crate::slot::SlotId;
use crate::store::SlotView;
use crate::wire::Command;

/// Display-name fallback for an owner missing from the directory.
const UNKNOWN_OWNER: &str = "Someone";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("user identity is not known; log in again")]
    Identity,
    #[error("connection is not ready; wait or log in again")]
    NotReady,
    #[error("slot already booked by {owner}")]
    AlreadyBooked { owner: String },
}

/// The derived half of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    Book,
    Unbook,
}

/// Transient record of what a toggle resolved to. Exists only for the
/// duration of dispatch; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingIntent {
    pub slot: SlotId,
    pub action: SlotAction,
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Gate between user clicks and the push channel. Reads the store view and
/// the connection state; writes nothing but outbound commands.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    user_id: Option<i64>,
    view: watch::Receiver<SlotView>,
    commands: mpsc::Sender<Command>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(user_id: Option<i64>, view: watch::Receiver<SlotView>, commands: mpsc::Sender<Command>) -> Self {
        Self { user_id, view, commands }
    }

    /// Toggle a slot: book it if free, unbook it if owned by the caller.
    ///
    /// # Errors
    ///
    /// `Identity` when the caller's user id is unknown, `NotReady` when the
    /// channel is not connected (the intent is dropped, not queued), and
    /// `AlreadyBooked` when another user owns the slot. No command is sent
    /// on any error path.
    pub fn request_toggle(&self, slot: SlotId) -> Result<BookingIntent, DispatchError> {
        let Some(user_id) = self.user_id else {
            return Err(DispatchError::Identity);
        };

        let action = {
            let view = self.view.borrow();
            if view.connection != ConnectionState::Connected {
                return Err(DispatchError::NotReady);
            }
            match view.ownership.get(&slot) {
                Some(&owner) if owner != user_id => {
                    let owner = view
                        .directory
                        .get(&owner)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_OWNER.to_owned());
                    return Err(DispatchError::AlreadyBooked { owner });
                }
                Some(_) => SlotAction::Unbook,
                None => SlotAction::Book,
            }
        };

        let command = match action {
            SlotAction::Book => Command::BookSlot { slot_time: slot, slot_period: slot.period() },
            SlotAction::Unbook => Command::UnbookSlot { slot_time: slot },
        };

        // Non-blocking: a full or closed queue means the connection is not
        // usable right now, and the intent is dropped rather than queued.
        self.commands
            .try_send(command)
            .map_err(|_| DispatchError::NotReady)?;

        Ok(BookingIntent { slot, action })
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
