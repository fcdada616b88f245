//! LabSlot — client-side synchronization engine for competitive booking of
//! fixed 30-minute lab slots.
//!
//! ARCHITECTURE
//! ============
//! Two independent channels feed one reconciled view:
//!
//! - a periodic full-snapshot pull (`snapshot`) that replaces slot ownership
//!   wholesale and heals any drift, and
//! - a persistent push stream (`channel`) delivering incremental
//!   booked/cleared/error events.
//!
//! Both write into the single-writer `store`; `dispatch` turns user clicks
//! into validated fire-and-forget commands gated by store and connection
//! state; `engine` wires it all together for one authenticated session.
//!
//! Local state is never mutated optimistically: a booking intent becomes
//! visible only through the server's echo, which keeps reconciliation down
//! to idempotent replace/upsert/delete with last-applied-wins.

pub mod access;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod identity;
pub mod slot;
pub mod snapshot;
pub mod store;
pub mod wire;

pub use access::{SlotAccess, check_slot_access};
pub use channel::ConnectionState;
pub use config::Config;
pub use dispatch::{BookingIntent, DispatchError, Dispatcher, SlotAction};
pub use engine::Engine;
pub use identity::{Identity, Redirect};
pub use slot::{Period, SlotError, SlotId};
pub use snapshot::{SnapshotError, fetch_bookings};
pub use store::{Notice, SlotView};
pub use wire::{BookingRecord, Command, ServerEvent};
