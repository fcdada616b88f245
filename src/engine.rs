//! Engine — composition root wiring the sync tasks together.
//!
//! ARCHITECTURE
//! ============
//! `Engine::start` spawns three tasks: the single-writer store, the snapshot
//! poll, and the connection supervisor. The engine owns their handles and
//! the outbound command sender; it is the explicit replacement for the
//! process-wide channel singleton of older designs. Dropping the engine (or
//! calling [`Engine::shutdown`]) aborts all three tasks at once, so neither
//! the poll timer nor the reconnect backoff can fire after teardown.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel;
use crate::config::Config;
use crate::dispatch::{BookingIntent, DispatchError, Dispatcher};
use crate::identity::{Identity, Redirect};
use crate::slot::SlotId;
use crate::snapshot;
use crate::store::{self, Notice, SlotView};

const STORE_QUEUE_CAPACITY: usize = 256;
const NOTICE_QUEUE_CAPACITY: usize = 32;
const REDIRECT_QUEUE_CAPACITY: usize = 4;

/// A running sync engine for one authenticated session.
pub struct Engine {
    dispatcher: Dispatcher,
    view: watch::Receiver<SlotView>,
    notices: mpsc::Receiver<Notice>,
    redirects: mpsc::Receiver<Redirect>,
    store_task: JoinHandle<()>,
    poll_task: JoinHandle<()>,
    channel_task: JoinHandle<()>,
}

impl Engine {
    /// Spawn the engine for the given session.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn start(config: Config, identity: &Identity) -> Self {
        let client = reqwest::Client::new();

        let (store_tx, store_rx) = mpsc::channel(STORE_QUEUE_CAPACITY);
        let (notice_tx, notices) = mpsc::channel(NOTICE_QUEUE_CAPACITY);
        let (redirect_tx, redirects) = mpsc::channel(REDIRECT_QUEUE_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(config.command_queue_capacity);

        let (view, store_task) = store::spawn_store(store_rx, notice_tx);
        let poll_task = snapshot::spawn_snapshot_poll(
            config.clone(),
            client,
            identity.token.clone(),
            store_tx.clone(),
            redirect_tx.clone(),
        );
        let channel_task = channel::spawn_channel(config, identity.token.clone(), store_tx, command_rx, redirect_tx);

        let dispatcher = Dispatcher::new(Some(identity.id), view.clone(), command_tx);

        Self { dispatcher, view, notices, redirects, store_task, poll_task, channel_task }
    }

    /// Watch receiver over the reconciled view. Clonable; hand one to each
    /// consumer that needs change notifications.
    #[must_use]
    pub fn view(&self) -> watch::Receiver<SlotView> {
        self.view.clone()
    }

    /// The most recently published view.
    #[must_use]
    pub fn latest(&self) -> SlotView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Toggle a slot through the dispatcher.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::request_toggle`].
    pub fn request_toggle(&self, slot: SlotId) -> Result<BookingIntent, DispatchError> {
        self.dispatcher.request_toggle(slot)
    }

    /// Next user-facing alert, or `None` after shutdown.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    /// Next navigation signal, or `None` after shutdown.
    pub async fn next_redirect(&mut self) -> Option<Redirect> {
        self.redirects.recv().await
    }

    /// Tear down the session: close the push channel and cancel both the
    /// poll timer and any pending reconnect backoff.
    pub fn shutdown(&self) {
        self.channel_task.abort();
        self.poll_task.abort();
        self.store_task.abort();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
