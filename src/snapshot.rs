//! Snapshot fetcher — the periodic full-table pull.
//!
//! DESIGN
//! ======
//! `/bookings` is fetched once at startup and then on a fixed interval for
//! the lifetime of the engine. Each successful fetch is handed to the store
//! as a full replace; that resync bounds the staleness introduced by any
//! missed or reordered push event to one poll interval.
//!
//! ERROR HANDLING
//! ==============
//! A 401 means the credential is dead: polling halts for good and the host
//! is told to redirect to login. Any other failure is a transient blip — the
//! tick is skipped and the previous view stays visible, so a network hiccup
//! never erases bookings the user can see.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::config::Config;
use crate::identity::Redirect;
use crate::store::StoreUpdate;
use crate::wire::BookingRecord;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("credential rejected")]
    Auth,
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

// =============================================================================
// FETCH
// =============================================================================

/// Fetch today's full booking table with a bearer token.
///
/// # Errors
///
/// `SnapshotError::Auth` on HTTP 401, `SnapshotError::Network` on any
/// transport, status, or decode failure.
pub async fn fetch_bookings(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
) -> Result<Vec<BookingRecord>, SnapshotError> {
    let response = client
        .get(format!("{base_url}/bookings"))
        .bearer_auth(token)
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(SnapshotError::Auth);
    }

    let records = response.error_for_status()?.json::<Vec<BookingRecord>>().await?;
    Ok(records)
}

// =============================================================================
// POLL TASK
// =============================================================================

/// Spawn the snapshot poll. Fetches immediately, then every
/// `config.poll_interval`. Returns a handle for shutdown.
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn spawn_snapshot_poll(
    config: Config,
    client: reqwest::Client,
    token: String,
    store_tx: mpsc::Sender<StoreUpdate>,
    redirects: mpsc::Sender<Redirect>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match fetch_bookings(&client, &config.http_base, &token).await {
                Ok(records) => {
                    if store_tx.send(StoreUpdate::Snapshot(records)).await.is_err() {
                        return;
                    }
                }
                Err(SnapshotError::Auth) => {
                    warn!("bookings poll rejected; halting and redirecting to login");
                    let _ = redirects.send(Redirect::Login).await;
                    return;
                }
                Err(SnapshotError::Network(e)) => {
                    // Keep the last view; the next tick will heal.
                    warn!(error = %e, "bookings poll failed; skipping tick");
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
