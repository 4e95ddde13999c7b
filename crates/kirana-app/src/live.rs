//! # Live Query Subscriptions
//!
//! The push-based query abstraction behind the reactive product and bill
//! lists.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Live Query Pipeline                             │
//! │                                                                     │
//! │  service mutation ──► EventBus.emit(ProductsChanged)               │
//! │                            │ (tokio broadcast)                      │
//! │                            ▼                                        │
//! │  ┌──────────────────────────────────────────────┐                  │
//! │  │ LiveQuery refresher task                     │                  │
//! │  │   on matching event: re-run the query,       │                  │
//! │  │   publish a fresh immutable snapshot         │                  │
//! │  └──────────────────┬───────────────────────────┘                  │
//! │                     │ (tokio watch)                                 │
//! │                     ▼                                               │
//! │  Subscription::snapshot() / changed().await                        │
//! │                                                                     │
//! │  Cancellation: Subscription::cancel() drops the receiver;          │
//! │  dropping the LiveQuery aborts the refresher task.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers always receive a complete snapshot, never a diff: the store
//! serializes writes, the refresher re-reads, and the watch channel keeps
//! only the latest value for late or slow readers.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::AppError;

// =============================================================================
// Store Events
// =============================================================================

/// Coarse-grained change notifications emitted by the services after every
/// successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Something in the product catalog changed.
    ProductsChanged,
    /// A bill was created, deleted, or voided.
    BillsChanged,
}

/// Broadcast bus shared by the services and every live query.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        EventBus { tx }
    }

    /// Publishes an event. Having no listeners is fine.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }

    /// A new receiver seeing every event emitted from now on.
    pub fn listen(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Live Query
// =============================================================================

/// The stored query: re-run on every matching event.
pub type QueryFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, AppError>> + Send + Sync>;

/// A long-lived, push-updated query over the store.
///
/// Holds the latest snapshot and a background refresher task. Dropping the
/// `LiveQuery` aborts the task, which ends every outstanding subscription.
#[derive(Debug)]
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + Sync + 'static> LiveQuery<T> {
    /// Runs `query` once for the initial snapshot, then spawns the refresher
    /// listening for `interest` events on `bus`.
    pub(crate) async fn spawn(
        bus: &EventBus,
        interest: StoreEvent,
        query: QueryFn<T>,
    ) -> Result<Self, AppError> {
        // Subscribe before the initial read so no event emitted between the
        // read and the task startup is missed.
        let mut events = bus.listen();
        let initial = (query)().await?;
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                let refresh = match events.recv().await {
                    Ok(event) => event == interest,
                    // Missed events: the snapshot may be stale, refresh.
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                };

                if !refresh {
                    continue;
                }

                match (query)().await {
                    Ok(snapshot) => {
                        if tx.send(snapshot).is_err() {
                            // Every receiver is gone; stop refreshing.
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "Live query refresh failed"),
                }
            }
        });

        Ok(LiveQuery { rx, task })
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> T {
        self.rx.borrow().clone()
    }

    /// A new subscription onto this query.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.rx.clone(),
        }
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A handle onto a live query's stream of snapshots.
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// The latest snapshot.
    pub fn snapshot(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next snapshot. Returns `false` when the owning query
    /// has been dropped and no further updates will arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Explicitly ends this subscription.
    pub fn cancel(self) {}
}

// =============================================================================
// Unit Tests
// =============================================================================
