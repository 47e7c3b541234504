//! Expiration Sweeper Task
//!
//! Background task that periodically removes expired cache items.

use std::sync::Weak;
use std::thread;
use std::time::Duration;

use tokio::runtime;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use crate::cache::Store;
use crate::error::{CacheError, Result};

/// Handle to a running sweeper. Stopping it is one-shot.
///
/// The sweep loop always runs on its own thread hosting a current-thread
/// runtime, so it keeps running whatever the caller's executor does.
pub(crate) struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: thread::JoinHandle<()>,
}

impl Sweeper {
    /// Spawns a sweeper that runs one sweep pass on `store` every `interval`.
    ///
    /// Returns `None` if the thread could not be started, in which case
    /// expired items are only removed by explicit purges.
    pub(crate) fn spawn<V>(store: Weak<Store<V>>, interval: Duration) -> Option<Self>
    where
        V: Clone + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let spawned = thread::Builder::new()
            .name("memcache-sweeper".to_string())
            .spawn(move || {
                match runtime::Builder::new_current_thread().enable_time().build() {
                    Ok(rt) => rt.block_on(run_sweeper(store, interval, shutdown_rx)),
                    Err(e) => error!("Failed to build sweeper runtime: {}", e),
                }
            });

        match spawned {
            Ok(handle) => Some(Self {
                shutdown_tx,
                handle,
            }),
            Err(e) => {
                error!("Failed to spawn sweeper thread: {}", e);
                None
            }
        }
    }

    /// Signals the sweep loop to stop and waits for its thread to exit.
    ///
    /// A sweep pass already in progress completes first.
    pub(crate) fn shutdown(self) -> Result<()> {
        // The loop may already be gone; joining covers that case.
        let _ = self.shutdown_tx.send(true);
        self.handle.join().map_err(|_| CacheError::SweeperPanicked)
    }
}

/// Sweep loop: waits one interval, then sweeps once per tick until signalled
/// or until the store has been dropped.
async fn run_sweeper<V>(
    store: Weak<Store<V>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    V: Clone + Send + Sync + 'static,
{
    info!("Starting expiration sweeper with interval of {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    break;
                };

                let removed = store.purge_expired();
                if removed > 0 {
                    debug!("Sweep: removed {} expired items", removed);
                } else {
                    trace!("Sweep: no expired items found");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Expiration sweeper stopped");
}
