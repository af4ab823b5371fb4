use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use clusterdeck_api::RemoteAccess;

use crate::config::SyncConfig;
use crate::notify::Notifier;
use crate::store::TopologyStore;
use crate::suggestions::SuggestionEngine;

/// Periodic topology refresh.
///
/// Ticks run on a fixed interval. Most ticks fetch topology without
/// statistics; every Nth tick (per config) carries them. A tick that
/// leaves a grouped instance without a stats row triggers one out-of-band
/// statistics fetch to fill the gap. Tick failures are recorded and the
/// loop keeps going; the store's last good snapshot stays readable.
///
/// `stop` aborts the timer task and bumps the store generation, so a
/// fetch already in flight is discarded when it lands.
pub struct Poller {
    store: Arc<TopologyStore>,
    remote: Arc<dyn RemoteAccess>,
    notifier: Arc<Notifier>,
    suggestions: Arc<SuggestionEngine>,
    config: SyncConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(
        store: Arc<TopologyStore>,
        remote: Arc<dyn RemoteAccess>,
        notifier: Arc<Notifier>,
        suggestions: Arc<SuggestionEngine>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            notifier,
            suggestions,
            config,
            task: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }

    /// Starts ticking. A restart resets the tick counter, so the first
    /// stats-bearing refresh is again N ticks away.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("poller already running");
            return;
        }

        let store = self.store.clone();
        let remote = self.remote.clone();
        let notifier = self.notifier.clone();
        let suggestions = self.suggestions.clone();
        let config = self.config.clone();
        let generation = store.generation();

        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.refresh_interval());
            // The first tick of `interval` fires immediately; the page
            // already did its initial load, so skip it.
            interval.tick().await;
            let mut counter: u64 = 0;
            loop {
                interval.tick().await;
                counter += 1;
                let with_stats =
                    config.stat_request_period != 0 && counter % config.stat_request_period == 0;
                run_tick(
                    &store,
                    remote.as_ref(),
                    &notifier,
                    &suggestions,
                    generation,
                    with_stats,
                )
                .await;
            }
        }));
    }

    /// Aborts the timer and invalidates whatever is still in flight.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            self.store.bump_generation();
            debug!("poller stopped");
        }
    }
}

/// One refresh cycle. Public within the crate so mutation flows can
/// reuse it for their post-success refresh.
pub(crate) async fn run_tick(
    store: &TopologyStore,
    remote: &dyn RemoteAccess,
    notifier: &Notifier,
    suggestions: &SuggestionEngine,
    generation: u64,
    with_stats: bool,
) {
    store.mark_refresh_started().await;
    match remote.fetch_topology(with_stats).await {
        Ok(page) => {
            if !store.apply_page(page, generation).await {
                return;
            }
            store.mark_refresh_succeeded().await;
            notifier.request_succeeded();

            // A stats-less page can leave freshly joined instances
            // without a row; fill the gap without waiting N ticks.
            if !with_stats && !store.snapshot().await.missing_stats_uuids().is_empty() {
                match remote.fetch_stats().await {
                    Ok(rows) => {
                        store.apply_stats(rows, generation).await;
                    }
                    Err(err) => warn!(error = %err, "gap-fill stats fetch failed"),
                }
            }

            if let Err(err) = suggestions.refresh(remote).await {
                warn!(error = %err, "suggestions refresh failed");
                suggestions.clear_lists().await;
            }
        }
        Err(err) => {
            store.record_refresh_failure(&err).await;
            notifier.failure("Refresh", &err);
            suggestions.clear_lists().await;
        }
    }
}
