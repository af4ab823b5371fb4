use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use clusterdeck_api::{ApiError, RemoteAccess};

use crate::config::SyncConfig;
use crate::coordinator::MutationCoordinator;
use crate::notify::{NoticeEvent, Notifier};
use crate::poller::{run_tick, Poller};
use crate::request::RequestStatus;
use crate::selectors;
use crate::store::{Snapshot, TopologyStore};
use crate::suggestions::SuggestionEngine;

/// One admin-console page session against one cluster.
///
/// Owns the store, the poller, the suggestion engine and the mutation
/// coordinator, all wired to a single [`RemoteAccess`] endpoint. Nothing
/// is global: two sessions against different clusters do not share
/// state. The returned receiver yields user-facing notices.
pub struct ClusterSession {
    store: Arc<TopologyStore>,
    remote: Arc<dyn RemoteAccess>,
    notifier: Arc<Notifier>,
    suggestions: Arc<SuggestionEngine>,
    poller: Poller,
    mutations: MutationCoordinator,
}

impl ClusterSession {
    pub fn new(
        remote: Arc<dyn RemoteAccess>,
        config: SyncConfig,
    ) -> (Self, mpsc::UnboundedReceiver<NoticeEvent>) {
        let store = Arc::new(TopologyStore::new());
        let (notifier, notices) = Notifier::new(config.success_notice_timeout());
        let notifier = Arc::new(notifier);
        let suggestions = Arc::new(SuggestionEngine::new());

        let poller = Poller::new(
            store.clone(),
            remote.clone(),
            notifier.clone(),
            suggestions.clone(),
            config.clone(),
        );
        let mutations = MutationCoordinator::new(
            store.clone(),
            remote.clone(),
            notifier.clone(),
            suggestions.clone(),
            config,
        );

        (
            Self {
                store,
                remote,
                notifier,
                suggestions,
                poller,
                mutations,
            },
            notices,
        )
    }

    /// Initial load; polling starts only after it succeeds.
    pub async fn mount(&self) -> Result<(), ApiError> {
        match self.store.load_initial(self.remote.as_ref()).await {
            Ok(()) => {
                self.notifier.request_succeeded();
                if let Err(err) = self.suggestions.refresh(self.remote.as_ref()).await {
                    tracing::warn!(error = %err, "initial suggestions fetch failed");
                }
                self.poller.start().await;
                info!("session mounted");
                Ok(())
            }
            Err(err) => {
                self.notifier.failure("Cluster", &err);
                Err(err)
            }
        }
    }

    /// Tears the session down: stops polling, invalidates in-flight
    /// fetches and drops all derived state.
    pub async fn close(&self) {
        self.poller.stop().await;
        self.store.clear().await;
        self.suggestions.reset().await;
        info!("session closed");
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot().await
    }

    pub async fn topology_status(&self) -> RequestStatus {
        self.store.topology_status().await
    }

    pub async fn cluster_status(&self) -> RequestStatus {
        self.store.cluster_status().await
    }

    pub async fn is_polling(&self) -> bool {
        self.poller.is_running().await
    }

    pub fn forced_logout(&self) -> bool {
        self.notifier.forced_logout()
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    pub async fn can_bootstrap_vshard(&self) -> bool {
        let snapshot = self.snapshot().await;
        selectors::can_bootstrap_vshard(&snapshot)
    }

    /// Demo-config shortcut, joining the serving instance first.
    pub async fn apply_test_config(&self) -> Result<(), ApiError> {
        let self_uri = self
            .snapshot()
            .await
            .cluster
            .as_ref()
            .map(|c| c.self_identity.uri.clone())
            .ok_or_else(|| ApiError::validation("cluster identity is not loaded yet"))?;
        self.mutations.apply_test_config(self_uri).await.map(|_| ())
    }

    pub async fn apply_refine_uri(&self) -> Result<(), ApiError> {
        let result = self.suggestions.apply_refine_uri(self.remote.as_ref()).await;
        self.after_suggestion_apply("Advertise URI", "Replica set URIs updated", &result)
            .await;
        result
    }

    pub async fn apply_force_apply(&self) -> Result<(), ApiError> {
        let result = self.suggestions.apply_force_apply(self.remote.as_ref()).await;
        self.after_suggestion_apply("Force apply", "Configuration applied", &result)
            .await;
        result
    }

    pub async fn apply_restart_replication(&self) -> Result<(), ApiError> {
        let result = self
            .suggestions
            .apply_restart_replication(self.remote.as_ref())
            .await;
        self.after_suggestion_apply("Restart replication", "Replication restarted", &result)
            .await;
        result
    }

    pub async fn apply_disable_servers(&self) -> Result<(), ApiError> {
        let result = self
            .suggestions
            .apply_disable_servers(self.remote.as_ref())
            .await;
        self.after_suggestion_apply("Disable servers", "Servers disabled", &result)
            .await;
        result
    }

    /// Successful suggestion applies behave like any other mutation:
    /// a notice plus an immediate refresh.
    async fn after_suggestion_apply(
        &self,
        title: &str,
        success_message: &str,
        result: &Result<(), ApiError>,
    ) {
        match result {
            Ok(()) => {
                self.notifier.success(title, success_message);
                run_tick(
                    &self.store,
                    self.remote.as_ref(),
                    &self.notifier,
                    &self.suggestions,
                    self.store.generation(),
                    false,
                )
                .await;
            }
            Err(err) => self.notifier.failure(title, err),
        }
    }
}
