use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use clusterdeck_api::mutation::{
    ConfigUpload, CreateGroupRequest, EditGroupRequest, EditUrisRequest, ExpelRequest,
    FailoverRequest, JoinRequest, ProbeRequest, PromoteRequest, SetDisabledRequest,
    SetElectableRequest,
};
use clusterdeck_api::{ApiError, RemoteAccess};

use crate::config::SyncConfig;
use crate::notify::Notifier;
use crate::poller::run_tick;
use crate::request::RequestStatus;
use crate::store::TopologyStore;
use crate::suggestions::SuggestionEngine;

const CLUSTER_REFETCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Probe,
    Join,
    Expel,
    CreateGroup,
    EditGroup,
    Failover,
    Promote,
    UploadConfig,
    SetDisabled,
    SetElectable,
    EditUris,
    BootstrapVshard,
    ApplyTestConfig,
}

impl MutationKind {
    /// Membership changes warrant a stats-bearing refresh; everything
    /// else settles for the cheap one.
    fn refresh_with_stats(&self) -> bool {
        matches!(
            self,
            MutationKind::Join
                | MutationKind::Expel
                | MutationKind::CreateGroup
                | MutationKind::EditGroup
                | MutationKind::BootstrapVshard
                | MutationKind::ApplyTestConfig
        )
    }
}

/// Result of a mutation submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A later submission of the same kind overtook this one; its
    /// completion was discarded for status and refresh purposes.
    Superseded,
}

#[derive(Default)]
struct KindState {
    status: RequestStatus,
    submissions: u64,
}

/// Serializes topology mutations, one lane per kind.
///
/// Submitting while the same kind is still in flight supersedes the
/// earlier submission: the earlier completion is discarded, the later
/// one drives status, notification and refresh. Different kinds do not
/// contend.
pub struct MutationCoordinator {
    store: Arc<TopologyStore>,
    remote: Arc<dyn RemoteAccess>,
    notifier: Arc<Notifier>,
    suggestions: Arc<SuggestionEngine>,
    config: SyncConfig,
    lanes: Mutex<HashMap<MutationKind, KindState>>,
    promote_inconsistency: AtomicBool,
}

impl MutationCoordinator {
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
            lanes: Mutex::new(HashMap::new()),
            promote_inconsistency: AtomicBool::new(false),
        }
    }

    pub async fn status(&self, kind: MutationKind) -> RequestStatus {
        self.lanes
            .lock()
            .await
            .get(&kind)
            .map(|s| s.status.clone())
            .unwrap_or_default()
    }

    /// Set after an ordinary promotion was rejected for replication
    /// inconsistency; the operator may retry with the force flag.
    pub fn promote_blocked_by_inconsistency(&self) -> bool {
        self.promote_inconsistency.load(Ordering::SeqCst)
    }

    pub async fn probe(&self, req: ProbeRequest) -> Result<Outcome, ApiError> {
        if req.uri.trim().is_empty() {
            let err = ApiError::validation("probe URI must not be empty");
            self.notifier.failure("Probe server", &err);
            return Err(err);
        }
        let remote = self.remote.clone();
        self.run(MutationKind::Probe, "Probe server", "Probe is OK", move || async move {
            remote.probe(req).await
        })
        .await
    }

    pub async fn join(&self, req: JoinRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::Join,
            "Join server",
            "Server joined the replica set",
            move || async move { remote.join(req).await },
        )
        .await
    }

    pub async fn expel(&self, req: ExpelRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::Expel,
            "Expel server",
            "Server expelled from the cluster",
            move || async move { remote.expel(req).await },
        )
        .await
    }

    pub async fn create_group(&self, req: CreateGroupRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::CreateGroup,
            "Create replica set",
            "Replica set created",
            move || async move { remote.create_group(req).await },
        )
        .await
    }

    pub async fn edit_group(&self, req: EditGroupRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::EditGroup,
            "Edit replica set",
            "Replica set updated",
            move || async move { remote.edit_group(req).await },
        )
        .await
    }

    /// Cluster facts are re-read afterwards so the new mode is visible
    /// without waiting for a poll cycle.
    pub async fn change_failover(&self, req: FailoverRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        let out = self
            .run(
                MutationKind::Failover,
                "Failover",
                "Failover mode updated",
                move || async move { remote.change_failover(req).await },
            )
            .await;
        if matches!(out, Ok(Outcome::Applied)) {
            self.refetch_cluster().await;
        }
        out
    }

    pub async fn promote_leader(&self, req: PromoteRequest) -> Result<Outcome, ApiError> {
        self.promote_inconsistency.store(false, Ordering::SeqCst);
        let remote = self.remote.clone();
        let result = self
            .run(
                MutationKind::Promote,
                "Failover",
                "Leader promoted",
                move || async move { remote.promote_leader(req).await },
            )
            .await;
        if let Err(err) = &result {
            if is_inconsistency_error(err) {
                info!("promotion blocked by replication inconsistency");
                self.promote_inconsistency.store(true, Ordering::SeqCst);
            }
        }
        result
    }

    pub async fn upload_config(&self, req: ConfigUpload) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::UploadConfig,
            "Upload configuration",
            "New configuration uploaded",
            move || async move { remote.upload_config(req).await },
        )
        .await
    }

    pub async fn set_disabled(&self, req: SetDisabledRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        let message = if req.disabled { "Server disabled" } else { "Server enabled" };
        self.run(
            MutationKind::SetDisabled,
            "Disable server",
            message,
            move || async move { remote.set_disabled(req).await },
        )
        .await
    }

    pub async fn set_electable(&self, req: SetElectableRequest) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        self.run(
            MutationKind::SetElectable,
            "Electable",
            "Instance electability updated",
            move || async move { remote.set_electable(req).await },
        )
        .await
    }

    pub async fn edit_uris(&self, req: EditUrisRequest) -> Result<Outcome, ApiError> {
        if req.changes.is_empty() {
            let err = ApiError::validation("no URI changes to apply");
            self.notifier.failure("Edit URIs", &err);
            return Err(err);
        }
        let remote = self.remote.clone();
        self.run(
            MutationKind::EditUris,
            "Edit URIs",
            "Advertise URIs updated",
            move || async move { remote.edit_uris(req).await },
        )
        .await
    }

    pub async fn bootstrap_vshard(&self) -> Result<Outcome, ApiError> {
        let remote = self.remote.clone();
        let out = self
            .run(
                MutationKind::BootstrapVshard,
                "Sharding",
                "VShard bootstrap is OK",
                move || async move { remote.bootstrap_vshard().await },
            )
            .await;
        if matches!(out, Ok(Outcome::Applied)) {
            self.refetch_cluster().await;
        }
        out
    }

    /// Two-step demo setup: join the serving instance as a single-node
    /// group, then load the example configuration. A failure aborts the
    /// sequence with the failed step named in the notice.
    pub async fn apply_test_config(&self, self_uri: String) -> Result<Outcome, ApiError> {
        let ticket = self.begin(MutationKind::ApplyTestConfig).await;

        let (title, result) = match self.remote.join_single_server(self_uri).await {
            Err(err) => ("Demo configuration: join server", Err(err)),
            Ok(()) => match self.remote.load_config_example().await {
                Err(err) => ("Demo configuration: load example", Err(err)),
                Ok(()) => ("Demo configuration", Ok(())),
            },
        };

        self.complete(
            MutationKind::ApplyTestConfig,
            ticket,
            title,
            "Demo configuration applied",
            result,
        )
        .await
    }

    async fn run<F, Fut>(
        &self,
        kind: MutationKind,
        title: &str,
        success_message: &str,
        op: F,
    ) -> Result<Outcome, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let ticket = self.begin(kind).await;
        let result = op().await;
        self.complete(kind, ticket, title, success_message, result).await
    }

    async fn begin(&self, kind: MutationKind) -> u64 {
        let mut lanes = self.lanes.lock().await;
        let state = lanes.entry(kind).or_default();
        state.submissions += 1;
        state.status.start();
        state.submissions
    }

    async fn complete(
        &self,
        kind: MutationKind,
        ticket: u64,
        title: &str,
        success_message: &str,
        result: Result<(), ApiError>,
    ) -> Result<Outcome, ApiError> {
        {
            let mut lanes = self.lanes.lock().await;
            let state = lanes.entry(kind).or_default();
            if state.submissions != ticket {
                debug!(?kind, "mutation superseded by a later submission");
                return Ok(Outcome::Superseded);
            }
            match &result {
                Ok(()) => state.status.succeed(),
                Err(err) => state.status.fail(err.message()),
            }
        }

        match result {
            Ok(()) => {
                info!(?kind, "mutation applied");
                self.notifier.success(title, success_message);
                run_tick(
                    &self.store,
                    self.remote.as_ref(),
                    &self.notifier,
                    &self.suggestions,
                    self.store.generation(),
                    kind.refresh_with_stats(),
                )
                .await;
                Ok(Outcome::Applied)
            }
            Err(err) => {
                warn!(?kind, error = %err, "mutation failed");
                self.notifier.failure(title, &err);
                Err(err)
            }
        }
    }

    /// Bounded re-read of cluster facts after mutations that change them.
    async fn refetch_cluster(&self) {
        let generation = self.store.generation();
        for attempt in 1..=self.config.cluster_refetch_attempts {
            match self.remote.fetch_cluster().await {
                Ok(cluster) => {
                    self.store.set_cluster(cluster, generation).await;
                    return;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "cluster refetch failed");
                    tokio::time::sleep(CLUSTER_REFETCH_DELAY).await;
                }
            }
        }
    }
}

fn is_inconsistency_error(err: &ApiError) -> bool {
    matches!(err, ApiError::Protocol { .. })
        && err.message().to_lowercase().contains("inconsisten")
}
