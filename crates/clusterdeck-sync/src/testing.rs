//! Scriptable in-process remote plus shared fixtures for module tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use clusterdeck_api::cluster::ClusterInfo;
use clusterdeck_api::mutation::{
    ConfigUpload, CreateGroupRequest, DisableServersRequest, EditGroupRequest, EditUrisRequest,
    ExpelRequest, FailoverRequest, ForceApplyRequest, JoinRequest, ProbeRequest, PromoteRequest,
    RestartReplicationRequest, SetDisabledRequest, SetElectableRequest,
};
use clusterdeck_api::suggestions::SuggestionsPage;
use clusterdeck_api::topology::{InstanceStats, TopologyPage};
use clusterdeck_api::{ApiError, RemoteAccess};

/// Fake remote endpoint. Fetch responses are set up front; mutations
/// succeed unless a failure is armed for the operation name. Every call
/// is recorded as a short label so tests can assert order and count.
pub struct FakeRemote {
    topology: Mutex<TopologyPage>,
    topology_error: Mutex<Option<ApiError>>,
    stats: Mutex<Vec<InstanceStats>>,
    cluster: Mutex<ClusterInfo>,
    cluster_error: Mutex<Option<ApiError>>,
    suggestions: Mutex<SuggestionsPage>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
    promotions: Mutex<Vec<PromoteRequest>>,
    disables: Mutex<Vec<SetDisabledRequest>>,
    uri_edits: Mutex<Vec<EditUrisRequest>>,
    force_applies: Mutex<Vec<ForceApplyRequest>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            topology: Mutex::new(TopologyPage::default()),
            topology_error: Mutex::new(None),
            stats: Mutex::new(Vec::new()),
            cluster: Mutex::new(ClusterInfo::default()),
            cluster_error: Mutex::new(None),
            suggestions: Mutex::new(SuggestionsPage::default()),
            failures: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            promotions: Mutex::new(Vec::new()),
            disables: Mutex::new(Vec::new()),
            uri_edits: Mutex::new(Vec::new()),
            force_applies: Mutex::new(Vec::new()),
        }
    }

    pub fn set_topology(&self, page: TopologyPage) {
        *self.topology.lock().unwrap() = page;
        *self.topology_error.lock().unwrap() = None;
    }

    pub fn fail_topology(&self, err: ApiError) {
        *self.topology_error.lock().unwrap() = Some(err);
    }

    pub fn set_stats(&self, rows: Vec<InstanceStats>) {
        *self.stats.lock().unwrap() = rows;
    }

    pub fn set_cluster(&self, cluster: ClusterInfo) {
        *self.cluster.lock().unwrap() = cluster;
        *self.cluster_error.lock().unwrap() = None;
    }

    pub fn fail_cluster(&self, err: ApiError) {
        *self.cluster_error.lock().unwrap() = Some(err);
    }

    pub fn set_suggestions(&self, page: SuggestionsPage) {
        *self.suggestions.lock().unwrap() = page;
    }

    /// Arms a persistent failure for one operation, by the labels used
    /// in [`FakeRemote::calls`] (e.g. `"promote_leader"`).
    pub fn fail_op(&self, op: &'static str, err: ApiError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    /// Makes every mutation sleep before completing, for interleaving
    /// concurrent submissions.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn clear_delay(&self) {
        *self.delay.lock().unwrap() = None;
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn promotions(&self) -> Vec<PromoteRequest> {
        self.promotions.lock().unwrap().clone()
    }

    pub fn disables(&self) -> Vec<SetDisabledRequest> {
        self.disables.lock().unwrap().clone()
    }

    pub fn uri_edits(&self) -> Vec<EditUrisRequest> {
        self.uri_edits.lock().unwrap().clone()
    }

    pub fn force_applies(&self) -> Vec<ForceApplyRequest> {
        self.force_applies.lock().unwrap().clone()
    }

    fn record(&self, label: impl Into<String>) {
        self.calls.lock().unwrap().push(label.into());
    }

    async fn mutation(&self, op: &'static str) -> Result<(), ApiError> {
        self.maybe_delay().await;
        self.record(op);
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteAccess for FakeRemote {
    async fn fetch_topology(&self, with_stats: bool) -> Result<TopologyPage, ApiError> {
        self.record(format!("fetch_topology(stats={with_stats})"));
        if let Some(err) = self.topology_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut page = self.topology.lock().unwrap().clone();
        if !with_stats {
            page.stats = None;
        }
        Ok(page)
    }

    async fn fetch_stats(&self) -> Result<Vec<InstanceStats>, ApiError> {
        self.record("fetch_stats");
        if let Some(err) = self.failures.lock().unwrap().get("fetch_stats") {
            return Err(err.clone());
        }
        Ok(self.stats.lock().unwrap().clone())
    }

    async fn fetch_cluster(&self) -> Result<ClusterInfo, ApiError> {
        self.record("fetch_cluster");
        if let Some(err) = self.cluster_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.cluster.lock().unwrap().clone())
    }

    async fn fetch_suggestions(&self) -> Result<SuggestionsPage, ApiError> {
        self.record("fetch_suggestions");
        if let Some(err) = self.failures.lock().unwrap().get("fetch_suggestions") {
            return Err(err.clone());
        }
        Ok(self.suggestions.lock().unwrap().clone())
    }

    async fn probe(&self, req: ProbeRequest) -> Result<(), ApiError> {
        self.maybe_delay().await;
        self.record(format!("probe({})", req.uri));
        match self.failures.lock().unwrap().get("probe") {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn join(&self, _req: JoinRequest) -> Result<(), ApiError> {
        self.mutation("join").await
    }

    async fn expel(&self, _req: ExpelRequest) -> Result<(), ApiError> {
        self.mutation("expel").await
    }

    async fn create_group(&self, _req: CreateGroupRequest) -> Result<(), ApiError> {
        self.mutation("create_group").await
    }

    async fn edit_group(&self, _req: EditGroupRequest) -> Result<(), ApiError> {
        self.mutation("edit_group").await
    }

    async fn change_failover(&self, _req: FailoverRequest) -> Result<(), ApiError> {
        self.mutation("change_failover").await
    }

    async fn promote_leader(&self, req: PromoteRequest) -> Result<(), ApiError> {
        self.promotions.lock().unwrap().push(req);
        self.mutation("promote_leader").await
    }

    async fn upload_config(&self, _req: ConfigUpload) -> Result<(), ApiError> {
        self.mutation("upload_config").await
    }

    async fn force_apply(&self, req: ForceApplyRequest) -> Result<(), ApiError> {
        self.force_applies.lock().unwrap().push(req);
        self.mutation("force_apply").await
    }

    async fn restart_replication(&self, _req: RestartReplicationRequest) -> Result<(), ApiError> {
        self.mutation("restart_replication").await
    }

    async fn disable_servers(&self, _req: DisableServersRequest) -> Result<(), ApiError> {
        self.mutation("disable_servers").await
    }

    async fn set_disabled(&self, req: SetDisabledRequest) -> Result<(), ApiError> {
        self.disables.lock().unwrap().push(req);
        self.mutation("set_disabled").await
    }

    async fn set_electable(&self, _req: SetElectableRequest) -> Result<(), ApiError> {
        self.mutation("set_electable").await
    }

    async fn edit_uris(&self, req: EditUrisRequest) -> Result<(), ApiError> {
        self.uri_edits.lock().unwrap().push(req);
        self.mutation("edit_uris").await
    }

    async fn bootstrap_vshard(&self) -> Result<(), ApiError> {
        self.mutation("bootstrap_vshard").await
    }

    async fn join_single_server(&self, uri: String) -> Result<(), ApiError> {
        self.maybe_delay().await;
        self.record(format!("join_single_server({uri})"));
        match self.failures.lock().unwrap().get("join_single_server") {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn load_config_example(&self) -> Result<(), ApiError> {
        self.mutation("load_config_example").await
    }
}

pub mod fixtures {
    use clusterdeck_api::cluster::{ClusterInfo, ClusterSelf, KnownRole, VshardGroup};
    use clusterdeck_api::suggestions::{
        ForceApplySuggestion, InstanceRef, RefineUriSuggestion, SuggestionsPage,
    };
    use clusterdeck_api::topology::{
        GroupRef, GroupStatus, Instance, InstanceStats, InstanceStatus, LeaderRef, ReplicaGroup,
        TopologyPage,
    };

    pub fn instance(uuid: &str, uri: &str, alias: &str, group: Option<&str>) -> Instance {
        Instance {
            uuid: uuid.to_string(),
            uri: uri.to_string(),
            alias: Some(alias.to_string()),
            status: InstanceStatus::Healthy,
            message: String::new(),
            replica_group: group.map(|g| GroupRef { uuid: g.to_string() }),
            disabled: false,
            electable: true,
            zone: None,
            labels: Vec::new(),
        }
    }

    pub fn group(uuid: &str, alias: &str, roles: &[&str], servers: Vec<Instance>) -> ReplicaGroup {
        let leader = servers
            .first()
            .map(|s| s.uuid.clone())
            .unwrap_or_default();
        ReplicaGroup {
            uuid: uuid.to_string(),
            alias: alias.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            status: GroupStatus::from_members(&servers),
            master: LeaderRef { uuid: leader.clone() },
            active_master: LeaderRef { uuid: leader },
            weight: None,
            vshard_group: None,
            all_rw: false,
            servers,
        }
    }

    pub fn stats_row(uuid: &str) -> InstanceStats {
        InstanceStats {
            uuid: Some(uuid.to_string()),
            quota_size: 268_435_456,
            arena_used: 134_217_728,
            arena_used_ratio: "50.0%".to_string(),
            quota_used_ratio: "50.0%".to_string(),
            items_used_ratio: "50.0%".to_string(),
        }
    }

    /// Three instances in two groups: one router, two storages. All
    /// healthy, all with a stats row.
    pub fn page_with_stats() -> TopologyPage {
        let router = instance("uuid-router-1", "router-1:3301", "router-1", Some("g-router"));
        let storage_1 =
            instance("uuid-storage-1", "storage-1:3301", "storage-1", Some("g-storage"));
        let storage_2 =
            instance("uuid-storage-2", "storage-2:3301", "storage-2", Some("g-storage"));
        TopologyPage {
            instances: vec![router.clone(), storage_1.clone(), storage_2.clone()],
            replica_groups: vec![
                group("g-router", "router", &["vshard-router"], vec![router]),
                group(
                    "g-storage",
                    "storage",
                    &["vshard-storage"],
                    vec![storage_1, storage_2],
                ),
            ],
            issues: Vec::new(),
            stats: Some(vec![
                stats_row("uuid-router-1"),
                stats_row("uuid-storage-1"),
                stats_row("uuid-storage-2"),
            ]),
        }
    }

    pub fn known_roles() -> Vec<KnownRole> {
        vec![
            KnownRole {
                name: "vshard-router".to_string(),
                implies_router: true,
                implies_storage: false,
                dependencies: Vec::new(),
            },
            KnownRole {
                name: "vshard-storage".to_string(),
                implies_router: false,
                implies_storage: true,
                dependencies: Vec::new(),
            },
            KnownRole {
                name: "app.roles.custom".to_string(),
                implies_router: false,
                implies_storage: false,
                dependencies: Vec::new(),
            },
        ]
    }

    pub fn cluster_configured() -> ClusterInfo {
        ClusterInfo {
            self_identity: ClusterSelf {
                uri: "router-1:3301".to_string(),
                uuid: Some("uuid-router-1".to_string()),
                app_name: Some("myapp".to_string()),
                instance_name: Some("router-1".to_string()),
            },
            known_roles: known_roles(),
            vshard_groups: vec![VshardGroup {
                name: "default".to_string(),
                bucket_count: 30000,
                bootstrapped: false,
            }],
            failover_params: None,
        }
    }

    pub fn cluster_unconfigured() -> ClusterInfo {
        ClusterInfo {
            self_identity: ClusterSelf {
                uri: "localhost:3301".to_string(),
                uuid: None,
                app_name: Some("myapp".to_string()),
                instance_name: None,
            },
            known_roles: known_roles(),
            vshard_groups: Vec::new(),
            failover_params: None,
        }
    }

    pub fn suggestions_with_uri_drift() -> SuggestionsPage {
        SuggestionsPage {
            refine_uri: vec![
                RefineUriSuggestion {
                    uuid: "uuid-storage-1".to_string(),
                    uri_old: "storage-1:3301".to_string(),
                    uri_new: "storage-1.internal:3301".to_string(),
                },
                RefineUriSuggestion {
                    uuid: "uuid-storage-2".to_string(),
                    uri_old: "storage-2:3301".to_string(),
                    uri_new: "storage-2.internal:3301".to_string(),
                },
            ],
            ..SuggestionsPage::default()
        }
    }

    pub fn suggestions_with_force_apply() -> SuggestionsPage {
        SuggestionsPage {
            force_apply: vec![
                ForceApplySuggestion {
                    uuid: "uuid-storage-1".to_string(),
                    config_locked: true,
                    config_mismatch: false,
                    operation_error: false,
                },
                ForceApplySuggestion {
                    uuid: "uuid-storage-2".to_string(),
                    config_locked: false,
                    config_mismatch: false,
                    operation_error: true,
                },
            ],
            ..SuggestionsPage::default()
        }
    }

    pub fn suggestions_with_restart() -> SuggestionsPage {
        SuggestionsPage {
            restart_replication: vec![InstanceRef {
                uuid: "uuid-storage-2".to_string(),
            }],
            ..SuggestionsPage::default()
        }
    }
}
