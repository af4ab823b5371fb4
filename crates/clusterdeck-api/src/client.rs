use async_trait::async_trait;

use crate::cluster::ClusterInfo;
use crate::error::ApiError;
use crate::mutation::{
    ConfigUpload, CreateGroupRequest, DisableServersRequest, EditGroupRequest, EditUrisRequest,
    ExpelRequest, FailoverRequest, ForceApplyRequest, JoinRequest, ProbeRequest, PromoteRequest,
    RestartReplicationRequest, SetDisabledRequest, SetElectableRequest,
};
use crate::suggestions::SuggestionsPage;
use crate::topology::{InstanceStats, TopologyPage};

/// Remote admin endpoint of the cluster.
///
/// Implementations wrap whatever wire protocol the deployment speaks; the
/// synchronization core is written entirely against this trait. Every method
/// maps to a single remote round trip and classifies failures as
/// [`ApiError`].
#[async_trait]
pub trait RemoteAccess: Send + Sync {
    /// Full topology snapshot. When `with_stats` is set the response also
    /// carries per-instance capacity statistics.
    async fn fetch_topology(&self, with_stats: bool) -> Result<TopologyPage, ApiError>;

    /// Statistics only, for filling gaps without re-fetching topology.
    async fn fetch_stats(&self) -> Result<Vec<InstanceStats>, ApiError>;

    /// Cluster-wide identity, known roles, vshard groups and failover params.
    async fn fetch_cluster(&self) -> Result<ClusterInfo, ApiError>;

    /// Server-computed repair suggestions.
    async fn fetch_suggestions(&self) -> Result<SuggestionsPage, ApiError>;

    async fn probe(&self, req: ProbeRequest) -> Result<(), ApiError>;

    async fn join(&self, req: JoinRequest) -> Result<(), ApiError>;

    async fn expel(&self, req: ExpelRequest) -> Result<(), ApiError>;

    async fn create_group(&self, req: CreateGroupRequest) -> Result<(), ApiError>;

    async fn edit_group(&self, req: EditGroupRequest) -> Result<(), ApiError>;

    async fn change_failover(&self, req: FailoverRequest) -> Result<(), ApiError>;

    async fn promote_leader(&self, req: PromoteRequest) -> Result<(), ApiError>;

    async fn upload_config(&self, req: ConfigUpload) -> Result<(), ApiError>;

    async fn force_apply(&self, req: ForceApplyRequest) -> Result<(), ApiError>;

    async fn restart_replication(&self, req: RestartReplicationRequest) -> Result<(), ApiError>;

    async fn disable_servers(&self, req: DisableServersRequest) -> Result<(), ApiError>;

    /// Toggle a single instance in or out of the disabled set.
    async fn set_disabled(&self, req: SetDisabledRequest) -> Result<(), ApiError>;

    async fn set_electable(&self, req: SetElectableRequest) -> Result<(), ApiError>;

    /// Batch URI rewrite, one entry per instance whose advertise URI drifted.
    async fn edit_uris(&self, req: EditUrisRequest) -> Result<(), ApiError>;

    async fn bootstrap_vshard(&self) -> Result<(), ApiError>;

    /// First half of the demo-config shortcut: join the current instance as
    /// a single-node group.
    async fn join_single_server(&self, uri: String) -> Result<(), ApiError>;

    /// Second half of the demo-config shortcut.
    async fn load_config_example(&self) -> Result<(), ApiError>;
}
