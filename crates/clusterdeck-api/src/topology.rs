use serde::{Deserialize, Serialize};

/// Health of one instance as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Healthy,
    Unreachable,
    Dead,
    Loading,
    Configuring,
    OperationError,
    ConfigError,
    Unconfigured,
}

impl InstanceStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, InstanceStatus::Healthy)
    }

    /// Ordering used for worst-of aggregation: higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            InstanceStatus::Healthy => 0,
            InstanceStatus::Unconfigured => 1,
            InstanceStatus::Loading => 2,
            InstanceStatus::Configuring => 3,
            InstanceStatus::OperationError => 4,
            InstanceStatus::ConfigError => 5,
            InstanceStatus::Unreachable => 6,
            InstanceStatus::Dead => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Healthy => "healthy",
            InstanceStatus::Unreachable => "unreachable",
            InstanceStatus::Dead => "dead",
            InstanceStatus::Loading => "loading",
            InstanceStatus::Configuring => "configuring",
            InstanceStatus::OperationError => "operation_error",
            InstanceStatus::ConfigError => "config_error",
            InstanceStatus::Unconfigured => "unconfigured",
        }
    }
}

/// Aggregate health of a replica group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Healthy,
    Unhealthy,
}

impl GroupStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, GroupStatus::Healthy)
    }

    /// Worst-of-member aggregation: a group is healthy only if every
    /// member is.
    pub fn from_members(members: &[Instance]) -> Self {
        if members.iter().all(|m| m.status.is_healthy()) {
            GroupStatus::Healthy
        } else {
            GroupStatus::Unhealthy
        }
    }
}

/// A user-assigned label. Keys are not required to be unique across
/// instances and order is preserved from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

/// Backref from an instance to the replica group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub uuid: String,
}

/// Reference to a group's configured or active leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRef {
    pub uuid: String,
}

/// One running database process in the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub uuid: String,
    pub uri: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub status: InstanceStatus,
    #[serde(default)]
    pub message: String,
    /// Present iff the instance has been joined to a replica group.
    #[serde(default)]
    pub replica_group: Option<GroupRef>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_true")]
    pub electable: bool,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

fn default_true() -> bool {
    true
}

impl Instance {
    pub fn is_configured(&self) -> bool {
        self.replica_group.is_some()
    }
}

/// Resource statistics for one instance. Ratio fields arrive as percent
/// strings, e.g. `"91.2%"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceStats {
    /// Missing for placeholder rows the backend emits for instances it
    /// could not reach; such rows must be dropped before merging.
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub quota_size: u64,
    #[serde(default)]
    pub arena_used: u64,
    #[serde(default)]
    pub arena_used_ratio: String,
    #[serde(default)]
    pub quota_used_ratio: String,
    #[serde(default)]
    pub items_used_ratio: String,
}

/// A set of instances replicating the same data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaGroup {
    pub uuid: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub status: GroupStatus,
    pub master: LeaderRef,
    pub active_master: LeaderRef,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub vshard_group: Option<String>,
    #[serde(default)]
    pub all_rw: bool,
    /// Members in fetch order.
    pub servers: Vec<Instance>,
}

/// Severity of a cluster-reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Warning,
    Critical,
}

/// A problem the cluster itself reports about one of its instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterIssue {
    pub level: IssueLevel,
    pub topic: String,
    pub message: String,
    #[serde(default)]
    pub instance_uuid: Option<String>,
    #[serde(default)]
    pub replica_group_uuid: Option<String>,
}

/// One full topology fetch. `stats` is `None` for a stats-less refresh;
/// a present-but-partial vector still replaces the stored statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyPage {
    pub instances: Vec<Instance>,
    pub replica_groups: Vec<ReplicaGroup>,
    #[serde(default)]
    pub issues: Vec<ClusterIssue>,
    #[serde(default)]
    pub stats: Option<Vec<InstanceStats>>,
}

impl TopologyPage {
    pub fn with_stats(&self) -> bool {
        self.stats.is_some()
    }
}
