use serde::{Deserialize, Serialize};

/// Identity of the instance serving the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSelf {
    pub uri: String,
    /// `None` until this instance has been joined to the cluster.
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub instance_name: Option<String>,
}

impl ClusterSelf {
    pub fn is_configured(&self) -> bool {
        self.uuid.is_some()
    }
}

/// One entry of the role catalog, with the sharding capabilities it
/// implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownRole {
    pub name: String,
    #[serde(default)]
    pub implies_router: bool,
    #[serde(default)]
    pub implies_storage: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A sharding group and its bootstrap state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VshardGroup {
    pub name: String,
    pub bucket_count: u64,
    pub bootstrapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverMode {
    Disabled,
    Eventual,
    Stateful,
    Raft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateProvider {
    /// The cluster's own built-in state storage.
    Internal,
    Etcd2,
}

/// Failover configuration as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverParams {
    pub mode: FailoverMode,
    #[serde(default)]
    pub state_provider: Option<StateProvider>,
    #[serde(default)]
    pub failover_timeout: Option<f64>,
    #[serde(default)]
    pub fencing_enabled: bool,
    #[serde(default)]
    pub fencing_timeout: Option<f64>,
    #[serde(default)]
    pub fencing_pause: Option<f64>,
}

impl Default for FailoverParams {
    fn default() -> Self {
        Self {
            mode: FailoverMode::Disabled,
            state_provider: None,
            failover_timeout: None,
            fencing_enabled: false,
            fencing_timeout: None,
            fencing_pause: None,
        }
    }
}

/// Cluster-wide facts not owned by any single instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub self_identity: ClusterSelf,
    #[serde(default)]
    pub known_roles: Vec<KnownRole>,
    #[serde(default)]
    pub vshard_groups: Vec<VshardGroup>,
    #[serde(default)]
    pub failover_params: Option<FailoverParams>,
}

impl ClusterInfo {
    pub fn is_configured(&self) -> bool {
        self.self_identity.is_configured()
    }

    pub fn is_vshard_bootstrapped(&self) -> bool {
        self.vshard_groups.first().map(|g| g.bootstrapped).unwrap_or(false)
    }
}
