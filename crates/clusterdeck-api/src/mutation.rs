//! Typed payloads for topology mutations, one struct per operation.

use serde::{Deserialize, Serialize};

use crate::cluster::{FailoverMode, StateProvider};

/// Probe an address for reachability before joining it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub uri: String,
}

/// Join an unconfigured instance into an existing replica group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub uri: String,
    pub replica_group_uuid: String,
}

/// Expel an instance from the cluster entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpelRequest {
    pub uuid: String,
}

/// Create a replica group seeded with a single instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub uri: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub vshard_group: Option<String>,
    #[serde(default)]
    pub all_rw: bool,
}

/// Edit an existing replica group. `failover_priority` is the ordered
/// leader preference list (configured master first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditGroupRequest {
    pub uuid: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub vshard_group: Option<String>,
    #[serde(default)]
    pub all_rw: bool,
    #[serde(default)]
    pub failover_priority: Vec<String>,
}

/// Change the cluster's failover mode and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverRequest {
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

/// Promote an instance to leader of its replica group. With
/// `force_inconsistency` set the cluster bypasses consistency checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub replica_group_uuid: String,
    pub instance_uuid: String,
    #[serde(default)]
    pub force_inconsistency: bool,
}

/// Upload a full cluster configuration archive or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpload {
    pub filename: String,
    pub body: Vec<u8>,
}

/// Forced config re-application restricted to the given instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceApplyRequest {
    pub uuids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartReplicationRequest {
    pub uuids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableServersRequest {
    pub uuids: Vec<String>,
}

/// Disable one instance, or bring a disabled one back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDisabledRequest {
    pub uuid: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetElectableRequest {
    pub uuid: String,
    pub electable: bool,
}

/// One advertise-URI correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriChange {
    pub uuid: String,
    pub uri: String,
}

/// Batched advertise-URI edit covering every drifted instance at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditUrisRequest {
    pub changes: Vec<UriChange>,
}
