use serde::{Deserialize, Serialize};

/// An instance whose observed advertise URI differs from the one recorded
/// in cluster-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineUriSuggestion {
    pub uuid: String,
    pub uri_old: String,
    pub uri_new: String,
}

/// An instance whose configuration needs a forced re-application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceApplySuggestion {
    pub uuid: String,
    #[serde(default)]
    pub config_locked: bool,
    #[serde(default)]
    pub config_mismatch: bool,
    #[serde(default)]
    pub operation_error: bool,
}

/// Minimal payload for suggestion kinds that only identify an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub uuid: String,
}

/// The cluster's current set of actionable findings. Absent kinds are
/// empty vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsPage {
    #[serde(default)]
    pub refine_uri: Vec<RefineUriSuggestion>,
    #[serde(default)]
    pub force_apply: Vec<ForceApplySuggestion>,
    #[serde(default)]
    pub restart_replication: Vec<InstanceRef>,
    #[serde(default)]
    pub disable_servers: Vec<InstanceRef>,
}

impl SuggestionsPage {
    pub fn is_empty(&self) -> bool {
        self.refine_uri.is_empty()
            && self.force_apply.is_empty()
            && self.restart_replication.is_empty()
            && self.disable_servers.is_empty()
    }
}
