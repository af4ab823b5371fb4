//! Pure derivations over a [`Snapshot`]. Nothing here holds state; the
//! same snapshot always yields the same answer.

use clusterdeck_api::topology::{ClusterIssue, Instance, ReplicaGroup};

use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub total: usize,
    pub unhealthy: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceCounts {
    pub total: usize,
    pub configured: usize,
    pub unconfigured: usize,
    pub unhealthy: usize,
}

pub fn replica_group_counts(snap: &Snapshot) -> GroupCounts {
    GroupCounts {
        total: snap.replica_groups.len(),
        unhealthy: snap
            .replica_groups
            .iter()
            .filter(|g| !g.status.is_healthy())
            .count(),
    }
}

pub fn instance_counts(snap: &Snapshot) -> InstanceCounts {
    let configured = snap.instances.iter().filter(|i| i.is_configured()).count();
    InstanceCounts {
        total: snap.instances.len(),
        configured,
        unconfigured: snap.instances.len() - configured,
        unhealthy: snap
            .instances
            .iter()
            .filter(|i| !i.status.is_healthy())
            .count(),
    }
}

fn role_implies(snap: &Snapshot, role: &str, router: bool) -> bool {
    let Some(cluster) = snap.cluster.as_ref() else {
        return false;
    };
    cluster
        .known_roles
        .iter()
        .any(|k| k.name == role && if router { k.implies_router } else { k.implies_storage })
}

/// True when some configured group carries a role the catalog marks as a
/// sharding router.
pub fn is_router_enabled(snap: &Snapshot) -> bool {
    snap.replica_groups
        .iter()
        .flat_map(|g| g.roles.iter())
        .any(|role| role_implies(snap, role, true))
}

pub fn is_storage_enabled(snap: &Snapshot) -> bool {
    snap.replica_groups
        .iter()
        .flat_map(|g| g.roles.iter())
        .any(|role| role_implies(snap, role, false))
}

pub fn is_vshard_bootstrapped(snap: &Snapshot) -> bool {
    snap.cluster
        .as_ref()
        .map(|c| c.is_vshard_bootstrapped())
        .unwrap_or(false)
}

/// Sharding can be bootstrapped once the cluster is configured with at
/// least one router-capable and one storage-capable group, and has not
/// been bootstrapped yet.
pub fn can_bootstrap_vshard(snap: &Snapshot) -> bool {
    let configured = snap
        .cluster
        .as_ref()
        .map(|c| c.is_configured())
        .unwrap_or(false);
    configured
        && is_router_enabled(snap)
        && is_storage_enabled(snap)
        && !is_vshard_bootstrapped(snap)
}

/// Unconfigured instances in fetch order, except that before the cluster
/// itself is configured the serving instance floats to the front so the
/// operator starts with it.
pub fn sort_unconfigured<'a>(snap: &'a Snapshot) -> Vec<&'a Instance> {
    let mut out: Vec<&Instance> = snap
        .instances
        .iter()
        .filter(|i| !i.is_configured())
        .collect();

    let cluster_configured = snap
        .cluster
        .as_ref()
        .map(|c| c.is_configured())
        .unwrap_or(false);
    if !cluster_configured {
        if let Some(self_uri) = snap.cluster.as_ref().map(|c| c.self_identity.uri.as_str()) {
            if let Some(pos) = out.iter().position(|i| i.uri == self_uri) {
                let own = out.remove(pos);
                out.insert(0, own);
            }
        }
    }
    out
}

/// Groups ordered by alias, then first member's alias, then uuid.
pub fn sort_replica_groups<'a>(snap: &'a Snapshot) -> Vec<&'a ReplicaGroup> {
    let mut out: Vec<&ReplicaGroup> = snap.replica_groups.iter().collect();
    out.sort_by(|a, b| {
        let first_alias = |g: &ReplicaGroup| {
            g.servers
                .first()
                .and_then(|s| s.alias.clone())
                .unwrap_or_default()
        };
        a.alias
            .cmp(&b.alias)
            .then_with(|| first_alias(a).cmp(&first_alias(b)))
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
    out
}

/// Distinct instance zones, sorted.
pub fn zones(snap: &Snapshot) -> Vec<String> {
    let mut out: Vec<String> = snap
        .instances
        .iter()
        .filter_map(|i| i.zone.clone())
        .collect();
    out.sort();
    out.dedup();
    out
}

pub fn issues_for_instance<'a>(snap: &'a Snapshot, uuid: &str) -> Vec<&'a ClusterIssue> {
    snap.issues
        .iter()
        .filter(|issue| issue.instance_uuid.as_deref() == Some(uuid))
        .collect()
}

pub fn instance_by_uri<'a>(snap: &'a Snapshot, uri: &str) -> Option<&'a Instance> {
    snap.instances.iter().find(|i| i.uri == uri)
}

pub fn is_master(group: &ReplicaGroup, uuid: &str) -> bool {
    group.master.uuid == uuid
}

pub fn is_active_master(group: &ReplicaGroup, uuid: &str) -> bool {
    group.active_master.uuid == uuid
}
