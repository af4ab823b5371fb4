use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use clusterdeck_api::cluster::ClusterInfo;
use clusterdeck_api::topology::{ClusterIssue, Instance, InstanceStats, ReplicaGroup, TopologyPage};
use clusterdeck_api::{ApiError, RemoteAccess};

use crate::request::RequestStatus;

/// One immutable view of the cluster. Readers hold an `Arc<Snapshot>`;
/// a refresh swaps the whole thing in a single transition, so a reader
/// never observes instances from one fetch next to groups from another.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub instances: Vec<Instance>,
    pub replica_groups: Vec<ReplicaGroup>,
    /// Keyed by instance uuid. Sticky: a stats-less refresh keeps the
    /// previous map untouched.
    pub stats: BTreeMap<String, InstanceStats>,
    pub issues: Vec<ClusterIssue>,
    pub cluster: Option<ClusterInfo>,
    /// Session token the snapshot was merged under.
    pub generation: u64,
}

impl Snapshot {
    pub fn instance(&self, uuid: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.uuid == uuid)
    }

    pub fn replica_group(&self, uuid: &str) -> Option<&ReplicaGroup> {
        self.replica_groups.iter().find(|g| g.uuid == uuid)
    }

    pub fn stats_for(&self, uuid: &str) -> Option<&InstanceStats> {
        self.stats.get(uuid)
    }

    /// Grouped instances that currently have no statistics row. These are
    /// the gaps an out-of-band stats fetch should fill.
    pub fn missing_stats_uuids(&self) -> Vec<String> {
        self.instances
            .iter()
            .filter(|i| i.is_configured() && !self.stats.contains_key(&i.uuid))
            .map(|i| i.uuid.clone())
            .collect()
    }
}

/// Authoritative local picture of the cluster.
///
/// Every merge is gated on a generation token: results that started
/// before the last [`TopologyStore::bump_generation`] are discarded on
/// arrival, which is how a closed page stops a refresh that is already
/// in flight.
pub struct TopologyStore {
    snapshot: RwLock<Arc<Snapshot>>,
    generation: AtomicU64,
    topology_status: RwLock<RequestStatus>,
    cluster_status: RwLock<RequestStatus>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            generation: AtomicU64::new(0),
            topology_status: RwLock::new(RequestStatus::default()),
            cluster_status: RwLock::new(RequestStatus::default()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidates every in-flight fetch. Returns the new token.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn topology_status(&self) -> RequestStatus {
        self.topology_status.read().await.clone()
    }

    pub async fn cluster_status(&self) -> RequestStatus {
        self.cluster_status.read().await.clone()
    }

    /// First full fetch for a page session: topology with statistics,
    /// then cluster-wide facts. Nothing is merged on failure; the last
    /// good snapshot (if any) stays readable.
    pub async fn load_initial(&self, remote: &dyn RemoteAccess) -> Result<(), ApiError> {
        let generation = self.generation();
        self.topology_status.write().await.start();
        self.cluster_status.write().await.start();

        let page = match remote.fetch_topology(true).await {
            Ok(page) => page,
            Err(err) => {
                self.topology_status.write().await.fail(err.message());
                self.cluster_status.write().await.fail(err.message());
                return Err(err);
            }
        };
        let cluster = match remote.fetch_cluster().await {
            Ok(cluster) => cluster,
            Err(err) => {
                self.topology_status.write().await.fail(err.message());
                self.cluster_status.write().await.fail(err.message());
                return Err(err);
            }
        };

        if !self.apply_page(page, generation).await {
            // Page was closed while the load was in flight.
            return Ok(());
        }
        self.set_cluster(cluster, generation).await;
        self.topology_status.write().await.succeed();
        self.cluster_status.write().await.succeed();
        Ok(())
    }

    /// Merges one refresh. The fetch is authoritative: collections are
    /// replaced wholesale, so records absent from the page drop out.
    /// Returns false when the page carried a stale generation and was
    /// discarded.
    pub async fn apply_page(&self, page: TopologyPage, generation: u64) -> bool {
        if generation != self.generation() {
            debug!(
                stale = generation,
                current = self.generation(),
                "discarding topology page from a closed session"
            );
            return false;
        }

        let mut guard = self.snapshot.write().await;
        let previous = guard.clone();
        let stats = match page.stats {
            Some(rows) => Self::index_stats(rows),
            None => previous.stats.clone(),
        };
        *guard = Arc::new(Snapshot {
            instances: page.instances,
            replica_groups: page.replica_groups,
            stats,
            issues: page.issues,
            cluster: previous.cluster.clone(),
            generation,
        });
        true
    }

    /// Merges an out-of-band statistics fetch without touching topology.
    pub async fn apply_stats(&self, rows: Vec<InstanceStats>, generation: u64) -> bool {
        if generation != self.generation() {
            debug!("discarding stats rows from a closed session");
            return false;
        }

        let mut guard = self.snapshot.write().await;
        let mut next = (**guard).clone();
        for (uuid, row) in Self::index_stats(rows) {
            next.stats.insert(uuid, row);
        }
        next.generation = generation;
        *guard = Arc::new(next);
        true
    }

    pub async fn set_cluster(&self, cluster: ClusterInfo, generation: u64) -> bool {
        if generation != self.generation() {
            return false;
        }
        let mut guard = self.snapshot.write().await;
        let mut next = (**guard).clone();
        next.cluster = Some(cluster);
        next.generation = generation;
        *guard = Arc::new(next);
        true
    }

    pub async fn record_refresh_failure(&self, err: &ApiError) {
        warn!(error = %err, "topology refresh failed, keeping last snapshot");
        self.topology_status.write().await.fail(err.message());
    }

    pub async fn mark_refresh_started(&self) {
        self.topology_status.write().await.start();
    }

    pub async fn mark_refresh_succeeded(&self) {
        self.topology_status.write().await.succeed();
    }

    /// Drops all merged state and invalidates in-flight fetches.
    pub async fn clear(&self) {
        self.bump_generation();
        let mut guard = self.snapshot.write().await;
        *guard = Arc::new(Snapshot::default());
        drop(guard);
        *self.topology_status.write().await = RequestStatus::default();
        *self.cluster_status.write().await = RequestStatus::default();
    }

    /// Rows without a uuid are placeholders for unreachable instances.
    fn index_stats(rows: Vec<InstanceStats>) -> BTreeMap<String, InstanceStats> {
        rows.into_iter()
            .filter_map(|row| row.uuid.clone().map(|uuid| (uuid, row)))
            .collect()
    }
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, FakeRemote};

    #[tokio::test]
    async fn test_load_initial_merges_topology_and_cluster() {
        let remote = FakeRemote::new();
        remote.set_topology(fixtures::page_with_stats());
        remote.set_cluster(fixtures::cluster_configured());

        let store = TopologyStore::new();
        store.load_initial(&remote).await.unwrap();

        let snap = store.snapshot().await;
        assert_eq!(snap.instances.len(), 3);
        assert_eq!(snap.replica_groups.len(), 2);
        assert!(snap.cluster.is_some());
        assert!(store.topology_status().await.loaded);
    }

    #[tokio::test]
    async fn test_load_initial_failure_merges_nothing() {
        let remote = FakeRemote::new();
        remote.fail_topology(ApiError::unreachable("connection refused"));

        let store = TopologyStore::new();
        let err = store.load_initial(&remote).await.unwrap_err();
        assert!(err.is_unreachable());

        let snap = store.snapshot().await;
        assert!(snap.instances.is_empty());
        assert_eq!(
            store.topology_status().await.error.as_deref(),
            Some("connection refused")
        );
    }

    #[tokio::test]
    async fn test_apply_page_is_whole_collection_replacement() {
        let store = TopologyStore::new();
        let generation = store.generation();
        store.apply_page(fixtures::page_with_stats(), generation).await;

        // A later page missing one instance drops it.
        let mut page = fixtures::page_with_stats();
        page.instances.retain(|i| i.uuid != "uuid-storage-2");
        store.apply_page(page, generation).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.instances.len(), 2);
        assert!(snap.instance("uuid-storage-2").is_none());
    }

    #[tokio::test]
    async fn test_apply_page_is_idempotent() {
        let store = TopologyStore::new();
        let generation = store.generation();
        store.apply_page(fixtures::page_with_stats(), generation).await;
        let first = store.snapshot().await;

        store.apply_page(fixtures::page_with_stats(), generation).await;
        let second = store.snapshot().await;

        assert_eq!(first.instances, second.instances);
        assert_eq!(first.replica_groups, second.replica_groups);
        assert_eq!(first.stats, second.stats);
    }

    #[tokio::test]
    async fn test_stats_sticky_across_statsless_refresh() {
        let store = TopologyStore::new();
        let generation = store.generation();
        store.apply_page(fixtures::page_with_stats(), generation).await;
        assert!(!store.snapshot().await.stats.is_empty());

        let mut page = fixtures::page_with_stats();
        page.stats = None;
        store.apply_page(page, generation).await;

        let snap = store.snapshot().await;
        assert!(snap.stats.contains_key("uuid-router-1"));
    }

    #[tokio::test]
    async fn test_stats_rows_without_uuid_are_dropped() {
        let store = TopologyStore::new();
        let generation = store.generation();
        let mut page = fixtures::page_with_stats();
        if let Some(rows) = page.stats.as_mut() {
            rows.push(InstanceStats {
                uuid: None,
                ..Default::default()
            });
        }
        store.apply_page(page, generation).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.stats.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_generation_discarded() {
        let store = TopologyStore::new();
        let stale = store.generation();
        store.bump_generation();

        assert!(!store.apply_page(fixtures::page_with_stats(), stale).await);
        assert!(store.snapshot().await.instances.is_empty());
    }

    #[tokio::test]
    async fn test_apply_stats_fills_gap() {
        let store = TopologyStore::new();
        let generation = store.generation();
        let mut page = fixtures::page_with_stats();
        if let Some(rows) = page.stats.as_mut() {
            rows.retain(|r| r.uuid.as_deref() != Some("uuid-storage-2"));
        }
        store.apply_page(page, generation).await;
        assert_eq!(
            store.snapshot().await.missing_stats_uuids(),
            vec!["uuid-storage-2".to_string()]
        );

        store
            .apply_stats(vec![fixtures::stats_row("uuid-storage-2")], generation)
            .await;
        assert!(store.snapshot().await.missing_stats_uuids().is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let store = TopologyStore::new();
        let generation = store.generation();
        store.apply_page(fixtures::page_with_stats(), generation).await;
        store.clear().await;

        let snap = store.snapshot().await;
        assert!(snap.instances.is_empty());
        assert!(snap.stats.is_empty());
        assert!(!store.topology_status().await.loaded);
        assert!(store.generation() > generation);
    }
}
