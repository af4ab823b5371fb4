//! Client-side synchronization core for a cluster admin console.
//!
//! Holds the authoritative local picture of cluster topology, keeps it
//! fresh with a periodic poller, derives view state (counts, sort orders,
//! filters, capacity projections, repair suggestions), and serializes
//! topology mutations. All remote I/O goes through the
//! [`clusterdeck_api::RemoteAccess`] trait, so every piece is testable
//! against an in-process fake.

pub mod config;
pub mod coordinator;
pub mod filter;
pub mod notify;
pub mod poller;
pub mod request;
pub mod selectors;
pub mod session;
pub mod stats;
pub mod store;
pub mod suggestions;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SyncConfig;
pub use session::ClusterSession;
pub use store::{Snapshot, TopologyStore};
