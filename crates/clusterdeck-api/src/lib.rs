//! Wire contracts for the clusterdeck console core.
//!
//! Everything the sync engine consumes from or sends to the cluster's
//! admin API lives here: topology payload types, typed mutation payloads,
//! the [`client::RemoteAccess`] trait, and the error taxonomy.

pub mod client;
pub mod cluster;
pub mod error;
pub mod mutation;
pub mod suggestions;
pub mod topology;

pub use client::RemoteAccess;
pub use error::ApiError;
