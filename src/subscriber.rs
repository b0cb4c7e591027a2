//! Subscribers producing [`ChangeEvent`](crate::ChangeEvent) streams to construct `Config` with.

use kube_runtime::watcher;

pub mod objects;
pub use objects::{changes, Tracker};

pub mod resource;
pub use resource::GroupVersionResource;

/// The error type of the streams returned by [`changes`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying watch failed. The stream retries after a backoff.
    #[error("watch failed: {0}")]
    Watch(#[source] watcher::Error),
    /// An object could not be turned into a snapshot.
    #[error("failed to snapshot object: {0}")]
    Snapshot(#[source] serde_json::Error),
}
