//! kube-diffwatch watches a Kubernetes resource type
//! and renders a human-readable feed of its changes:
//! an identity line when an object is added or deleted,
//! and a structural diff of the two versions when it is updated.
//!
//! Noisy fields (`managedFields`, `status`) can be dropped before comparing
//! through a [`NormalizationPolicy`].
//! Rendering is pure and deterministic: the same pair of snapshots always renders to the same bytes,
//! regardless of the key order of the documents.
//!
//! The pipeline consumes a stream of [`ChangeEvent`]s from a [`Config`],
//! usually built around [`subscriber::changes`], and writes each rendered event to a [`Sink`].

pub mod config;
pub use config::{on, Config};
pub mod diff;
pub use diff::{diff, DiffResult};
pub mod event;
pub use event::{ChangeEvent, Snapshot};
pub mod normalize;
pub use normalize::{normalize, NormalizationPolicy};
pub mod render;
pub use render::{render_change, Renderer};
mod runner;
pub use runner::{run, RunError, RunStats};
pub mod sink;
pub use sink::Sink;
pub mod subscriber;
