//! Strips noise fields from snapshots before they are compared.

use serde_json::Value;

use crate::event::Snapshot;

const MANAGED_FIELDS: &str = "managedFields";
const METADATA: &str = "metadata";
const STATUS: &str = "status";

/// Which parts of a resource take part in comparisons.
///
/// Built once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizationPolicy {
    /// Keep `managedFields` provenance metadata.
    pub include_managed_fields: bool,
    /// Keep the top-level `status` subtree.
    pub include_status: bool,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            include_managed_fields: true,
            include_status: false,
        }
    }
}

impl NormalizationPolicy {
    /// A policy that keeps every field.
    pub fn keep_all() -> Self {
        Self {
            include_managed_fields: true,
            include_status: true,
        }
    }

    /// Sets whether `managedFields` are compared.
    #[must_use]
    pub fn include_managed_fields(mut self, include: bool) -> Self {
        self.include_managed_fields = include;
        self
    }

    /// Sets whether `status` is compared.
    #[must_use]
    pub fn include_status(mut self, include: bool) -> Self {
        self.include_status = include;
        self
    }
}

/// Returns a copy of `snapshot` with the fields excluded by `policy` removed.
///
/// Removed fields are absent from the result, not nulled, so an object that lost
/// its `managedFields` here compares equal to one that never had them.
/// Documents of unexpected shape pass through unchanged.
pub fn normalize(snapshot: &Snapshot, policy: &NormalizationPolicy) -> Snapshot {
    let mut document = snapshot.document().clone();
    if let Value::Object(root) = &mut document {
        if !policy.include_managed_fields {
            root.remove(MANAGED_FIELDS);
            if let Some(Value::Object(metadata)) = root.get_mut(METADATA) {
                metadata.remove(MANAGED_FIELDS);
            }
        }
        if !policy.include_status {
            root.remove(STATUS);
        }
    }
    Snapshot::new(document)
}
