//! Resource snapshots and the change events that carry them.

use serde::Serialize;
use serde_json::Value;

/// The full state of one resource at one point in time.
///
/// A snapshot is a plain JSON document as served by the apiserver,
/// i.e. `apiVersion`, `kind`, `metadata` and whatever data the type defines.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    document: Value,
}

impl Snapshot {
    /// Wraps a raw document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Serializes an object, typed or dynamic, into a snapshot.
    pub fn from_object<K: Serialize>(object: &K) -> Result<Self, serde_json::Error> {
        serde_json::to_value(object).map(Self::new)
    }

    /// The underlying document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consumes the snapshot, returning the underlying document.
    pub fn into_document(self) -> Value {
        self.document
    }

    /// The `apiVersion` of the resource, if present.
    pub fn api_version(&self) -> Option<&str> {
        self.document.get("apiVersion")?.as_str()
    }

    /// The `kind` of the resource, if present.
    pub fn kind(&self) -> Option<&str> {
        self.document.get("kind")?.as_str()
    }

    /// The namespace of the resource. `None` for cluster-scoped resources.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    /// The name of the resource, if present.
    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    /// The `metadata.resourceVersion` of the resource, if present.
    pub fn resource_version(&self) -> Option<&str> {
        self.metadata_str("resourceVersion")
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.document.get("metadata")?.get(key)?.as_str()
    }
}

impl From<Value> for Snapshot {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}

/// A change observed on the watched resource type.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// An object appeared.
    Added(Snapshot),
    /// An object was modified.
    Updated {
        /// The last known state before the modification.
        before: Snapshot,
        /// The new state.
        after: Snapshot,
    },
    /// An object disappeared. The snapshot is its last known state, which may be incomplete.
    Deleted(Snapshot),
}

impl ChangeEvent {
    /// The snapshot identifying the object this event is about.
    ///
    /// For updates this is the newer side.
    pub fn subject(&self) -> &Snapshot {
        match self {
            ChangeEvent::Added(snapshot) | ChangeEvent::Deleted(snapshot) => snapshot,
            ChangeEvent::Updated { after, .. } => after,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identity_accessors() {
        let snapshot = Snapshot::new(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"namespace": "ns1", "name": "web", "resourceVersion": "42"},
        }));
        assert_eq!(snapshot.api_version(), Some("apps/v1"));
        assert_eq!(snapshot.kind(), Some("Deployment"));
        assert_eq!(snapshot.namespace(), Some("ns1"));
        assert_eq!(snapshot.name(), Some("web"));
        assert_eq!(snapshot.resource_version(), Some("42"));
    }

    #[test]
    fn partial_documents_have_no_identity() {
        let snapshot = Snapshot::new(json!({"metadata": "not a map", "kind": 3}));
        assert_eq!(snapshot.kind(), None);
        assert_eq!(snapshot.namespace(), None);
        assert_eq!(Snapshot::new(json!(null)).name(), None);
    }

    #[test]
    fn from_typed_object() {
        let pod = k8s_openapi::api::core::v1::Pod {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some("p1".into()),
                namespace: Some("ns1".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let snapshot = Snapshot::from_object(&pod).unwrap();
        assert_eq!(snapshot.kind(), Some("Pod"));
        assert_eq!(snapshot.api_version(), Some("v1"));
        assert_eq!(snapshot.name(), Some("p1"));
    }
}
