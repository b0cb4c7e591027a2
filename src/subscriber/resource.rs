use std::fmt;

use kube_core::ApiResource;

/// Uniquely identifies a type of resources in a cluster together with the served version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersionResource {
    /// The group of the resource type, or empty string for the core group.
    pub group: String,
    /// The version to watch.
    pub version: String,
    /// The plural name of the resource type.
    pub resource: String,
}

impl GroupVersionResource {
    pub fn gvr(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_owned(),
            version: version.to_owned(),
            resource: resource.to_owned(),
        }
    }

    /// `v1` for the core group, `group/version` otherwise.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// The dynamic type to build an `Api<DynamicObject>` with.
    ///
    /// The kind is left empty: requests only need the plural name,
    /// and watched objects carry their own kind.
    pub fn to_api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: String::new(),
            plural: self.resource.clone(),
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_group() {
        let gvr = GroupVersionResource::gvr("", "v1", "pods");
        assert_eq!(gvr.api_version(), "v1");
        assert_eq!(gvr.to_string(), "v1/pods");
        let ar = gvr.to_api_resource();
        assert_eq!(ar.api_version, "v1");
        assert_eq!(ar.plural, "pods");
    }

    #[test]
    fn named_group() {
        let gvr = GroupVersionResource::gvr("apps", "v1", "deployments");
        assert_eq!(gvr.api_version(), "apps/v1");
        assert_eq!(gvr.to_string(), "apps/v1/deployments");
        assert_eq!(gvr.to_api_resource().group, "apps");
    }
}
