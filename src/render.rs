//! Turns change events into text.

use crate::{
    diff::{self, DiffResult},
    event::{ChangeEvent, Snapshot},
    normalize::{normalize, NormalizationPolicy},
};

/// Renders change events under a fixed [`NormalizationPolicy`].
///
/// Stateless apart from the policy; safe to share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    policy: NormalizationPolicy,
}

impl Renderer {
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }

    /// Renders `event`. See [`render_change`].
    pub fn render(&self, event: &ChangeEvent) -> String {
        render_change(event, &self.policy)
    }
}

/// Renders `event` as text.
///
/// Additions and deletions render as a single identity line:
///
/// ```text
/// add apiVersion=v1 kind=Pod ns=ns1 name=p1
/// ```
///
/// Updates render a header followed by one indented line per differing path,
/// or `<none>` on the header line when the normalized sides are equal:
///
/// ```text
/// upd apiVersion=apps/v1 kind=Deployment ns=default name=web diff:
///   spec.replicas: 3 -> 5
/// ```
pub fn render_change(event: &ChangeEvent, policy: &NormalizationPolicy) -> String {
    match event {
        ChangeEvent::Added(snapshot) => format!("add {}", Identity::of(snapshot)),
        ChangeEvent::Deleted(snapshot) => format!("del {}", Identity::of(snapshot)),
        ChangeEvent::Updated { before, after } => {
            let result = diff_snapshots(before, after, policy);
            let identity = Identity::of(after).or(Identity::of(before));
            match &result {
                DiffResult::NoDifferences => format!("upd {identity} diff: {}", diff::NO_DIFFERENCES),
                DiffResult::Changes(changes) => {
                    let mut out = format!("upd {identity} diff:");
                    for difference in changes {
                        out.push_str("\n  ");
                        out.push_str(&difference.to_string());
                    }
                    out
                }
            }
        }
    }
}

/// Normalizes both sides independently and compares them.
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot, policy: &NormalizationPolicy) -> DiffResult {
    let before = normalize(before, policy);
    let after = normalize(after, policy);
    diff::diff(before.document(), after.document())
}

#[derive(Clone, Copy)]
struct Identity<'a> {
    api_version: Option<&'a str>,
    kind: Option<&'a str>,
    namespace: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> Identity<'a> {
    fn of(snapshot: &'a Snapshot) -> Self {
        Self {
            api_version: snapshot.api_version(),
            kind: snapshot.kind(),
            namespace: snapshot.namespace(),
            name: snapshot.name(),
        }
    }

    /// Fills missing fields from `other`.
    fn or(self, other: Self) -> Self {
        Self {
            api_version: self.api_version.or(other.api_version),
            kind: self.kind.or(other.kind),
            namespace: self.namespace.or(other.namespace),
            name: self.name.or(other.name),
        }
    }
}

impl std::fmt::Display for Identity<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "apiVersion={} kind={} ns={} name={}",
            self.api_version.unwrap_or_default(),
            self.kind.unwrap_or_default(),
            self.namespace.unwrap_or_default(),
            self.name.unwrap_or_default(),
        )
    }
}
