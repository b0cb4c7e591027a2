//! Structural comparison of two JSON documents.
//!
//! Maps are compared key by key regardless of key order, sequences are compared
//! position by position. A node whose shape differs between the two sides
//! (e.g. a string that became a map) is reported as a single change at that path.

use std::fmt::{self, Write as _};

use serde_json::Value;

/// Text rendered when two documents are structurally equal.
pub const NO_DIFFERENCES: &str = "<none>";

/// One step into a nested document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A map key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

/// The location of a node inside a document.
///
/// Renders as `spec.template.containers[0].image`, with keys that are not plain
/// identifiers quoted, e.g. `metadata.labels["app.kubernetes.io/name"]`.
/// The document root renders as `.`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The segments from the root down.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => write!(f, "[{}]", Value::from(key.as_str()))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// How a single path differs.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Present on both sides with different values or shapes.
    Changed {
        /// The old value or subtree.
        before: Value,
        /// The new value or subtree.
        after: Value,
    },
    /// Only present in the newer document.
    Added(Value),
    /// Only present in the older document.
    Removed(Value),
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Changed { before, after } => {
                write!(f, "{} -> {}", Canonical(before), Canonical(after))
            }
            Change::Added(value) => write!(f, "+ {}", Canonical(value)),
            Change::Removed(value) => write!(f, "- {}", Canonical(value)),
        }
    }
}

/// A change at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub path: Path,
    pub change: Change,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.change)
    }
}

/// The outcome of comparing two documents.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffResult {
    /// The documents are structurally equal.
    NoDifferences,
    /// Every differing path, sorted by the textual form of the path. Never empty.
    Changes(Vec<Difference>),
}

impl DiffResult {
    /// Whether the documents were equal.
    pub fn is_empty(&self) -> bool {
        matches!(self, DiffResult::NoDifferences)
    }

    /// The differences found, empty when the documents were equal.
    pub fn differences(&self) -> &[Difference] {
        match self {
            DiffResult::NoDifferences => &[],
            DiffResult::Changes(changes) => changes,
        }
    }
}

impl fmt::Display for DiffResult {
    /// One line per difference, or [`NO_DIFFERENCES`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffResult::NoDifferences => f.write_str(NO_DIFFERENCES),
            DiffResult::Changes(changes) => {
                for (i, difference) in changes.iter().enumerate() {
                    if i > 0 {
                        f.write_char('\n')?;
                    }
                    write!(f, "{difference}")?;
                }
                Ok(())
            }
        }
    }
}

/// Compares `before` against `after`.
pub fn diff(before: &Value, after: &Value) -> DiffResult {
    let mut changes = Vec::new();
    walk(&mut Vec::new(), before, after, &mut changes);
    if changes.is_empty() {
        return DiffResult::NoDifferences;
    }
    changes.sort_by_cached_key(|difference| difference.path.to_string());
    DiffResult::Changes(changes)
}

fn walk(path: &mut Vec<PathSegment>, before: &Value, after: &Value, out: &mut Vec<Difference>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                path.push(PathSegment::Key(key.clone()));
                match new.get(key) {
                    Some(new_value) => walk(path, old_value, new_value, out),
                    None => out.push(record(path, Change::Removed(old_value.clone()))),
                }
                path.pop();
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    path.push(PathSegment::Key(key.clone()));
                    out.push(record(path, Change::Added(new_value.clone())));
                    path.pop();
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for index in 0..old.len().max(new.len()) {
                path.push(PathSegment::Index(index));
                match (old.get(index), new.get(index)) {
                    (Some(old_value), Some(new_value)) => walk(path, old_value, new_value, out),
                    (Some(old_value), None) => out.push(record(path, Change::Removed(old_value.clone()))),
                    (None, Some(new_value)) => out.push(record(path, Change::Added(new_value.clone()))),
                    (None, None) => {}
                }
                path.pop();
            }
        }
        _ if same_scalar(before, after) => {}
        _ => out.push(record(
            path,
            Change::Changed {
                before: before.clone(),
                after: after.clone(),
            },
        )),
    }
}

/// Bit-for-bit equality: `0.0` and `-0.0` differ even though they compare equal as `f64`.
fn same_scalar(before: &Value, after: &Value) -> bool {
    match (before, after) {
        (Value::Number(old), Value::Number(new)) if old.is_f64() && new.is_f64() => {
            old.as_f64().map(f64::to_bits) == new.as_f64().map(f64::to_bits)
        }
        _ => before == after,
    }
}

fn record(path: &[PathSegment], change: Change) -> Difference {
    Difference {
        path: Path(path.to_vec()),
        change,
    }
}

/// Compact JSON with map keys sorted, independent of how the map stores them.
struct Canonical<'a>(&'a Value);

impl fmt::Display for Canonical<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Array(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{}", Canonical(item))?;
                }
                f.write_char(']')
            }
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
                f.write_char('{')?;
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{}:{}", Value::from(key.as_str()), Canonical(value))?;
                }
                f.write_char('}')
            }
            scalar => write!(f, "{scalar}"),
        }
    }
}
