//! Dotted-path resolution and the traversal state that tracks explanation paths.

use crate::reason::{Reason, ReasonKind};
use crate::value::Value;

/// Join a path prefix and a segment with `.`.
///
/// The separator is only inserted when both sides are non-empty, so paths
/// never carry leading or trailing dots.
///
/// ```
/// use docmatch::join_path;
///
/// assert_eq!(join_path("", "a"), "a");
/// assert_eq!(join_path("a", "b"), "a.b");
/// assert_eq!(join_path("$and", "[0]"), "$and.[0]");
/// assert_eq!(join_path("a", ""), "a");
/// ```
#[must_use]
pub fn join_path(prefix: &str, segment: &str) -> String {
    match (prefix.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_owned(),
        (false, true) => prefix.to_owned(),
        (false, false) => {
            let mut path = String::with_capacity(prefix.len() + segment.len() + 1);
            path.push_str(prefix);
            path.push('.');
            path.push_str(segment);
            path
        }
    }
}

/// Resolve a dotted path such as `"address.city"` inside `node`.
///
/// Each segment is a plain key access (arrays by decimal index). Returns
/// `None` as soon as any step is absent; that is a miss, not an error.
///
/// ```
/// use docmatch::{resolve_path, Document, Value};
///
/// let doc = Value::from(Document::new().with("a", Document::new().with("b", 1)));
/// assert_eq!(resolve_path(&doc, "a.b"), Some(&Value::from(1)));
/// assert_eq!(resolve_path(&doc, "a.x.y"), None);
/// ```
#[must_use]
pub fn resolve_path<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(node, |current, key| current.get(key))
}

/// Where the engine currently is, in the document and in the query.
///
/// Immutable: every step returns an extended copy, so sibling branches of
/// `$and` / `$or` never observe each other's paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalState {
    property_path: String,
    query_path: String,
    depth: usize,
}

impl TraversalState {
    /// The empty root state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dot-joined trail of document keys and `[i]` element segments.
    #[must_use]
    pub fn property_path(&self) -> &str {
        &self.property_path
    }

    /// Dot-joined trail of query keys, operator names and `[i]` segments.
    #[must_use]
    pub fn query_path(&self) -> &str {
        &self.query_path
    }

    /// Number of query documents entered so far.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Extend only the property path.
    #[must_use]
    pub fn with_property(&self, segment: &str) -> Self {
        Self {
            property_path: join_path(&self.property_path, segment),
            query_path: self.query_path.clone(),
            depth: self.depth,
        }
    }

    /// Extend only the query path.
    #[must_use]
    pub fn with_query(&self, segment: &str) -> Self {
        Self {
            property_path: self.property_path.clone(),
            query_path: join_path(&self.query_path, segment),
            depth: self.depth,
        }
    }

    /// Extend both paths.
    #[must_use]
    pub fn extend(&self, property: &str, query: &str) -> Self {
        Self {
            property_path: join_path(&self.property_path, property),
            query_path: join_path(&self.query_path, query),
            depth: self.depth,
        }
    }

    pub(crate) fn descend(&self) -> Self {
        Self {
            property_path: self.property_path.clone(),
            query_path: self.query_path.clone(),
            depth: self.depth + 1,
        }
    }

    /// A reason located at this state.
    #[must_use]
    pub fn reason(&self, kind: ReasonKind) -> Reason {
        Reason::new(self.property_path.clone(), self.query_path.clone(), kind)
    }
}
