//! Explanation types returned by the engine.
//!
//! A [`MatchResult`] carries the verdict plus the [`Reason`]s that decided
//! it. Reasons are plain records: they are created once and never mutated.
//!
//! # Example
//!
//! ```
//! use docmatch::{Document, ReasonKind, Value};
//!
//! let query = Document::new().with("age", Document::new().with("$gte", 21));
//! let doc = Value::from(Document::new().with("age", 30));
//!
//! let result = docmatch::matches(&query, &doc).unwrap();
//! for reason in &result.reasons {
//!     println!("{reason}");
//! }
//! assert_eq!(result.reasons[0].kind, ReasonKind::Inequality);
//! assert_eq!(result.reasons[0].query_path, "age.$gte");
//! ```

use std::fmt;

/// The kind of interaction between a query and a document that a
/// [`Reason`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ReasonKind {
    /// Primitive equality (implicit or `$eq`), or inverted equality under `$not`.
    Equal,
    /// `$ne`.
    NotEqual,
    /// `$in`.
    InSet,
    /// `$nin`.
    NotInSet,
    /// `$elemMatch` against an empty array.
    ElementMatch,
    /// `$gt`, `$gte`, `$lt`, `$lte`.
    Inequality,
    /// An empty query document (universal match).
    HasNoKeys,
    /// A plain query key absent from the document.
    HasNoPath,
    /// A malformed query. Only reported through
    /// [`MatchError::reason_kind`](crate::MatchError::reason_kind).
    InvalidOperator,
}

impl ReasonKind {
    /// The explanation-contract name, e.g. `"HAS_NO_PATH"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::InSet => "IN_SET",
            Self::NotInSet => "NOT_IN_SET",
            Self::ElementMatch => "ELEMENT_MATCH",
            Self::Inequality => "INEQUALITY",
            Self::HasNoKeys => "HAS_NO_KEYS",
            Self::HasNoPath => "HAS_NO_PATH",
            Self::InvalidOperator => "INVALID_OPERATOR",
        }
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison step that contributed to a verdict.
///
/// - `property_path`: where in the document the compared value lives
/// - `query_path`: where in the query the comparison came from
/// - `kind`: what kind of comparison it was
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Reason {
    /// Dot-joined document keys and `[i]` element segments.
    pub property_path: String,
    /// Dot-joined query keys, operator names and `[i]` clause segments.
    pub query_path: String,
    /// The kind of comparison.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ReasonKind,
}

impl Reason {
    /// Create a reason.
    pub fn new(
        property_path: impl Into<String>,
        query_path: impl Into<String>,
        kind: ReasonKind,
    ) -> Self {
        Self {
            property_path: property_path.into(),
            query_path: query_path.into(),
            kind,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (property \"{}\", query \"{}\")",
            self.kind, self.property_path, self.query_path
        )
    }
}

/// Verdict of matching a query against a document, with its explanation.
///
/// # INV: reasons follow the verdict
///
/// When a query document fails, `reasons` holds only the reasons of the
/// keys that failed; passing keys are not reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchResult {
    /// Whether the query matched.
    #[cfg_attr(feature = "serde", serde(rename = "match"))]
    pub matched: bool,
    /// Why (or why not), in evaluation order.
    pub reasons: Vec<Reason>,
}

impl MatchResult {
    /// Create a result.
    #[must_use]
    pub fn new(matched: bool, reasons: Vec<Reason>) -> Self {
        Self { matched, reasons }
    }

    /// A result with a single reason.
    #[must_use]
    pub fn single(matched: bool, reason: Reason) -> Self {
        Self::new(matched, vec![reason])
    }

    /// Same reasons, opposite verdict.
    #[must_use]
    pub fn invert(self) -> Self {
        Self::new(!self.matched, self.reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_kind_names() {
        assert_eq!(ReasonKind::HasNoPath.to_string(), "HAS_NO_PATH");
        assert_eq!(ReasonKind::NotInSet.as_str(), "NOT_IN_SET");
        assert_eq!(ReasonKind::ElementMatch.as_str(), "ELEMENT_MATCH");
    }

    #[test]
    fn reason_display() {
        let reason = Reason::new("a.b", "\"a.b\"", ReasonKind::Equal);
        let text = reason.to_string();
        assert!(text.starts_with("EQUAL"));
        assert!(text.contains("a.b"));
    }

    #[test]
    fn invert_keeps_reasons() {
        let result = MatchResult::single(true, Reason::new("a", "a", ReasonKind::Equal));
        let inverted = result.clone().invert();
        assert!(!inverted.matched);
        assert_eq!(inverted.reasons, result.reasons);
    }

    #[test]
    fn default_is_empty_failure() {
        let result = MatchResult::default();
        assert!(!result.matched);
        assert!(result.reasons.is_empty());
    }
}
