//! docmatch - MongoDB-style query matching with explanations
//!
//! Evaluates a query document against an in-memory document and reports both
//! the verdict and a path-annotated list of [`Reason`]s describing every
//! comparison that decided it.
//!
//! # Architecture
//!
//! - [`Value`] / [`Document`] — Closed data model for documents *and* queries
//! - [`equal_primitive`] / [`compare_ordered`] — Type-aware leaf comparison
//! - [`resolve_path`] / [`TraversalState`] — Dotted paths and explanation paths
//! - [`classify`] / [`Operator`] — Query key classification, closed operator set
//! - [`evaluate`] — The recursive engine
//! - [`Matcher`] — Reusable compiled-once query, usable as a collection filter
//!
//! # Key Design Insights
//!
//! 1. **Verdict vs. contract violation**: a document that does not match is
//!    `Ok(MatchResult { matched: false, .. })`. A malformed query is
//!    `Err(MatchError)`. The two are never conflated.
//!
//! 2. **Failures win the explanation**: within one query document, as soon as
//!    any key fails the reasons are exactly the failing keys' reasons.
//!
//! 3. **Stateless**: every call starts from a fresh [`TraversalState`], so the
//!    same query can be evaluated from many threads at once.
//!
//! # Example
//!
//! ```
//! use docmatch::prelude::*;
//!
//! let query = Document::new().with(
//!     "$or",
//!     vec![
//!         Value::from(Document::new().with("name", "Amanda")),
//!         Value::from(Document::new().with("id", 1)),
//!     ],
//! );
//! let doc = Value::from(Document::new().with("name", "Amanda").with("id", 2));
//!
//! let result = docmatch::matches(&query, &doc).unwrap();
//! assert!(result.matched);
//! assert_eq!(result.reasons[0].query_path, "$or.[0].name");
//! assert_eq!(result.reasons[0].kind, ReasonKind::Equal);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod classify;
mod engine;
mod equality;
mod matcher;
mod path;
mod reason;
mod validate;
mod value;

#[cfg(feature = "serde")]
mod json;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use classify::{classify, Comparison, KeyKind, Operator};
pub use engine::evaluate;
pub use equality::{compare_ordered, equal_primitive};
pub use matcher::Matcher;
pub use path::{join_path, resolve_path, TraversalState};
pub use reason::{MatchResult, Reason, ReasonKind};
pub use validate::validate;
pub use value::{Document, Identifier, ObjectId, Pattern, Value};

/// Evaluate `query` against `doc`, eagerly.
///
/// Starts from an empty [`TraversalState`].
///
/// # Errors
///
/// Returns a [`MatchError`] when the query is malformed (unknown operator,
/// wrong payload shape, `$elemMatch` on a non-array, nesting too deep).
pub fn matches(query: &Document, doc: &Value) -> Result<MatchResult, MatchError> {
    evaluate(doc, query, &TraversalState::new())
}

/// Curry `query` into a reusable predicate.
///
/// Each invocation starts from a fresh [`TraversalState`]; nothing is shared
/// between calls.
///
/// ```
/// use docmatch::{Document, Value};
///
/// let is_ben = docmatch::matcher(Document::new().with("name", "Ben"));
/// let doc = Value::from(Document::new().with("name", "Ben"));
/// assert!(is_ben(&doc).unwrap().matched);
/// ```
pub fn matcher(query: Document) -> impl Fn(&Value) -> Result<MatchResult, MatchError> + Send + Sync {
    let matcher = Matcher::new(query);
    move |doc: &Value| matcher.evaluate(doc)
}

/// Keep the documents of `docs` that match `query`, in order.
///
/// # Errors
///
/// Stops at the first document whose evaluation raises a [`MatchError`].
pub fn filter<'a, I>(query: &Document, docs: I) -> Result<Vec<&'a Value>, MatchError>
where
    I: IntoIterator<Item = &'a Value>,
{
    matcher::select(query, docs)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use docmatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Document, Identifier, MatchError, MatchResult, Matcher, ObjectId, Operator, Pattern,
        Reason, ReasonKind, TraversalState, Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of nested query documents evaluated in one call.
///
/// The engine recurses once per nested query document, so this bounds stack
/// usage. Checked by [`validate`] and again during evaluation.
pub const MAX_DEPTH: usize = 100;

/// Maximum length for regex pattern sources.
pub const MAX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised by a malformed query or malformed input value.
///
/// These abort evaluation: a `MatchError` is never a "did not match".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// A `$`-prefixed key that is not a known operator.
    #[error("no logic for query operator \"{operator}\" (at \"{query_path}\")")]
    InvalidOperator {
        /// The offending key.
        operator: String,
        /// Query path of the offending key.
        query_path: String,
    },

    /// An operator payload of the wrong shape.
    #[error("value for query operator {operator} must be {expected} (at \"{query_path}\")")]
    InvalidPayload {
        /// The operator, e.g. `"$and"`.
        operator: &'static str,
        /// Description of the required shape.
        expected: &'static str,
        /// Query path of the operator.
        query_path: String,
    },

    /// A non-primitive element inside a `$in` / `$nin` set.
    #[error("non-primitive value at index {index} in {operator} clause (at \"{query_path}\")")]
    NonPrimitiveElement {
        /// `"$in"` or `"$nin"`.
        operator: &'static str,
        /// Index of the element in the set.
        index: usize,
        /// Query path of the operator.
        query_path: String,
    },

    /// `$elemMatch` applied to a document value that is not an array.
    #[error("cannot use {operator} for non-array property \"{property_path}\"")]
    NotAnArray {
        /// The operator (`"$elemMatch"`).
        operator: &'static str,
        /// Property path of the offending value.
        property_path: String,
    },

    /// Query nesting exceeds [`MAX_DEPTH`].
    #[error("query nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Depth reached.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern \"{pattern}\": {message}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// The underlying error message.
        message: String,
    },

    /// A pattern source exceeds [`MAX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A date literal could not be parsed.
    #[error("invalid date \"{value}\"")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// An object id literal could not be parsed.
    #[error("invalid object id \"{value}\", expected 24 hex characters")]
    InvalidObjectId {
        /// The rejected input.
        value: String,
    },

    /// A query or document root that is not a document.
    #[error("expected a document, found {found}")]
    NotADocument {
        /// Type name of what was found.
        found: &'static str,
    },
}

impl MatchError {
    /// The reason kind this error reports as, for errors caused by the shape
    /// of a query. Literal conversion errors have none.
    #[must_use]
    pub fn reason_kind(&self) -> Option<ReasonKind> {
        match self {
            Self::InvalidOperator { .. }
            | Self::InvalidPayload { .. }
            | Self::NonPrimitiveElement { .. }
            | Self::NotAnArray { .. }
            | Self::DepthExceeded { .. } => Some(ReasonKind::InvalidOperator),
            Self::InvalidPattern { .. }
            | Self::PatternTooLong { .. }
            | Self::InvalidDate { .. }
            | Self::InvalidObjectId { .. }
            | Self::NotADocument { .. } => None,
        }
    }
}
