//! Matcher — A query bound once and evaluated against many documents
//!
//! The `Matcher` owns its query and carries no other state, so it can be
//! shared between threads and reused as a collection filter.

use crate::{evaluate, validate, Document, MatchError, MatchResult, TraversalState, Value};
use std::fmt::Debug;

/// A reusable query.
///
/// Every evaluation starts from a fresh, empty [`TraversalState`]; nothing
/// carries over from one document to the next.
///
/// # Example
///
/// ```
/// use docmatch::{Document, Matcher, Value};
///
/// let matcher = Matcher::new(Document::new().with("id", Document::new().with("$lt", 3)));
/// matcher.validate().unwrap();
///
/// let docs: Vec<Value> = (1..=4)
///     .map(|id| Value::from(Document::new().with("id", id)))
///     .collect();
/// let selected = matcher.filter(&docs).unwrap();
/// assert_eq!(selected.len(), 2);
/// ```
#[derive(Clone, PartialEq)]
pub struct Matcher {
    query: Document,
}

impl Matcher {
    /// Bind a query.
    #[must_use]
    pub fn new(query: Document) -> Self {
        Self { query }
    }

    /// The bound query.
    #[must_use]
    pub fn query(&self) -> &Document {
        &self.query
    }

    /// Check the query's shape without a document.
    ///
    /// Call this when the query is built to catch errors early.
    ///
    /// # Errors
    ///
    /// See [`validate`](crate::validate()).
    pub fn validate(&self) -> Result<(), MatchError> {
        validate(&self.query)
    }

    /// Evaluate against one document.
    ///
    /// # Errors
    ///
    /// Returns a [`MatchError`] if the query is malformed.
    pub fn evaluate(&self, doc: &Value) -> Result<MatchResult, MatchError> {
        evaluate(doc, &self.query, &TraversalState::new())
    }

    /// The verdict only.
    ///
    /// # Errors
    ///
    /// Returns a [`MatchError`] if the query is malformed.
    pub fn is_match(&self, doc: &Value) -> Result<bool, MatchError> {
        self.evaluate(doc).map(|result| result.matched)
    }

    /// Keep the matching documents, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first [`MatchError`].
    pub fn filter<'a, I>(&self, docs: I) -> Result<Vec<&'a Value>, MatchError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        select(&self.query, docs)
    }
}

/// The documents of `docs` that match a borrowed `query`, in order.
pub(crate) fn select<'a, I>(query: &Document, docs: I) -> Result<Vec<&'a Value>, MatchError>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut selected = Vec::new();
    for doc in docs {
        if evaluate(doc, query, &TraversalState::new())?.matched {
            selected.push(doc);
        }
    }
    Ok(selected)
}

impl From<Document> for Matcher {
    fn from(query: Document) -> Self {
        Self::new(query)
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("keys", &self.query.keys().collect::<Vec<_>>())
            .finish()
    }
}
