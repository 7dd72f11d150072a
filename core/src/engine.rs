//! The recursive matcher.
//!
//! Walks a query tree and a document tree in lock-step, one query document
//! at a time, and collects a [`Reason`](crate::Reason) for every comparison
//! that decided the verdict.
//!
//! # Aggregation
//!
//! A query document is the conjunction of its keys. Every key is evaluated.
//! While no key has failed the reasons of passing keys accumulate; once any
//! key fails the result carries only the failing keys' reasons.
//!
//! # Fatal errors
//!
//! Malformed payloads, unknown operators, and `$elemMatch` against a
//! non-array abort the whole evaluation with a [`MatchError`]. They are
//! never folded into a negative verdict.

use crate::classify::{classify, KeyKind, Operator};
use crate::equality::{compare_ordered, equal_primitive};
use crate::path::{join_path, resolve_path, TraversalState};
use crate::reason::{MatchResult, ReasonKind};
use crate::value::{Document, Value};
use crate::{MatchError, MAX_DEPTH};
use std::borrow::Cow;
use tracing::{debug, trace};

/// Stand-in for a dotted path that does not resolve.
static UNDEFINED: Value = Value::Undefined;

/// Evaluate `query` against the document node `doc`, starting from `state`.
///
/// Most callers want [`matches`](crate::matches) or a [`Matcher`](crate::Matcher),
/// which start from an empty state.
///
/// # Errors
///
/// Any [`MatchError`] raised by the query shape; see the module docs.
pub fn evaluate(
    doc: &Value,
    query: &Document,
    state: &TraversalState,
) -> Result<MatchResult, MatchError> {
    evaluate_node(doc, QueryNode::Document(query), state)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Query nodes
// ═══════════════════════════════════════════════════════════════════════════════

/// A query document, or an array used as a field value.
///
/// An array query is matched positionally: its keys are the element indices.
#[derive(Debug, Clone, Copy)]
pub(crate) enum QueryNode<'q> {
    Document(&'q Document),
    Array(&'q [Value]),
}

impl<'q> QueryNode<'q> {
    /// The node a non-leaf field value denotes, or `None` for a leaf.
    pub(crate) fn of(value: &'q Value) -> Option<Self> {
        match value {
            Value::Document(d) => Some(Self::Document(d)),
            Value::Array(items) => Some(Self::Array(items)),
            _ => None,
        }
    }

    pub(crate) fn is_empty(self) -> bool {
        match self {
            Self::Document(d) => d.is_empty(),
            Self::Array(items) => items.is_empty(),
        }
    }

    pub(crate) fn entries(self) -> Vec<(Cow<'q, str>, &'q Value)> {
        match self {
            Self::Document(d) => d.iter().map(|(k, v)| (Cow::Borrowed(k), v)).collect(),
            Self::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Cow::Owned(i.to_string()), v))
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════════════════════════════════════════

fn evaluate_node(
    doc: &Value,
    node: QueryNode<'_>,
    state: &TraversalState,
) -> Result<MatchResult, MatchError> {
    let state = enter(state)?;

    if node.is_empty() {
        return Ok(MatchResult::single(true, state.reason(ReasonKind::HasNoKeys)));
    }

    let mut failed = false;
    let mut passing = Vec::new();
    let mut failing = Vec::new();

    for (key, query_value) in node.entries() {
        let result = evaluate_key(doc, &key, query_value, &state)?;
        if result.matched {
            if !failed {
                passing.extend(result.reasons);
            }
        } else {
            failed = true;
            failing.extend(result.reasons);
        }
    }

    Ok(if failed {
        MatchResult::new(false, failing)
    } else {
        MatchResult::new(true, passing)
    })
}

fn evaluate_key(
    doc: &Value,
    key: &str,
    query_value: &Value,
    state: &TraversalState,
) -> Result<MatchResult, MatchError> {
    match classify(key) {
        KeyKind::Operator => {
            let Some(op) = Operator::from_key(key) else {
                return Err(fail(MatchError::InvalidOperator {
                    operator: key.to_owned(),
                    query_path: join_path(state.query_path(), key),
                }));
            };
            trace!(
                operator = %op,
                property_path = state.property_path(),
                query_path = state.query_path(),
                "dispatch"
            );
            evaluate_operator(op, doc, query_value, state)
        }
        KeyKind::Nested => {
            let state = state.extend(key, &format!("\"{key}\""));
            let value = resolve_path(doc, key).unwrap_or(&UNDEFINED);
            evaluate_field(value, query_value, &state)
        }
        KeyKind::Plain => {
            let state = state.extend(key, key);
            match doc.get(key) {
                Some(value) => evaluate_field(value, query_value, &state),
                None => Ok(MatchResult::single(
                    false,
                    state.reason(ReasonKind::HasNoPath),
                )),
            }
        }
    }
}

/// A document value against a field's query value: leaf means equality,
/// anything else is a sub-query.
fn evaluate_field(
    value: &Value,
    query_value: &Value,
    state: &TraversalState,
) -> Result<MatchResult, MatchError> {
    match QueryNode::of(query_value) {
        Some(node) => evaluate_node(value, node, state),
        None => Ok(MatchResult::single(
            equal_primitive(value, query_value),
            state.reason(ReasonKind::Equal),
        )),
    }
}

fn evaluate_operator(
    op: Operator,
    doc: &Value,
    payload: &Value,
    state: &TraversalState,
) -> Result<MatchResult, MatchError> {
    let state = state.with_query(op.as_str());

    match op {
        Operator::And | Operator::Or => {
            let clauses = require_clauses(op, payload, &state)?;
            // $and stops at the first failure, $or at the first success
            let decisive = op == Operator::Or;
            let mut reasons = Vec::new();
            for (i, clause) in clauses.into_iter().enumerate() {
                let clause_state = state.with_query(&format!("[{i}]"));
                let result = evaluate_node(doc, QueryNode::Document(clause), &clause_state)?;
                if result.matched == decisive {
                    return Ok(result);
                }
                reasons.extend(result.reasons);
            }
            Ok(MatchResult::new(!decisive, reasons))
        }

        Operator::Not => match payload {
            Value::Document(inner) => {
                Ok(evaluate_node(doc, QueryNode::Document(inner), &state)?.invert())
            }
            Value::Array(_) => Err(fail(MatchError::InvalidPayload {
                operator: op.as_str(),
                expected: "a query document or a primitive",
                query_path: state.query_path().to_owned(),
            })),
            leaf => Ok(MatchResult::single(
                !equal_primitive(doc, leaf),
                state.reason(ReasonKind::Equal),
            )),
        },

        Operator::Eq | Operator::Ne => {
            let leaf = require_primitive(op, payload, &state)?;
            let equal = equal_primitive(doc, leaf);
            Ok(if op == Operator::Eq {
                MatchResult::single(equal, state.reason(ReasonKind::Equal))
            } else {
                MatchResult::single(!equal, state.reason(ReasonKind::NotEqual))
            })
        }

        Operator::Compare(comparison) => {
            let leaf = require_primitive(op, payload, &state)?;
            Ok(MatchResult::single(
                compare_ordered(comparison, doc, leaf),
                state.reason(ReasonKind::Inequality),
            ))
        }

        Operator::In | Operator::Nin => {
            let set = require_set(op, payload, &state)?;
            let found = set.iter().any(|candidate| match doc {
                Value::Array(items) => items.iter().any(|item| equal_primitive(item, candidate)),
                value => equal_primitive(value, candidate),
            });
            Ok(if op == Operator::In {
                MatchResult::single(found, state.reason(ReasonKind::InSet))
            } else {
                MatchResult::single(!found, state.reason(ReasonKind::NotInSet))
            })
        }

        Operator::ElemMatch => {
            let sub_query = require_sub_query(op, payload, &state)?;
            let Value::Array(items) = doc else {
                return Err(fail(MatchError::NotAnArray {
                    operator: op.as_str(),
                    property_path: state.property_path().to_owned(),
                }));
            };
            if items.is_empty() {
                return Ok(MatchResult::single(
                    false,
                    state.reason(ReasonKind::ElementMatch),
                ));
            }

            let mut any_matched = false;
            let mut passing = Vec::new();
            let mut failing = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let item_state = state.with_property(&format!("[{i}]"));
                let result = evaluate_node(item, QueryNode::Document(sub_query), &item_state)?;
                if result.matched {
                    any_matched = true;
                    passing.extend(result.reasons);
                } else {
                    failing.extend(result.reasons);
                }
            }

            Ok(if any_matched {
                MatchResult::new(true, passing)
            } else {
                MatchResult::new(false, failing)
            })
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Payload checks (shared with validation)
// ═══════════════════════════════════════════════════════════════════════════════

/// Enter one more query node, enforcing [`MAX_DEPTH`].
pub(crate) fn enter(state: &TraversalState) -> Result<TraversalState, MatchError> {
    let next = state.descend();
    if next.depth() > MAX_DEPTH {
        return Err(fail(MatchError::DepthExceeded {
            depth: next.depth(),
            max: MAX_DEPTH,
        }));
    }
    Ok(next)
}

/// `$and` / `$or`: an array whose every element is a query document.
pub(crate) fn require_clauses<'q>(
    op: Operator,
    payload: &'q Value,
    state: &TraversalState,
) -> Result<Vec<&'q Document>, MatchError> {
    let invalid = || {
        fail(MatchError::InvalidPayload {
            operator: op.as_str(),
            expected: "an array of query documents",
            query_path: state.query_path().to_owned(),
        })
    };
    let Value::Array(items) = payload else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_document().ok_or_else(invalid))
        .collect()
}

/// `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`: a single primitive.
pub(crate) fn require_primitive<'q>(
    op: Operator,
    payload: &'q Value,
    state: &TraversalState,
) -> Result<&'q Value, MatchError> {
    if payload.is_primitive() {
        Ok(payload)
    } else {
        Err(fail(MatchError::InvalidPayload {
            operator: op.as_str(),
            expected: "a primitive",
            query_path: state.query_path().to_owned(),
        }))
    }
}

/// `$in` / `$nin`: an array of primitives.
pub(crate) fn require_set<'q>(
    op: Operator,
    payload: &'q Value,
    state: &TraversalState,
) -> Result<&'q [Value], MatchError> {
    let Value::Array(items) = payload else {
        return Err(fail(MatchError::InvalidPayload {
            operator: op.as_str(),
            expected: "an array of primitives",
            query_path: state.query_path().to_owned(),
        }));
    };
    if let Some(index) = items.iter().position(|item| !item.is_primitive()) {
        return Err(fail(MatchError::NonPrimitiveElement {
            operator: op.as_str(),
            index,
            query_path: state.query_path().to_owned(),
        }));
    }
    Ok(items)
}

/// `$elemMatch`: a single query document.
pub(crate) fn require_sub_query<'q>(
    op: Operator,
    payload: &'q Value,
    state: &TraversalState,
) -> Result<&'q Document, MatchError> {
    payload.as_document().ok_or_else(|| {
        fail(MatchError::InvalidPayload {
            operator: op.as_str(),
            expected: "a query document",
            query_path: state.query_path().to_owned(),
        })
    })
}

/// Log a rejected query on its way out.
pub(crate) fn fail(err: MatchError) -> MatchError {
    debug!(error = %err, "query rejected");
    err
}
