//! Static query validation.
//!
//! Checks a query's shape without a document, so a malformed query can be
//! rejected once instead of on every evaluation. Uses the same payload checks
//! as the engine, so the errors are identical.

use crate::classify::{classify, KeyKind, Operator};
use crate::engine::{
    enter, fail, require_clauses, require_primitive, require_set, require_sub_query, QueryNode,
};
use crate::path::{join_path, TraversalState};
use crate::value::{Document, Value};
use crate::MatchError;

/// Validate a query document.
///
/// Reports the first error the engine could raise from the query alone:
/// unknown operators, malformed payloads, non-primitive `$in`/`$nin`
/// elements, and nesting deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
///
/// `$elemMatch` against a non-array depends on the document and cannot be
/// detected here.
///
/// ```
/// use docmatch::{validate, Document, MatchError};
///
/// let ok = Document::new().with("age", Document::new().with("$gte", 21));
/// assert!(validate(&ok).is_ok());
///
/// let bad = Document::new().with("age", Document::new().with("$gte", Document::new()));
/// assert!(matches!(validate(&bad), Err(MatchError::InvalidPayload { .. })));
/// ```
///
/// # Errors
///
/// The first [`MatchError`] found, in key order.
pub fn validate(query: &Document) -> Result<(), MatchError> {
    validate_node(QueryNode::Document(query), &TraversalState::new())
}

fn validate_node(node: QueryNode<'_>, state: &TraversalState) -> Result<(), MatchError> {
    let state = enter(state)?;
    for (key, value) in node.entries() {
        validate_key(&key, value, &state)?;
    }
    Ok(())
}

fn validate_key(key: &str, value: &Value, state: &TraversalState) -> Result<(), MatchError> {
    match classify(key) {
        KeyKind::Operator => {
            let op = Operator::from_key(key).ok_or_else(|| {
                fail(MatchError::InvalidOperator {
                    operator: key.to_owned(),
                    query_path: join_path(state.query_path(), key),
                })
            })?;
            validate_operator(op, value, &state.with_query(key))
        }
        KeyKind::Nested => validate_field(value, &state.extend(key, &format!("\"{key}\""))),
        KeyKind::Plain => validate_field(value, &state.extend(key, key)),
    }
}

fn validate_field(value: &Value, state: &TraversalState) -> Result<(), MatchError> {
    match QueryNode::of(value) {
        Some(node) => validate_node(node, state),
        None => Ok(()),
    }
}

fn validate_operator(op: Operator, payload: &Value, state: &TraversalState) -> Result<(), MatchError> {
    match op {
        Operator::And | Operator::Or => {
            for (i, clause) in require_clauses(op, payload, state)?.into_iter().enumerate() {
                validate_node(
                    QueryNode::Document(clause),
                    &state.with_query(&format!("[{i}]")),
                )?;
            }
            Ok(())
        }
        Operator::Not => match payload {
            Value::Document(inner) => validate_node(QueryNode::Document(inner), state),
            Value::Array(_) => Err(MatchError::InvalidPayload {
                operator: op.as_str(),
                expected: "a query document or a primitive",
                query_path: state.query_path().to_owned(),
            }),
            _ => Ok(()),
        },
        Operator::Eq | Operator::Ne | Operator::Compare(_) => {
            require_primitive(op, payload, state).map(|_| ())
        }
        Operator::In | Operator::Nin => require_set(op, payload, state).map(|_| ()),
        Operator::ElemMatch => {
            let sub_query = require_sub_query(op, payload, state)?;
            validate_node(QueryNode::Document(sub_query), state)
        }
    }
}
