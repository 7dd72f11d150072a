//! Type-aware comparison of leaf values.
//!
//! Equality is asymmetric: the right-hand side is always the *query* value,
//! because only a query value can carry a pattern that tests a string.

use crate::classify::Comparison;
use crate::value::Value;
use std::cmp::Ordering;

/// Compare a document value against a query value for equality.
///
/// Rules, in order:
///
/// 1. An identifier on either side: equal only when both are identifiers and
///    [`Identifier::equals`](crate::Identifier::equals) agrees.
/// 2. Dates: equal when they denote the same millisecond. A date never equals
///    anything else.
/// 3. Pattern query value: a string document value must match it; any other
///    document value must be the same pattern.
/// 4. Otherwise strict equality with no coercion (`Null` is not `Undefined`,
///    `NaN` is not `NaN`).
///
/// ```
/// use docmatch::{equal_primitive, Pattern, Value};
///
/// let pattern = Value::from(Pattern::new("^Am").unwrap());
/// assert!(equal_primitive(&Value::from("Amanda"), &pattern));
/// assert!(!equal_primitive(&Value::Null, &Value::Undefined));
/// ```
#[must_use]
pub fn equal_primitive(value: &Value, query: &Value) -> bool {
    match (value, query) {
        (Value::Id(a), Value::Id(b)) => a.equals(b.as_ref()),
        (Value::Id(_), _) | (_, Value::Id(_)) => false,
        (Value::Date(a), Value::Date(b)) => a.timestamp_millis() == b.timestamp_millis(),
        (Value::Date(_), _) | (_, Value::Date(_)) => false,
        (Value::String(s), Value::Pattern(p)) => p.is_match(s),
        _ => value == query,
    }
}

/// Evaluate an ordering operator.
///
/// Both sides must be numbers, strings, or dates; any other pairing is simply
/// `false`. The query value is the bound: `$gt` holds when
/// `query < value`, `$lte` when `query >= value`, and so on.
///
/// ```
/// use docmatch::{compare_ordered, Comparison, Value};
///
/// assert!(compare_ordered(Comparison::Gt, &Value::from(5), &Value::from(3)));
/// assert!(!compare_ordered(Comparison::Gt, &Value::from("5"), &Value::from(3)));
/// ```
#[must_use]
pub fn compare_ordered(op: Comparison, value: &Value, query: &Value) -> bool {
    let Some(order) = order(query, value) else {
        return false;
    };
    match op {
        Comparison::Gt => order == Ordering::Less,
        Comparison::Gte => order != Ordering::Greater,
        Comparison::Lt => order == Ordering::Greater,
        Comparison::Lte => order != Ordering::Less,
    }
}

/// Ordering of `query` relative to `value`, if the two are comparable.
fn order(query: &Value, value: &Value) -> Option<Ordering> {
    match (query, value) {
        (Value::Number(q), Value::Number(v)) => q.partial_cmp(v),
        (Value::String(q), Value::String(v)) => Some(q.cmp(v)),
        (Value::Date(q), Value::Date(v)) => {
            Some(q.timestamp_millis().cmp(&v.timestamp_millis()))
        }
        _ => None,
    }
}
