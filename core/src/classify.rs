//! Query key classification and the closed operator set.

use std::fmt;

/// What a query key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Starts with `$`: selects operator semantics.
    Operator,
    /// Contains `.`: addresses a nested document path.
    Nested,
    /// Anything else: a direct field of the current document node.
    Plain,
}

/// Classify a query key.
///
/// Pure function of the key string.
///
/// ```
/// use docmatch::{classify, KeyKind};
///
/// assert_eq!(classify("$and"), KeyKind::Operator);
/// assert_eq!(classify("address.city"), KeyKind::Nested);
/// assert_eq!(classify("name"), KeyKind::Plain);
/// ```
#[must_use]
pub fn classify(key: &str) -> KeyKind {
    if key.starts_with('$') {
        KeyKind::Operator
    } else if key.contains('.') {
        KeyKind::Nested
    } else {
        KeyKind::Plain
    }
}

/// Ordering comparison operators.
///
/// Semantics are query-relative: the query operand is the bound and the
/// document value must lie on the named side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `$gt`: document value greater than the bound.
    Gt,
    /// `$gte`: document value greater than or equal to the bound.
    Gte,
    /// `$lt`: document value less than the bound.
    Lt,
    /// `$lte`: document value less than or equal to the bound.
    Lte,
}

impl Comparison {
    /// The operator key, e.g. `"$gte"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

/// Every operator the engine understands.
///
/// Dispatch is an exhaustive `match` over this enum; an unknown `$` key
/// never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$and`: every clause matches.
    And,
    /// `$or`: at least one clause matches.
    Or,
    /// `$not`: inverts the inner verdict.
    Not,
    /// `$eq`: primitive equality.
    Eq,
    /// `$ne`: primitive inequality.
    Ne,
    /// `$gt`, `$gte`, `$lt`, `$lte`.
    Compare(Comparison),
    /// `$in`: value in set.
    In,
    /// `$nin`: value not in set.
    Nin,
    /// `$elemMatch`: some array element matches a sub-query.
    ElemMatch,
}

impl Operator {
    /// Look up an operator by its key. Returns `None` for unknown keys.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "$and" => Self::And,
            "$or" => Self::Or,
            "$not" => Self::Not,
            "$eq" => Self::Eq,
            "$ne" => Self::Ne,
            "$gt" => Self::Compare(Comparison::Gt),
            "$gte" => Self::Compare(Comparison::Gte),
            "$lt" => Self::Compare(Comparison::Lt),
            "$lte" => Self::Compare(Comparison::Lte),
            "$in" => Self::In,
            "$nin" => Self::Nin,
            "$elemMatch" => Self::ElemMatch,
            _ => return None,
        })
    }

    /// The operator key, e.g. `"$elemMatch"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
            Self::Not => "$not",
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Compare(c) => c.as_str(),
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::ElemMatch => "$elemMatch",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_keys_win_over_dots() {
        assert_eq!(classify("$a.b"), KeyKind::Operator);
    }

    #[test]
    fn empty_key_is_plain() {
        assert_eq!(classify(""), KeyKind::Plain);
    }

    #[test]
    fn from_key_round_trips_every_operator() {
        for key in [
            "$and",
            "$or",
            "$not",
            "$eq",
            "$ne",
            "$gt",
            "$gte",
            "$lt",
            "$lte",
            "$in",
            "$nin",
            "$elemMatch",
        ] {
            let op = Operator::from_key(key).unwrap();
            assert_eq!(op.as_str(), key);
            assert_eq!(op.to_string(), key);
        }
    }

    #[test]
    fn unknown_operators_are_none() {
        assert_eq!(Operator::from_key("$where"), None);
        assert_eq!(Operator::from_key("$elemmatch"), None);
        assert_eq!(Operator::from_key("and"), None);
    }
}
