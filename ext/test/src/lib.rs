//! docmatch-test: conformance fixtures and a reference identifier extension
//!
//! [`NumericId`] is the reference [`Identifier`] implementation: the smallest
//! type a host application would write to plug its own ids into the engine.
//! With the `fixtures` feature, [`fixture`] runs YAML conformance fixtures.
//!
//! # Example
//!
//! ```
//! use docmatch_test::prelude::*;
//!
//! let doc = Value::from(Document::new().with("_id", NumericId::value(1)));
//! let query = Document::new().with(
//!     "_id",
//!     Document::new().with("$in", vec![NumericId::value(1), NumericId::value(2)]),
//! );
//! assert!(docmatch::matches(&query, &doc).unwrap().matched);
//! ```

use docmatch::prelude::*;
use std::any::Any;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// An identifier backed by an integer.
///
/// Equal only to another `NumericId` with the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericId(pub i64);

impl NumericId {
    /// Wrap a number as an identifier [`Value`].
    #[must_use]
    pub fn value(n: i64) -> Value {
        Value::id(Self(n))
    }
}

impl Identifier for NumericId {
    fn equals(&self, other: &dyn Identifier) -> bool {
        other
            .as_any()
            .downcast_ref::<NumericId>()
            .is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "numeric_id"
    }

    fn to_id_string(&self) -> String {
        self.0.to_string()
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::NumericId;
    pub use docmatch::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_equality() {
        assert_eq!(NumericId::value(1), NumericId::value(1));
        assert_ne!(NumericId::value(1), NumericId::value(2));
        assert_ne!(NumericId::value(1), Value::from(1));
    }

    #[test]
    fn test_numeric_id_never_equals_object_id() {
        let oid = ObjectId::from_bytes([0; 12]);
        assert!(!NumericId(0).equals(&oid));
        assert!(!oid.equals(&NumericId(0)));
    }

    #[test]
    fn test_numeric_id_type_name() {
        assert_eq!(NumericId::value(7).type_name(), "numeric_id");
    }

    #[test]
    fn test_ids_in_sets() {
        let doc = Value::from(Document::new().with("_id", NumericId::value(1)));
        let query = Document::new().with(
            "$and",
            vec![
                Value::from(Document::new().with(
                    "_id",
                    Document::new().with("$in", vec![NumericId::value(1), NumericId::value(2)]),
                )),
                Value::from(Document::new().with(
                    "_id",
                    Document::new().with("$nin", vec![NumericId::value(3)]),
                )),
            ],
        );
        let result = docmatch::matches(&query, &doc).unwrap();
        assert!(result.matched);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.reasons[0].kind, ReasonKind::InSet);
        assert_eq!(result.reasons[1].kind, ReasonKind::NotInSet);
    }
}
