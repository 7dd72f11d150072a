//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the docmatch engine.
//!
//! A fixture binds one query to a list of cases. Queries and documents are
//! extended JSON (see `docmatch`'s `serde` feature), plus `{"$testId": n}`
//! for a [`NumericId`].
//!
//! ```yaml
//! name: missing-field
//! description: a plain key absent from the document
//! query: { a: 1 }
//! cases:
//!   - name: empty document
//!     document: {}
//!     expect: false
//!     reasons:
//!       - { propertyPath: a, queryPath: a, type: HAS_NO_PATH }
//! ```

use crate::NumericId;
use docmatch::prelude::*;
use serde::Deserialize;

/// Object key that marks a [`NumericId`] in fixture documents.
pub const TEST_ID: &str = "$testId";

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: serde_json::Value,
    pub cases: Vec<TestCase>,
}

/// Test case
///
/// At least one of `expect`, `reasons` or `error` must be given.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub document: serde_json::Value,
    /// Expected verdict.
    #[serde(default)]
    pub expect: Option<bool>,
    /// Expected reasons, exactly and in order.
    #[serde(default)]
    pub reasons: Option<Vec<Reason>>,
    /// Expected error, by variant name (e.g. `InvalidOperator`).
    #[serde(default)]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Conversion
// ═══════════════════════════════════════════════════════════════════════════════

/// Convert fixture JSON into a [`Value`], resolving `$testId` objects.
///
/// # Errors
///
/// Any extended-JSON conversion error.
pub fn to_value(json: serde_json::Value) -> Result<Value, MatchError> {
    Value::try_from(json).map(resolve_test_ids)
}

/// Convert fixture JSON into a query [`Document`].
///
/// # Errors
///
/// [`MatchError::NotADocument`] if the JSON is not an object, or any
/// extended-JSON conversion error.
pub fn to_document(json: serde_json::Value) -> Result<Document, MatchError> {
    match to_value(json)? {
        Value::Document(doc) => Ok(doc),
        other => Err(MatchError::NotADocument {
            found: other.type_name(),
        }),
    }
}

fn resolve_test_ids(value: Value) -> Value {
    match value {
        Value::Document(doc) => {
            if let Some(id) = test_id(&doc) {
                return NumericId::value(id);
            }
            Value::Document(
                doc.into_iter()
                    .map(|(key, value)| (key, resolve_test_ids(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(resolve_test_ids).collect()),
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation)] // fixture ids are small integers
fn test_id(doc: &Document) -> Option<i64> {
    if doc.len() != 1 {
        return None;
    }
    doc.get(TEST_ID)
        .and_then(Value::as_f64)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
}

/// Stable name of an error variant, as written in fixtures.
#[must_use]
pub fn error_name(err: &MatchError) -> &'static str {
    match err {
        MatchError::InvalidOperator { .. } => "InvalidOperator",
        MatchError::InvalidPayload { .. } => "InvalidPayload",
        MatchError::NonPrimitiveElement { .. } => "NonPrimitiveElement",
        MatchError::NotAnArray { .. } => "NotAnArray",
        MatchError::DepthExceeded { .. } => "DepthExceeded",
        MatchError::InvalidPattern { .. } => "InvalidPattern",
        MatchError::PatternTooLong { .. } => "PatternTooLong",
        MatchError::InvalidDate { .. } => "InvalidDate",
        MatchError::InvalidObjectId { .. } => "InvalidObjectId",
        MatchError::NotADocument { .. } => "NotADocument",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    /// What went wrong, when the case failed.
    pub message: Option<String>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let query = to_document(self.query.clone());
        self.cases
            .iter()
            .map(|case| {
                let outcome = query.clone().and_then(|query| {
                    let doc = to_value(case.document.clone())?;
                    docmatch::matches(&query, &doc)
                });
                let message = case.check(&outcome);
                CaseResult {
                    case_name: case.name.clone(),
                    passed: message.is_none(),
                    message,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self.run();
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: {}",
                self.name,
                result.case_name,
                result.message.unwrap_or_default()
            );
        }
    }
}

impl TestCase {
    /// Compare an outcome with this case's expectations.
    ///
    /// Returns a description of the first mismatch, or `None` if it passes.
    #[must_use]
    pub fn check(&self, outcome: &Result<MatchResult, MatchError>) -> Option<String> {
        if self.expect.is_none() && self.reasons.is_none() && self.error.is_none() {
            return Some("case declares no expectation".to_owned());
        }

        let result = match (outcome, &self.error) {
            (Err(err), Some(expected)) if error_name(err) == expected.as_str() => return None,
            (Err(err), _) => {
                return Some(format!(
                    "expected {}, got error {}: {err}",
                    self.error.as_deref().unwrap_or("a result"),
                    error_name(err)
                ))
            }
            (Ok(result), Some(expected)) => {
                return Some(format!("expected error {expected}, got {result:?}"))
            }
            (Ok(result), None) => result,
        };

        if let Some(expected) = self.expect {
            if result.matched != expected {
                return Some(format!(
                    "expected match={expected}, got match={} with {:?}",
                    result.matched, result.reasons
                ));
            }
        }
        if let Some(expected) = &self.reasons {
            if &result.reasons != expected {
                return Some(format!(
                    "expected reasons {expected:?}, got {:?}",
                    result.reasons
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_FIELD: &str = r"
name: missing-field
description: a plain key absent from the document
query: { a: 1 }
cases:
  - name: empty document
    document: {}
    expect: false
    reasons:
      - { propertyPath: a, queryPath: a, type: HAS_NO_PATH }
  - name: present
    document: { a: 1 }
    expect: true
";

    #[test]
    fn test_parse_and_run() {
        let fixture = Fixture::from_yaml(MISSING_FIELD).unwrap();
        assert_eq!(fixture.name, "missing-field");
        assert_eq!(fixture.cases.len(), 2);
        let results = fixture.run();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn test_multi_document_yaml() {
        let yaml = format!("{MISSING_FIELD}---{MISSING_FIELD}");
        assert_eq!(Fixture::from_yaml_multi(&yaml).unwrap().len(), 2);
    }

    #[test]
    fn test_wrong_expectation_is_reported() {
        let fixture = Fixture::from_yaml(
            r"
name: wrong
query: { a: 1 }
cases:
  - name: claims a match
    document: {}
    expect: true
",
        )
        .unwrap();
        let results = fixture.run();
        assert!(!results[0].passed);
        assert!(results[0].message.as_deref().unwrap().contains("match=false"));
    }

    #[test]
    fn test_expected_error() {
        let fixture = Fixture::from_yaml(
            r#"
name: unknown operator
query: { "$where": "1" }
cases:
  - name: any document
    document: {}
    error: InvalidOperator
  - name: no expectation
    document: {}
"#,
        )
        .unwrap();
        let results = fixture.run();
        assert!(results[0].passed, "{results:?}");
        assert!(!results[1].passed);
    }

    #[test]
    fn test_test_ids_resolve() {
        let value = to_value(serde_json::json!({"_id": {"$testId": 3}, "n": {"$testId": 1, "x": 2}})).unwrap();
        assert_eq!(value.get("_id"), Some(&NumericId::value(3)));
        assert!(value.get("n").and_then(Value::as_document).is_some());
    }

    #[test]
    fn test_query_must_be_document() {
        assert!(matches!(
            to_document(serde_json::json!([1, 2])),
            Err(MatchError::NotADocument { found: "array" })
        ));
    }
}
