//! Extended JSON conversion (feature `serde`).
//!
//! JSON has no dates, identifiers, patterns or `undefined`, so those leaves
//! travel as single-purpose objects:
//!
//! | JSON | Value |
//! |------|-------|
//! | `{"$date": "2020-01-01T00:00:00Z"}` or `{"$date": 1577836800000}` | `Date` |
//! | `{"$oid": "507f1f77bcf86cd799439011"}` | `Id(ObjectId)` |
//! | `{"$regex": "^A", "$options": "i"}` | `Pattern` (`$options` optional) |
//! | `{"$undefined": true}` | `Undefined` |
//!
//! Any other object is a [`Document`], with key order preserved. Object ids
//! and RFC 3339 dates are parsed with `bson`.
//!
//! ```
//! use docmatch::{Document, Value};
//! use serde_json::json;
//!
//! let query = Document::try_from(json!({"name": {"$regex": "^am", "$options": "i"}})).unwrap();
//! let doc = Value::try_from(json!({"name": "Amanda"})).unwrap();
//! assert!(docmatch::matches(&query, &doc).unwrap().matched);
//! ```

use crate::value::{Document, ObjectId, Pattern, Value};
use crate::MatchError;
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

const DATE: &str = "$date";
const OID: &str = "$oid";
const REGEX: &str = "$regex";
const OPTIONS: &str = "$options";
const UNDEFINED: &str = "$undefined";

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl TryFrom<Json> for Value {
    type Error = MatchError;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        Ok(match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => from_object(map)?,
        })
    }
}

impl TryFrom<Json> for Document {
    type Error = MatchError;

    /// A JSON object that is not one of the special leaf forms.
    fn try_from(json: Json) -> Result<Self, Self::Error> {
        match json {
            Json::Object(map) => match from_object(map)? {
                Value::Document(doc) => Ok(doc),
                other => Err(MatchError::NotADocument {
                    found: other.type_name(),
                }),
            },
            other => Err(MatchError::NotADocument {
                found: json_type_name(&other),
            }),
        }
    }
}

fn from_object(map: Map<String, Json>) -> Result<Value, MatchError> {
    if let Some(leaf) = special_form(&map)? {
        return Ok(leaf);
    }
    map.into_iter()
        .map(|(key, value)| Ok((key, Value::try_from(value)?)))
        .collect::<Result<Document, MatchError>>()
        .map(Value::Document)
}

fn special_form(map: &Map<String, Json>) -> Result<Option<Value>, MatchError> {
    let mut keys = map.keys().map(String::as_str);
    let (first, second) = (keys.next(), keys.next());
    if keys.next().is_some() {
        return Ok(None);
    }

    let leaf = match (first, second) {
        (Some(DATE), None) => parse_date(&map[DATE])?,
        (Some(OID), None) => parse_oid(&map[OID])?,
        (Some(REGEX), None) => parse_regex(&map[REGEX], None)?,
        (Some(REGEX), Some(OPTIONS)) | (Some(OPTIONS), Some(REGEX)) => {
            parse_regex(&map[REGEX], Some(&map[OPTIONS]))?
        }
        (Some(UNDEFINED), None) if map[UNDEFINED] == Json::Bool(true) => Value::Undefined,
        _ => return Ok(None),
    };
    Ok(Some(leaf))
}

fn parse_date(json: &Json) -> Result<Value, MatchError> {
    let invalid = || MatchError::InvalidDate {
        value: json.to_string(),
    };
    match json {
        Json::String(s) => bson::DateTime::parse_rfc3339_str(s)
            .ok()
            .and_then(|d| Value::date_millis(d.timestamp_millis()))
            .ok_or_else(invalid),
        Json::Number(n) => n
            .as_i64()
            .and_then(Value::date_millis)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_oid(json: &Json) -> Result<Value, MatchError> {
    match json {
        Json::String(s) => ObjectId::parse_str(s).map(Value::from),
        other => Err(MatchError::InvalidObjectId {
            value: other.to_string(),
        }),
    }
}

fn parse_regex(source: &Json, options: Option<&Json>) -> Result<Value, MatchError> {
    let not_a_string = |json: &Json| MatchError::InvalidPattern {
        pattern: json.to_string(),
        message: "expected a string".to_owned(),
    };
    let Json::String(source) = source else {
        return Err(not_a_string(source));
    };
    let options = match options {
        None => "",
        Some(Json::String(o)) => o.as_str(),
        Some(other) => return Err(not_a_string(other)),
    };
    Pattern::with_options(source.as_str(), options).map(Value::Pattern)
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

impl From<&Value> for Json {
    fn from(value: &Value) -> Self {
        match value {
            Value::Undefined => single(UNDEFINED, Json::Bool(true)),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(d) => single(
                DATE,
                Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
            Value::Id(id) => match id.as_any().downcast_ref::<ObjectId>() {
                Some(oid) => single(OID, Json::String(oid.to_hex())),
                None => single("$id", Json::String(id.to_id_string())),
            },
            Value::Pattern(p) => {
                let mut map = Map::new();
                map.insert(REGEX.to_owned(), Json::String(p.source().to_owned()));
                if !p.options().is_empty() {
                    map.insert(OPTIONS.to_owned(), Json::String(p.options().to_owned()));
                }
                Json::Object(map)
            }
            Value::Array(items) => Json::Array(items.iter().map(Json::from).collect()),
            Value::Document(doc) => Json::from(doc),
        }
    }
}

impl From<&Document> for Json {
    fn from(doc: &Document) -> Self {
        Json::Object(
            doc.iter()
                .map(|(key, value)| (key.to_owned(), Json::from(value)))
                .collect(),
        )
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        Json::from(&value)
    }
}

fn single(key: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_owned(), value);
    Json::Object(map)
}

#[allow(clippy::cast_possible_truncation)] // guarded by the integral range check
fn number(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Json::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}
