//! `Value` — The closed data model shared by documents and queries
//!
//! Documents and queries are the same tree: a [`Value`] is either a leaf
//! (primitive) or a container (`Array`, `Document`). Keeping the set of
//! variants closed makes every branch of the engine statically total.
//!
//! # Extensibility via `Identifier`
//!
//! Opaque identifiers (database object IDs and similar) are compared by
//! capability rather than by structure. Implement [`Identifier`] and wrap
//! the value with [`Value::id`]. [`ObjectId`] is the bundled implementation.

use crate::{MatchError, MAX_PATTERN_LENGTH};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::any::Any;
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

/// Capability trait for opaque identifier values.
///
/// Two identifiers are equal iff [`equals`](Identifier::equals) says so.
/// The engine never looks inside an identifier; structural equality and
/// pattern matching do not apply to it.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so documents can be matched from
/// several threads at once.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use docmatch::{Identifier, Value};
///
/// #[derive(Debug)]
/// struct UserId(u64);
///
/// impl Identifier for UserId {
///     fn equals(&self, other: &dyn Identifier) -> bool {
///         other
///             .as_any()
///             .downcast_ref::<UserId>()
///             .is_some_and(|o| o.0 == self.0)
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// assert_eq!(Value::id(UserId(7)), Value::id(UserId(7)));
/// assert_ne!(Value::id(UserId(7)), Value::id(UserId(8)));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Identifier`",
    label = "this type cannot be stored as an opaque identifier",
    note = "implement `equals(&self, &dyn Identifier) -> bool` and `as_any(&self) -> &dyn Any`"
)]
pub trait Identifier: Send + Sync + Debug {
    /// Returns `true` when `other` identifies the same entity.
    fn equals(&self, other: &dyn Identifier) -> bool;

    /// Returns a reference to `self` as `&dyn Any`, for downcasting in
    /// [`equals`](Identifier::equals).
    fn as_any(&self) -> &dyn Any;

    /// Human-readable type name, used in diagnostics.
    fn type_name(&self) -> &'static str {
        "identifier"
    }

    /// Textual form used when the identifier is rendered as JSON.
    fn to_id_string(&self) -> String {
        format!("{self:?}")
    }
}

/// A 12-byte object identifier, written as 24 hexadecimal characters.
///
/// A thin [`Identifier`] wrapper over [`bson::oid::ObjectId`].
///
/// ```
/// use docmatch::ObjectId;
///
/// let id: ObjectId = "507f1f77bcf86cd799439011".parse().unwrap();
/// assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(bson::oid::ObjectId);

impl ObjectId {
    /// Create an identifier from its raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bson::oid::ObjectId::from_bytes(bytes))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> [u8; 12] {
        self.0.bytes()
    }

    /// Parse a 24 character hexadecimal string.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidObjectId`] when the input is not exactly
    /// 24 hexadecimal characters.
    pub fn parse_str(s: &str) -> Result<Self, MatchError> {
        bson::oid::ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| MatchError::InvalidObjectId {
                value: s.to_owned(),
            })
    }

    /// Lowercase hexadecimal form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// The underlying BSON object id.
    #[must_use]
    pub const fn as_bson(&self) -> &bson::oid::ObjectId {
        &self.0
    }
}

impl From<bson::oid::ObjectId> for ObjectId {
    fn from(oid: bson::oid::ObjectId) -> Self {
        Self(oid)
    }
}

impl FromStr for ObjectId {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Identifier for ObjectId {
    fn equals(&self, other: &dyn Identifier) -> bool {
        other
            .as_any()
            .downcast_ref::<ObjectId>()
            .is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "object_id"
    }

    fn to_id_string(&self) -> String {
        self.to_hex()
    }
}

/// A compiled regular expression used as a query value.
///
/// When a pattern is the query side of an equality, a string document value
/// matches iff the pattern finds a match in it.
///
/// Uses the Rust `regex` crate (linear time, no backtracking).
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
    options: String,
}

impl Pattern {
    /// Compile a pattern without options.
    ///
    /// # Errors
    ///
    /// See [`Pattern::with_options`].
    pub fn new(source: impl Into<String>) -> Result<Self, MatchError> {
        Self::with_options(source, "")
    }

    /// Compile a pattern with `i`, `m`, `s` or `x` option flags.
    ///
    /// ```
    /// use docmatch::Pattern;
    ///
    /// let p = Pattern::with_options("^amanda", "i").unwrap();
    /// assert!(p.is_match("Amanda"));
    /// ```
    ///
    /// # Errors
    ///
    /// - [`MatchError::PatternTooLong`] if the source exceeds [`MAX_PATTERN_LENGTH`]
    /// - [`MatchError::InvalidPattern`] for unknown flags or a pattern that fails to compile
    pub fn with_options(source: impl Into<String>, options: &str) -> Result<Self, MatchError> {
        let source = source.into();
        if source.len() > MAX_PATTERN_LENGTH {
            return Err(MatchError::PatternTooLong {
                len: source.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }

        let mut full = String::with_capacity(source.len() + options.len() + 3);
        if !options.is_empty() {
            full.push_str("(?");
            for flag in options.chars() {
                match flag {
                    'i' | 'm' | 's' | 'x' => full.push(flag),
                    other => {
                        return Err(MatchError::InvalidPattern {
                            pattern: source,
                            message: format!("unknown regex option '{other}'"),
                        })
                    }
                }
            }
            full.push(')');
        }
        full.push_str(&source);

        let regex = Regex::new(&full).map_err(|e| MatchError::InvalidPattern {
            pattern: source.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            regex,
            source,
            options: options.to_owned(),
        })
    }

    /// Returns `true` if the pattern matches anywhere in `haystack`.
    #[inline]
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// The pattern source, without option flags.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The option flags the pattern was compiled with.
    #[must_use]
    pub fn options(&self) -> &str {
        &self.options
    }
}

// Two patterns are the same value when they were written the same way.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

/// A document or query node.
///
/// # Variants
///
/// - `Undefined` — an explicitly absent value (distinct from `Null`)
/// - `Null`, `Bool`, `Number`, `String` — JSON-like leaves
/// - `Date` — compared by millisecond instant
/// - `Id` — opaque identifier compared through [`Identifier::equals`]
/// - `Pattern` — regular expression, tests strings when used in a query
/// - `Array`, `Document` — containers
///
/// Every variant except `Array` and `Document` is a *primitive*.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// An explicitly absent value.
    #[default]
    Undefined,

    /// The null value.
    Null,

    /// A boolean.
    Bool(bool),

    /// A number. All numbers are IEEE doubles, so `1` and `1.0` are equal.
    Number(f64),

    /// A string.
    String(String),

    /// A point in time.
    Date(DateTime<Utc>),

    /// An opaque identifier.
    Id(Arc<dyn Identifier>),

    /// A regular expression.
    Pattern(Pattern),

    /// An ordered list of values.
    Array(Vec<Value>),

    /// A nested document.
    Document(Document),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Id(a), Self::Id(b)) => a.equals(b.as_ref()),
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Document(a), Self::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Wrap an [`Identifier`] implementation.
    pub fn id(id: impl Identifier + 'static) -> Self {
        Self::Id(Arc::new(id))
    }

    /// A date from milliseconds since the Unix epoch.
    ///
    /// Returns `None` when the timestamp is out of range.
    #[must_use]
    pub fn date_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(Self::Date)
    }

    /// Returns `true` for leaf values (everything except `Array` and `Document`).
    #[inline]
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Document(_))
    }

    /// Returns `true` if this is the `Undefined` variant.
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` if this is the `Null` variant.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a date.
    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Try to get the value as an identifier.
    #[inline]
    #[must_use]
    pub fn as_id(&self) -> Option<&dyn Identifier> {
        match self {
            Self::Id(id) => Some(id.as_ref()),
            _ => None,
        }
    }

    /// Try to get the value as a pattern.
    #[inline]
    #[must_use]
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Self::Pattern(p) => Some(p),
            _ => None,
        }
    }

    /// Try to get the value as an array slice.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get the value as a document.
    #[inline]
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Direct (non-dotted) key access.
    ///
    /// Documents are indexed by key, arrays by a decimal index such as `"0"`.
    /// Every other value has no keys.
    ///
    /// ```
    /// use docmatch::{Document, Value};
    ///
    /// let doc = Value::from(Document::new().with("tags", vec![Value::from("a")]));
    /// let tags = doc.get("tags").unwrap();
    /// assert_eq!(tags.get("0"), Some(&Value::from("a")));
    /// assert_eq!(tags.get("1"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Document(d) => d.get(key),
            Self::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Returns a string describing the type of this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Id(id) => id.type_name(),
            Self::Pattern(_) => "pattern",
            Self::Array(_) => "array",
            Self::Document(_) => "document",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)] // numbers are doubles by definition
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::Id(Arc::new(id))
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Self::Pattern(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Self::Document(d)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// An insertion-ordered mapping from string keys to values.
///
/// Key order decides the order in which explanation reasons are reported,
/// and two documents are equal only with the same entries in the same order.
/// Inserting an existing key replaces its value in place.
///
/// ```
/// use docmatch::{Document, Value};
///
/// let doc = Document::new().with("name", "Amanda").with("id", 1);
/// assert_eq!(doc.keys().collect::<Vec<_>>(), ["name", "id"]);
/// assert_eq!(doc.get("id"), Some(&Value::Number(1.0)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: IndexMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key-value pair (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous value for the key if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` if the key is present, whatever its value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K, V> FromIterator<(K, V)> for Document
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
