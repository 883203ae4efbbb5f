// In: src/json/value.rs

//! The immutable JSON entity taxonomy.
//!
//! Children of arrays and objects are supplied at construction time and never
//! mutated, so ownership is always a tree. Narrowing (`as_long` and friends)
//! fails with a type-mismatch error instead of coercing.

use std::fmt;

use crate::error::BulkrowError;

//==================================================================================
// 1. Discriminants
//==================================================================================

/// The discriminant of a `JsonValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Null,
    Boolean,
    Long,
    Double,
    String,
    Array,
    Object,
}

impl EntityType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Long => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//==================================================================================
// 2. String and Object payloads
//==================================================================================

/// A JSON string value, optionally carrying a caller-supplied pre-escaped
/// literal. `to_json()` emits the literal verbatim when present; `value()`
/// and equality always reflect the decoded text. This lets a parser keep the
/// original formatting without re-escaping.
#[derive(Debug, Clone)]
pub struct JsonString {
    value: String,
    literal: Option<String>,
}

impl JsonString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            literal: None,
        }
    }

    /// `literal` must be a valid JSON string token (including the quotes)
    /// that decodes to `value`; this is not re-verified here.
    pub fn with_literal(value: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            literal: Some(literal.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }
}

/// Equality sees the decoded value only, never the literal cache.
impl PartialEq for JsonString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// An insertion-ordered JSON object with unique keys.
#[derive(Debug, Clone, Default)]
pub struct JsonObject {
    entries: Vec<(String, JsonValue)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`. A duplicate key keeps its original
    /// position but takes the new value (last write wins).
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, JsonValue)> for JsonObject {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

/// Key-set/value equality, independent of insertion order. Keys are unique,
/// so matching lengths plus one-directional containment is sufficient.
impl PartialEq for JsonObject {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

//==================================================================================
// 3. JsonValue
//==================================================================================

/// An immutable JSON value: exactly one of the seven entities.
///
/// Being a closed enum, equality is structural per-variant and only ever
/// defined between `JsonValue`s; a look-alike foreign type cannot compare
/// equal because it cannot exist in this position at all.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(JsonString),
    Array(Vec<JsonValue>),
    Object(JsonObject),
}

impl JsonValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(JsonString::new(value))
    }

    /// A string entity that renders `literal` verbatim in `to_json()`.
    pub fn string_with_literal(value: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::String(JsonString::with_literal(value, literal))
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Null => EntityType::Null,
            Self::Boolean(_) => EntityType::Boolean,
            Self::Long(_) => EntityType::Long,
            Self::Double(_) => EntityType::Double,
            Self::String(_) => EntityType::String,
            Self::Array(_) => EntityType::Array,
            Self::Object(_) => EntityType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Self::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn as_boolean(&self) -> Result<bool, BulkrowError> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(EntityType::Boolean)),
        }
    }

    pub fn as_long(&self) -> Result<i64, BulkrowError> {
        match self {
            Self::Long(n) => Ok(*n),
            other => Err(other.mismatch(EntityType::Long)),
        }
    }

    pub fn as_double(&self) -> Result<f64, BulkrowError> {
        match self {
            Self::Double(d) => Ok(*d),
            other => Err(other.mismatch(EntityType::Double)),
        }
    }

    pub fn as_string(&self) -> Result<&JsonString, BulkrowError> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch(EntityType::String)),
        }
    }

    pub fn as_array(&self) -> Result<&[JsonValue], BulkrowError> {
        match self {
            Self::Array(values) => Ok(values),
            other => Err(other.mismatch(EntityType::Array)),
        }
    }

    pub fn as_object(&self) -> Result<&JsonObject, BulkrowError> {
        match self {
            Self::Object(object) => Ok(object),
            other => Err(other.mismatch(EntityType::Object)),
        }
    }

    fn mismatch(&self, expected: EntityType) -> BulkrowError {
        BulkrowError::JsonTypeMismatch {
            expected: expected.name(),
            actual: self.entity_type().name(),
        }
    }

    /// A fast, conservative estimate of this value's in-memory footprint.
    ///
    /// Strictly positive even for empty containers. Used only to drive the
    /// `PageBuilder` flush heuristic, never for exact accounting; the
    /// additive constants are tuning parameters, not format semantics.
    pub fn presume_reference_size_in_bytes(&self) -> usize {
        match self {
            Self::Null => 1,
            Self::Boolean(_) => 1,
            Self::Long(_) => 8,
            Self::Double(_) => 8,
            Self::String(s) => 8 + s.value.len() * 2,
            Self::Array(values) => {
                4 + values
                    .iter()
                    .map(JsonValue::presume_reference_size_in_bytes)
                    .sum::<usize>()
            }
            Self::Object(object) => {
                4 + object
                    .iter()
                    .map(|(key, value)| {
                        8 + key.len() * 2 + value.presume_reference_size_in_bytes()
                    })
                    .sum::<usize>()
            }
        }
    }

    /// Renders canonical JSON text.
    ///
    /// Non-finite doubles have no JSON representation and render as `null`.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Boolean(true) => out.push_str("true"),
            Self::Boolean(false) => out.push_str("false"),
            Self::Long(n) => out.push_str(&n.to_string()),
            Self::Double(d) => {
                if d.is_finite() {
                    // f64 Display is the shortest round-trip decimal, which
                    // is also valid JSON for finite values.
                    out.push_str(&d.to_string());
                } else {
                    out.push_str("null");
                }
            }
            Self::String(s) => match &s.literal {
                Some(literal) => out.push_str(literal),
                None => write_escaped(out, &s.value),
            },
            Self::Array(values) => {
                out.push('[');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    value.write_json(out);
                }
                out.push(']');
            }
            Self::Object(object) => {
                out.push('{');
                for (i, (key, value)) in object.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_escaped(out, key);
                    out.push(':');
                    value.write_json(out);
                }
                out.push('}');
            }
        }
    }

    /// Parses external JSON text. Malformed input surfaces as a distinct
    /// parse failure, never a silent null.
    pub fn from_text(text: &str) -> Result<Self, BulkrowError> {
        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| BulkrowError::JsonParseError(e.to_string()))?;
        Ok(Self::from_serde(parsed))
    }

    fn from_serde(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(long) = n.as_i64() {
                    Self::Long(long)
                } else {
                    // u64 beyond i64::MAX and any float both land on double.
                    Self::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::string(s),
            serde_json::Value::Array(values) => {
                Self::Array(values.into_iter().map(Self::from_serde).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_serde(v)))
                    .collect(),
            ),
        }
    }
}

/// `Display` delegates to the canonical rendering.
impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

//==================================================================================
// 4. Escaping helpers
//==================================================================================

/// Writes `text` as a quoted JSON string token. Backslash, quote and the
/// control range 0x00-0x1F use the RFC 8259 short escapes where defined and
/// `\u00XX` otherwise.
fn write_escaped(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowing_never_coerces() {
        let value = JsonValue::Boolean(true);
        assert!(value.is_boolean());
        assert!(!value.is_long());
        assert!(matches!(
            value.as_long(),
            Err(BulkrowError::JsonTypeMismatch {
                expected: "long",
                actual: "boolean",
            })
        ));
        assert!(value.as_boolean().unwrap());
    }

    #[test]
    fn test_to_json_escapes_quote_backslash_and_controls() {
        let value = JsonValue::string("a\\\"b\n");
        assert_eq!(value.to_json(), r#""a\\\"b\n""#);

        let control = JsonValue::string("\u{0001}\t");
        assert_eq!(control.to_json(), "\"\\u0001\\t\"");
    }

    #[test]
    fn test_string_literal_cache_is_used_verbatim_but_invisible_to_equality() {
        let plain = JsonValue::string("a/b");
        let cached = JsonValue::string_with_literal("a/b", r#""a\/b""#);

        assert_eq!(cached.to_json(), r#""a\/b""#);
        assert_eq!(plain.to_json(), r#""a/b""#);
        assert_eq!(plain, cached);
        assert_eq!(cached.as_string().unwrap().value(), "a/b");
    }

    #[test]
    fn test_object_equality_ignores_insertion_order() {
        let ab: JsonObject = [
            ("a".to_string(), JsonValue::Long(1)),
            ("b".to_string(), JsonValue::Long(2)),
        ]
        .into_iter()
        .collect();
        let ba: JsonObject = [
            ("b".to_string(), JsonValue::Long(2)),
            ("a".to_string(), JsonValue::Long(1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(JsonValue::Object(ab.clone()), JsonValue::Object(ba));
        // Rendering still follows insertion order.
        assert_eq!(JsonValue::Object(ab).to_json(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_duplicate_keys_are_last_write_wins() {
        let mut object = JsonObject::new();
        object.insert("k", JsonValue::Long(1));
        object.insert("k", JsonValue::Long(2));
        assert_eq!(object.len(), 1);
        assert_eq!(object.get("k"), Some(&JsonValue::Long(2)));
    }

    #[test]
    fn test_presumed_size_is_strictly_positive_for_empty_entities() {
        assert!(JsonValue::string("").presume_reference_size_in_bytes() > 0);
        assert!(JsonValue::Array(Vec::new()).presume_reference_size_in_bytes() > 0);
        assert!(
            JsonValue::Object(JsonObject::new()).presume_reference_size_in_bytes() > 0
        );
    }

    #[test]
    fn test_presumed_size_grows_with_children() {
        let small = JsonValue::Array(vec![JsonValue::Long(1)]);
        let big = JsonValue::Array(vec![JsonValue::Long(1), JsonValue::string("abcdef")]);
        assert!(
            big.presume_reference_size_in_bytes() > small.presume_reference_size_in_bytes()
        );
    }

    #[test]
    fn test_from_text_parses_the_full_taxonomy() {
        let value =
            JsonValue::from_text(r#"{"n":null,"b":true,"i":42,"d":1.5,"a":["x"]}"#).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.get("n").unwrap().is_null());
        assert_eq!(object.get("b").unwrap().as_boolean().unwrap(), true);
        assert_eq!(object.get("i").unwrap().as_long().unwrap(), 42);
        assert_eq!(object.get("d").unwrap().as_double().unwrap(), 1.5);
        assert_eq!(
            object.get("a").unwrap().as_array().unwrap()[0],
            JsonValue::string("x")
        );
    }

    #[test]
    fn test_from_text_rejects_malformed_input() {
        assert!(matches!(
            JsonValue::from_text("{\"unterminated\": "),
            Err(BulkrowError::JsonParseError(_))
        ));
    }
}
