// In: src/json/wire.rs

//! Lossless conversion between `JsonValue` and the legacy generic wire value
//! representation used at serialization boundaries.
//!
//! The wire model is a superset of JSON: map keys are arbitrary values, not
//! just text. Conversion from the wire side therefore refuses maps whose
//! keys are not strings; everything a `JsonValue` can express converts back
//! and forth without loss.

use crate::error::BulkrowError;

use super::value::{JsonObject, JsonValue};

/// The legacy dynamically-typed wire value. Its byte grammar is out of
/// scope here; this is solely the in-memory shape exchanged at boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Vec<WireValue>),
    Map(Vec<(WireValue, WireValue)>),
}

impl JsonValue {
    /// Converts into the legacy wire representation. Never fails: every JSON
    /// entity has a one-to-one wire counterpart.
    pub fn to_wire(&self) -> WireValue {
        match self {
            JsonValue::Null => WireValue::Nil,
            JsonValue::Boolean(b) => WireValue::Boolean(*b),
            JsonValue::Long(n) => WireValue::Integer(*n),
            JsonValue::Double(d) => WireValue::Float(*d),
            JsonValue::String(s) => WireValue::Text(s.value().to_string()),
            JsonValue::Array(values) => {
                WireValue::Array(values.iter().map(JsonValue::to_wire).collect())
            }
            JsonValue::Object(object) => WireValue::Map(
                object
                    .iter()
                    .map(|(key, value)| (WireValue::Text(key.to_string()), value.to_wire()))
                    .collect(),
            ),
        }
    }

    /// Converts from the legacy wire representation.
    ///
    /// A map with a non-text key has no JSON counterpart and is rejected;
    /// duplicate keys resolve last-write-wins like any external source.
    pub fn from_wire(wire: &WireValue) -> Result<Self, BulkrowError> {
        match wire {
            WireValue::Nil => Ok(JsonValue::Null),
            WireValue::Boolean(b) => Ok(JsonValue::Boolean(*b)),
            WireValue::Integer(n) => Ok(JsonValue::Long(*n)),
            WireValue::Float(d) => Ok(JsonValue::Double(*d)),
            WireValue::Text(s) => Ok(JsonValue::string(s.clone())),
            WireValue::Array(values) => Ok(JsonValue::Array(
                values
                    .iter()
                    .map(JsonValue::from_wire)
                    .collect::<Result<_, _>>()?,
            )),
            WireValue::Map(entries) => {
                let mut object = JsonObject::new();
                for (key, value) in entries {
                    let WireValue::Text(key) = key else {
                        return Err(BulkrowError::WireConversionError(format!(
                            "map key must be text, got {:?}",
                            key
                        )));
                    };
                    object.insert(key.clone(), JsonValue::from_wire(value)?);
                }
                Ok(JsonValue::Object(object))
            }
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value() -> JsonValue {
        let mut object = JsonObject::new();
        object.insert("id", JsonValue::Long(7));
        object.insert("ratio", JsonValue::Double(0.25));
        object.insert(
            "tags",
            JsonValue::Array(vec![
                JsonValue::string("a"),
                JsonValue::Null,
                JsonValue::Boolean(false),
            ]),
        );
        JsonValue::Object(object)
    }

    #[test]
    fn test_wire_round_trip_preserves_structural_equality() {
        let original = sample_value();
        let back = JsonValue::from_wire(&original.to_wire()).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn test_round_trip_drops_the_literal_cache_but_not_the_value() {
        let original = JsonValue::string_with_literal("a/b", r#""a\/b""#);
        let back = JsonValue::from_wire(&original.to_wire()).unwrap();
        // Equality is on decoded values, so the round trip still holds.
        assert_eq!(original, back);
        assert!(back.as_string().unwrap().literal().is_none());
    }

    #[test]
    fn test_map_with_non_text_key_is_rejected() {
        let wire = WireValue::Map(vec![(WireValue::Integer(1), WireValue::Nil)]);
        assert!(matches!(
            JsonValue::from_wire(&wire),
            Err(BulkrowError::WireConversionError(_))
        ));
    }

    #[test]
    fn test_duplicate_map_keys_resolve_last_write_wins() {
        let wire = WireValue::Map(vec![
            (WireValue::Text("k".into()), WireValue::Integer(1)),
            (WireValue::Text("k".into()), WireValue::Integer(2)),
        ]);
        let value = JsonValue::from_wire(&wire).unwrap();
        assert_eq!(
            value.as_object().unwrap().get("k"),
            Some(&JsonValue::Long(2))
        );
    }
}
