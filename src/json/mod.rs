// In: src/json/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The JSON Value Taxonomy
// ====================================================================================
//
// `json` is the closed, immutable value model behind the `json` column type.
// It has exactly three responsibilities:
//
//   1. [Value Model (JsonValue)]   -> A tagged union of the seven JSON entities
//         |                           (null, boolean, long, double, string,
//         |                           array, object) with exhaustive matching
//         |                           and narrowing that never coerces.
//         |
//   2. [Canonical Text (to_json)]  -> RFC 8259 rendering, with short escapes
//         |                           for controls and an optional caller-held
//         |                           literal cache on strings.
//         |
//   3. [Boundary Conversions]      -> Lossless mapping to/from the legacy wire
//                                     representation (`WireValue`) and parsing
//                                     of external JSON text (`from_text`).
//
// The size estimate (`presume_reference_size_in_bytes`) exists only to drive
// the PageBuilder's flush heuristic. It is approximate by contract.
//
// ====================================================================================

mod value;
mod wire;

pub use value::{EntityType, JsonObject, JsonString, JsonValue};
pub use wire::WireValue;
