//! Opaque argument payloads.
//!
//! The runtime never interprets arguments. Each handler knows the shape it
//! expects and asks for it explicitly; a mismatch is a [`DecodeError`] that the
//! handler turns into an error response.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::errors::{DecodeError, ProtocolError};

/// Untyped argument payload attached to a message.
///
/// Serializes transparently as the JSON value it wraps. An absent payload is
/// JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Value);

impl Args {
    /// Empty (`null`) payload.
    pub fn null() -> Self {
        Self(Value::Null)
    }

    /// Encode any serializable value as a payload.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, ProtocolError> {
        serde_json::to_value(value).map(Self).map_err(ProtocolError::Encode)
    }

    /// Whether the payload is `null`.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Borrow the raw JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Decode the payload as an integer.
    ///
    /// Fractional numbers, strings and `null` are rejected.
    pub fn decode_int(&self) -> Result<i64, DecodeError> {
        i64::deserialize(&self.0).map_err(|source| DecodeError { expected: "integer", source })
    }

    /// Decode the payload as a string.
    pub fn decode_string(&self) -> Result<String, DecodeError> {
        String::deserialize(&self.0).map_err(|source| DecodeError { expected: "string", source })
    }

    /// Decode the payload into a handler-defined type.
    pub fn decode_struct<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        T::deserialize(&self.0)
            .map_err(|source| DecodeError { expected: std::any::type_name::<T>(), source })
    }

    /// Lenient text view of the payload.
    ///
    /// Strings come back verbatim, `null` is empty, anything else is its JSON
    /// text.
    pub fn to_display_string(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl From<Value> for Args {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pixel {
        x: i32,
        y: i32,
    }

    #[test]
    fn decode_int_rejects_string() {
        let args = Args::from(json!("12"));
        let err = args.decode_int().unwrap_err();
        assert_eq!(err.expected, "integer");
    }

    #[test]
    fn decode_int_rejects_fraction() {
        assert!(Args::from(json!(1.5)).decode_int().is_err());
    }

    #[test]
    fn decode_int_rejects_null() {
        assert!(Args::null().decode_int().is_err());
    }

    #[test]
    fn decode_string_accepts_string() {
        assert_eq!(Args::from(json!("/counter")).decode_string().unwrap(), "/counter");
    }

    #[test]
    fn decode_struct_reads_fields() {
        let args = Args::from(json!({"x": 3, "y": 4}));
        assert_eq!(args.decode_struct::<Pixel>().unwrap(), Pixel { x: 3, y: 4 });
    }

    #[test]
    fn decode_struct_mismatch_names_target_type() {
        let args = Args::from(json!({"x": "left"}));
        let err = args.decode_struct::<Pixel>().unwrap_err();
        assert!(err.expected.ends_with("Pixel"));
        assert!(err.to_string().contains("Pixel"));
    }

    #[test]
    fn display_string_is_lenient() {
        assert_eq!(Args::from(json!("#FF0000")).to_display_string(), "#FF0000");
        assert_eq!(Args::null().to_display_string(), "");
        assert_eq!(Args::from(json!([1, 2])).to_display_string(), "[1,2]");
    }

    proptest! {
        #[test]
        fn decode_int_accepts_any_integer(n in any::<i64>()) {
            let args = Args::encode(&n).unwrap();
            prop_assert_eq!(args.decode_int().unwrap(), n);
        }

        #[test]
        fn decode_string_never_accepts_numbers(n in any::<i64>()) {
            prop_assert!(Args::from(json!(n)).decode_string().is_err());
        }
    }
}
