//! Codec contract between typed domain values and persisted strings, plus the JSON adapter that
//! bridges serde-style validators into it.

use std::{fmt, marker::PhantomData};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::value::LocalValue;

/// Paired encode/decode capability between a domain value and its persisted string.
///
/// `decode` is total: any input, however malformed, comes back as a [`LocalValue`] and
/// failures are reported as [`LocalValue::Invalid`].
pub trait Codec {
    /// Domain value type.
    type Value;
    /// Decode/encode failure type carried by [`LocalValue::Invalid`].
    type Error: fmt::Display;

    /// Serializes a domain value into its persisted string.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be represented as a string.
    fn encode(&self, value: &Self::Value) -> Result<String, Self::Error>;

    /// Interprets a persisted string.
    fn decode(&self, raw: &str) -> LocalValue<Self::Error, Self::Value>;

    /// Encodes then decodes `value`, producing exactly what a write followed by a read would.
    fn materialize(&self, value: &Self::Value) -> LocalValue<Self::Error, Self::Value> {
        match self.encode(value) {
            Ok(raw) => self.decode(&raw),
            Err(err) => LocalValue::Invalid(err),
        }
    }
}

/// External validator working over an intermediate JSON value.
pub trait Validator {
    /// Domain value type.
    type Value;
    /// Validator-specific error.
    type Error: fmt::Display;

    /// Maps a domain value to its structured form.
    ///
    /// # Errors
    ///
    /// Returns an error when the value has no structured representation.
    fn encode(&self, value: &Self::Value) -> Result<Value, Self::Error>;

    /// Validates a structured value into the domain type.
    ///
    /// # Errors
    ///
    /// Returns an error when the structured value does not describe a domain value.
    fn validate(&self, input: Value) -> Result<Self::Value, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure reported by [`JsonCodec`].
pub enum CodecError {
    /// The persisted string is not JSON.
    #[error("stored value is not valid JSON: {0}")]
    Parse(String),
    /// The JSON value was rejected by the validator.
    #[error("stored value failed validation: {0}")]
    Validation(String),
    /// The domain value could not be serialized.
    #[error("value could not be encoded: {0}")]
    Encode(String),
}

/// Validator that delegates to a type's serde implementations.
pub struct SerdeValidator<T>(PhantomData<fn() -> T>);

impl<T> SerdeValidator<T> {
    /// Creates the validator.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeValidator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for SerdeValidator<T> {}

impl<T> fmt::Debug for SerdeValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeValidator<{}>", std::any::type_name::<T>())
    }
}

impl<T: Serialize + DeserializeOwned> Validator for SerdeValidator<T> {
    type Value = T;
    type Error = serde_json::Error;

    fn encode(&self, value: &T) -> Result<Value, Self::Error> {
        serde_json::to_value(value)
    }

    fn validate(&self, input: Value) -> Result<T, Self::Error> {
        serde_json::from_value(input)
    }
}

#[derive(Debug, Error)]
/// Failure reported by [`Refined`].
pub enum RefineError<E> {
    /// The underlying validator rejected the input.
    #[error("{0}")]
    Inner(E),
    /// The input parsed but violated the domain constraint.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Clone)]
/// Validator that narrows another validator with a domain predicate.
pub struct Refined<V, F> {
    inner: V,
    check: F,
    constraint: String,
}

impl<V, F> fmt::Debug for Refined<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refined")
            .field("constraint", &self.constraint)
            .finish_non_exhaustive()
    }
}

impl<V, F> Validator for Refined<V, F>
where
    V: Validator,
    F: Fn(&V::Value) -> bool,
{
    type Value = V::Value;
    type Error = RefineError<V::Error>;

    fn encode(&self, value: &V::Value) -> Result<Value, Self::Error> {
        self.inner.encode(value).map_err(RefineError::Inner)
    }

    fn validate(&self, input: Value) -> Result<V::Value, Self::Error> {
        let value = self.inner.validate(input).map_err(RefineError::Inner)?;
        if (self.check)(&value) {
            Ok(value)
        } else {
            Err(RefineError::Rejected(format!(
                "value violates constraint `{}`",
                self.constraint
            )))
        }
    }
}

#[derive(Debug, Clone, Default)]
/// String codec composed from a JSON [`Validator`]: raw string → JSON → validated value.
pub struct JsonCodec<V> {
    validator: V,
}

impl<T: Serialize + DeserializeOwned> JsonCodec<SerdeValidator<T>> {
    /// Codec for any serde type.
    pub const fn serde() -> Self {
        Self {
            validator: SerdeValidator::new(),
        }
    }
}

impl<V: Validator> JsonCodec<V> {
    /// Wraps an external validator.
    pub const fn new(validator: V) -> Self {
        Self { validator }
    }

    /// Narrows the codec with a domain predicate named by `constraint`.
    pub fn refine<F>(self, constraint: impl Into<String>, check: F) -> JsonCodec<Refined<V, F>>
    where
        F: Fn(&V::Value) -> bool,
    {
        JsonCodec {
            validator: Refined {
                inner: self.validator,
                check,
                constraint: constraint.into(),
            },
        }
    }

    /// Borrows the wrapped validator.
    pub fn validator(&self) -> &V {
        &self.validator
    }
}

impl<V: Validator> Codec for JsonCodec<V> {
    type Value = V::Value;
    type Error = CodecError;

    fn encode(&self, value: &V::Value) -> Result<String, CodecError> {
        let json = self
            .validator
            .encode(value)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        serde_json::to_string(&json).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> LocalValue<CodecError, V::Value> {
        let json = match serde_json::from_str::<Value>(raw) {
            Ok(json) => json,
            Err(err) => return LocalValue::Invalid(CodecError::Parse(err.to_string())),
        };
        LocalValue::from_result(
            self.validator
                .validate(json)
                .map_err(|e| CodecError::Validation(e.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shape {
        s: String,
        n: i64,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Choice {
        Foo,
        Baz,
    }

    #[test]
    fn serde_codec_encodes_structured_json() {
        let codec = JsonCodec::<SerdeValidator<Shape>>::serde();
        let raw = codec
            .encode(&Shape {
                s: "foo".to_string(),
                n: 3,
            })
            .expect("encode");
        assert_eq!(raw, r#"{"s":"foo","n":3}"#);
    }

    #[test]
    fn unparseable_input_is_a_parse_error() {
        let codec = JsonCodec::<SerdeValidator<Shape>>::serde();
        let decoded = codec.decode("{not json");
        assert!(matches!(decoded.error(), Some(CodecError::Parse(_))));
    }

    #[test]
    fn well_formed_json_of_wrong_shape_is_a_validation_error() {
        let codec = JsonCodec::<SerdeValidator<Choice>>::serde();
        let decoded = codec.decode(r#""bar""#);
        assert!(matches!(decoded.error(), Some(CodecError::Validation(_))));
        assert_eq!(codec.decode(r#""baz""#), LocalValue::Valid(Choice::Baz));
    }

    #[test]
    fn refinement_rejects_values_outside_the_constraint() {
        let codec = JsonCodec::<SerdeValidator<u32>>::serde().refine("even", |n| n % 2 == 0);
        assert_eq!(codec.decode("4"), LocalValue::Valid(4));
        let rejected = codec.decode("5");
        match rejected.error() {
            Some(CodecError::Validation(message)) => assert!(message.contains("even")),
            other => panic!("unexpected decode outcome: {other:?}"),
        }
        assert!(codec.materialize(&3).is_invalid());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(s in ".*", n in any::<i64>()) {
            let codec = JsonCodec::<SerdeValidator<Shape>>::serde();
            let shape = Shape { s, n };
            let raw = codec.encode(&shape).expect("encode");
            prop_assert_eq!(codec.decode(&raw), LocalValue::Valid(shape));
        }

        #[test]
        fn decode_is_total_over_arbitrary_strings(raw in ".*") {
            let codec = JsonCodec::<SerdeValidator<Shape>>::serde();
            let decoded = codec.decode(&raw);
            prop_assert!(decoded.is_valid() || decoded.is_invalid());
        }
    }
}
