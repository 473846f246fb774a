//! Serialization Boundary
//!
//! Encodes values to JSON text for storage and decodes stored text back into
//! the caller's type. Encoding and decoding failures are reported separately
//! so the engine can recover from each differently.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Error type a reconstructor may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type ReconstructFn<T> = dyn Fn(Value) -> std::result::Result<T, BoxError> + Send + Sync;

// == JSON Primitive ==
/// Types a decoded JSON value can be handed back as without a reconstructor.
pub trait JsonPrimitive: Sized {
    /// Returns `None` when the value has a different shape.
    fn from_json(value: Value) -> Option<Self>;
}

impl JsonPrimitive for Value {
    fn from_json(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl JsonPrimitive for String {
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl JsonPrimitive for bool {
    fn from_json(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl JsonPrimitive for f64 {
    fn from_json(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

/// Numbers are rounded to the nearest `f32`. Finite values beyond the `f32`
/// range are rejected instead of becoming infinite.
impl JsonPrimitive for f32 {
    fn from_json(value: Value) -> Option<Self> {
        let v = value.as_f64()?;
        if v.is_finite() && v.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(v as f32)
    }
}

macro_rules! impl_json_primitive_int {
    ($($ty:ty),*) => {
        $(
            impl JsonPrimitive for $ty {
                fn from_json(value: Value) -> Option<Self> {
                    value
                        .as_i64()
                        .and_then(|v| <$ty>::try_from(v).ok())
                        .or_else(|| value.as_u64().and_then(|v| <$ty>::try_from(v).ok()))
                }
            }
        )*
    };
}

impl_json_primitive_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

// == Decoder ==
/// How a stored payload is turned back into `T`.
pub enum Decoder<T> {
    /// Hand the decoded value back as-is (JSON primitives only)
    Primitive(fn(Value) -> Option<T>),
    /// Caller-supplied reconstruction from the generic JSON structure
    Reconstruct(Arc<ReconstructFn<T>>),
}

impl<T: JsonPrimitive> Decoder<T> {
    pub fn primitive() -> Self {
        Decoder::Primitive(T::from_json)
    }
}

impl<T: 'static> Decoder<T> {
    /// Wraps a reconstruction function. Its errors count as deserialization failures.
    pub fn reconstruct<F, E>(f: F) -> Self
    where
        F: Fn(Value) -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Decoder::Reconstruct(Arc::new(move |value| f(value).map_err(Into::into)))
    }
}

impl<T> Decoder<T> {
    /// Decodes a payload produced by [`encode`].
    pub fn decode(&self, payload: &str) -> Result<T> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| CacheError::Deserialization(format!("invalid JSON payload: {e}")))?;

        match self {
            Decoder::Primitive(from_json) => {
                let shape = json_shape(&value);
                from_json(value).ok_or_else(|| {
                    CacheError::Deserialization(format!(
                        "stored {shape} does not match the requested primitive type"
                    ))
                })
            }
            Decoder::Reconstruct(f) => {
                f(value).map_err(|e| CacheError::Deserialization(e.to_string()))
            }
        }
    }
}

impl<T: DeserializeOwned + 'static> Decoder<T> {
    /// Reconstructor backed by `T`'s own `Deserialize` impl.
    pub fn serde() -> Self {
        Decoder::reconstruct(serde_json::from_value::<T>)
    }
}

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        match self {
            Decoder::Primitive(f) => Decoder::Primitive(*f),
            Decoder::Reconstruct(f) => Decoder::Reconstruct(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Decoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoder::Primitive(_) => f.write_str("Decoder::Primitive"),
            Decoder::Reconstruct(_) => f.write_str("Decoder::Reconstruct"),
        }
    }
}

// == Encode ==
/// Encodes a value to its stored JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
