// Dynamically-typed attribute values
//
// The Hive API sends attribute values as bare JSON scalars whose type is
// only known by inspection. `Value` captures them as a tagged union with
// every integer width folded into a single `Integer` variant, and
// `FromValue` performs the typed extraction.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A single attribute value as sent over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    /// Any signed or unsigned integer encoding, normalized.
    Integer(i128),
    Float(f64),
    /// Arrays, objects and nulls nested in a value (schedules, etc).
    Structured(serde_json::Value),
}

/// The variant of a [`Value`], used when reporting type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Bool,
    Integer,
    Float,
    Structured,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Structured => "structured",
        })
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Bool(_) => ValueKind::Bool,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Structured(_) => ValueKind::Structured,
        }
    }

    /// Extract a typed value, `None` if the variant is incompatible.
    pub fn extract<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Integer(i128::from(u))
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => Self::Structured(other),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    serializer.serialize_u64(v)
                } else {
                    Err(serde::ser::Error::custom(format!(
                        "integer {i} out of range for the wire format"
                    )))
                }
            }
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Structured(v) => v.serialize(serializer),
        }
    }
}

// ── Construction from native types ──────────────────────────────────

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Integer(i128::from(v))
                }
            }
        )*
    };
}

integer_from!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

// ── Typed extraction ────────────────────────────────────────────────

/// A native type that can be extracted from a [`Value`].
pub trait FromValue: Sized {
    /// Name used in type-mismatch errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            // JSON has no separate integer type; `20` and `20.0` are the same reading.
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        integral(value).and_then(|i| i64::try_from(i).ok())
    }
}

impl FromValue for u64 {
    const EXPECTED: &'static str = "unsigned integer";

    fn from_value(value: &Value) -> Option<Self> {
        integral(value).and_then(|i| u64::try_from(i).ok())
    }
}

/// Integer view of a value: integers as-is, floats only when whole.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions, clippy::float_cmp)]
fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i128),
        _ => None,
    }
}

/// Outcome of extracting a typed value from an attribute slot.
///
/// Keeps "not there" apart from "there but unusable": bounds lookups treat
/// both as a cue to use a default, while control readings report the
/// difference to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Typed<T> {
    Absent,
    Mismatch(ValueKind),
    Present(T),
}

impl<T> Typed<T> {
    pub(crate) fn from_slot(slot: Option<&Value>) -> Self
    where
        T: FromValue,
    {
        match slot {
            None => Self::Absent,
            Some(value) => match T::from_value(value) {
                Some(v) => Self::Present(v),
                None => Self::Mismatch(value.kind()),
            },
        }
    }

    /// The extracted value, if present and of the right type.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent | Self::Mismatch(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Require a correctly-typed value, reporting absence or a mismatch
    /// as [`Error::InvalidDataType`].
    pub fn require(self, attribute: &str) -> Result<T, Error>
    where
        T: FromValue,
    {
        match self {
            Self::Present(v) => Ok(v),
            Self::Absent => Err(Error::InvalidDataType {
                attribute: attribute.to_owned(),
                expected: T::EXPECTED,
                found: "nothing".into(),
            }),
            Self::Mismatch(kind) => Err(Error::InvalidDataType {
                attribute: attribute.to_owned(),
                expected: T::EXPECTED,
                found: kind.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn every_integer_width_normalizes() {
        let signed = [
            Value::from(-100_i8),
            Value::from(-100_i16),
            Value::from(-100_i32),
            Value::from(-100_i64),
        ];
        for v in &signed {
            assert_eq!(v.extract::<i64>(), Some(-100));
            assert_eq!(v.extract::<u64>(), None, "negative value as unsigned: {v:?}");
        }

        let unsigned = [
            Value::from(100_u8),
            Value::from(100_u16),
            Value::from(100_u32),
            Value::from(100_u64),
        ];
        for v in &unsigned {
            assert_eq!(v.extract::<i64>(), Some(100));
            assert_eq!(v.extract::<u64>(), Some(100));
        }
    }

    #[test]
    fn integer_accessors_reject_strings_and_bools() {
        assert_eq!(Value::from("100").extract::<i64>(), None);
        assert_eq!(Value::from(true).extract::<u64>(), None);
    }

    #[test]
    fn large_unsigned_fits_u64_but_not_i64() {
        let v = Value::from(u64::MAX);
        assert_eq!(v.extract::<u64>(), Some(u64::MAX));
        assert_eq!(v.extract::<i64>(), None);
    }

    #[test]
    fn whole_floats_extract_as_integers() {
        assert_eq!(Value::from(21.0).extract::<i64>(), Some(21));
        assert_eq!(Value::from(21.5).extract::<i64>(), None);
        assert_eq!(Value::from(f64::NAN).extract::<u64>(), None);
    }

    #[test]
    fn decodes_json_scalars() {
        let v: Value = serde_json::from_str("20").unwrap();
        assert_eq!(v, Value::Integer(20));
        assert_eq!(v.extract::<f64>(), Some(20.0));

        let v: Value = serde_json::from_str("20.5").unwrap();
        assert_eq!(v, Value::Float(20.5));

        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v.extract::<u64>(), Some(u64::MAX));

        let v: Value = serde_json::from_str(r#"{"monday":[]}"#).unwrap();
        assert_eq!(v.kind(), ValueKind::Structured);
    }

    #[test]
    fn encodes_json_scalars() {
        assert_eq!(serde_json::to_string(&Value::from(17.5)).unwrap(), "17.5");
        assert_eq!(serde_json::to_string(&Value::from(-3_i8)).unwrap(), "-3");
        assert_eq!(serde_json::to_string(&Value::from("HEAT")).unwrap(), "\"HEAT\"");
    }

    #[test]
    fn typed_distinguishes_absent_from_mismatch() {
        let absent: Typed<f64> = Typed::from_slot(None);
        assert!(absent.is_absent());

        let text = Value::from("str");
        let mismatch: Typed<f64> = Typed::from_slot(Some(&text));
        assert_eq!(mismatch, Typed::Mismatch(ValueKind::String));

        let err = mismatch.require("temperature").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDataType);
        assert!(err.to_string().contains("expected float, found string"));
    }
}
