//! Wire-level column values.
//!
//! [`Value`] is what a driver hands back for a column and what the client binds for a
//! `?` placeholder. Conversions to and from typed entity fields live in
//! [`crate::coerce`].

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A dynamically typed column value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl Value {
    /// Name of the runtime value type, used in coercion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::TinyInt(_) => "TinyInt",
            Self::SmallInt(_) => "SmallInt",
            Self::Int(_) => "Int",
            Self::BigInt(_) => "BigInt",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(_) => "Decimal",
            Self::Text(_) => "Text",
            Self::Date(_) => "Date",
            Self::Timestamp(_) => "Timestamp",
            Self::Bytes(_) => "Bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is one of the numeric variants.
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::TinyInt(_)
            | Self::SmallInt(_)
            | Self::Int(_)
            | Self::BigInt(_)
            | Self::Float(_)
            | Self::Double(_) => true,
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(_) => true,
            _ => false,
        }
    }

    /// Whether the value is a date or a timestamp.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::Timestamp(_))
    }

    /// Exact integer view of an integral variant.
    pub(crate) fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::TinyInt(v) => Some(i64::from(v)),
            Self::SmallInt(v) => Some(i64::from(v)),
            Self::Int(v) => Some(i64::from(v)),
            Self::BigInt(v) => Some(v),
            _ => None,
        }
    }

    /// Floating view of any numeric variant.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::TinyInt(v) => Some(f64::from(v)),
            Self::SmallInt(v) => Some(f64::from(v)),
            Self::Int(v) => Some(f64::from(v)),
            Self::BigInt(v) => Some(v as f64),
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(v) => rust_decimal::prelude::ToPrimitive::to_f64(&v),
            _ => None,
        }
    }
}

/// Renders the value the way verbose SQL logging shows bound arguments:
/// strings and temporal values single-quoted, booleans as `1`/`0`, null as `null`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => f.write_str(if *v { "1" } else { "0" }),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Date(v) => write!(f, "'{}'", v.format("%Y-%m-%d")),
            Self::Timestamp(v) => write!(f, "'{}'", v.format("%Y-%m-%d %H:%M:%S")),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    Vec<u8> => Bytes,
);

#[cfg(feature = "rust_decimal")]
impl From<rust_decimal::Decimal> for Value {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::SmallInt(i16::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::Int(i32::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::BigInt(i64::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_log_rendering() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(true).to_string(), "1");
        assert_eq!(Value::Bool(false).to_string(), "0");
        assert_eq!(Value::BigInt(42).to_string(), "42");
        assert_eq!(Value::from("Ann").to_string(), "'Ann'");
        let ts = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "'2020-01-02 03:04:05'");
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7_i32)), Value::Int(7));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::SmallInt(-3).as_i64(), Some(-3));
        assert_eq!(Value::Double(1.5).as_i64(), None);
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert!(Value::Int(1).is_numeric());
        assert!(!Value::Text("1".into()).is_numeric());
    }
}
