//! Conversions between [`Value`] and typed entity fields.
//!
//! - Incoming: [`FromValue`] turns a driver value into a field type. Numbers are
//!   converted by value through [`NumericKind`], never by bit pattern.
//! - Outgoing: [`ToValue`] reads a field into a bindable [`Value`]; the dialect gets
//!   the last word through [`SqlDialect::convert_arg`].
//! - Literal: [`render_literal`] embeds a value directly into SQL text.

use crate::dialect::SqlDialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Convert a driver value into `Self`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> OrmResult<Self>;
}

/// Read a field as a bindable value.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Numeric field kinds a raw number can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl NumericKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    fn int_range(self) -> Option<(i64, i64)> {
        match self {
            Self::I8 => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            Self::I16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            Self::I32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            Self::I64 => Some((i64::MIN, i64::MAX)),
            Self::F32 | Self::F64 => None,
        }
    }

    /// Convert a numeric value into this kind.
    ///
    /// Integral targets truncate toward zero and saturate at the target's bounds.
    /// Integral sources stay exact between integer kinds.
    pub fn coerce(self, value: &Value) -> OrmResult<Value> {
        if !value.is_numeric() {
            return Err(OrmError::coercion(self.name(), value.type_name()));
        }
        let Some((min, max)) = self.int_range() else {
            let f = value
                .as_f64()
                .ok_or_else(|| OrmError::coercion(self.name(), value.type_name()))?;
            return Ok(match self {
                Self::F32 => Value::Float(f as f32),
                _ => Value::Double(f),
            });
        };

        let n = match value.as_i64() {
            Some(i) => i.clamp(min, max),
            None => {
                let f = value
                    .as_f64()
                    .ok_or_else(|| OrmError::coercion(self.name(), value.type_name()))?;
                (f.trunc() as i64).clamp(min, max)
            }
        };
        // `n` is within the target range here, so the narrowing casts are exact.
        Ok(match self {
            Self::I8 => Value::TinyInt(n as i8),
            Self::I16 => Value::SmallInt(n as i16),
            Self::I32 => Value::Int(n as i32),
            _ => Value::BigInt(n),
        })
    }
}

macro_rules! impl_numeric {
    ($($ty:ty => $kind:ident, $variant:ident);* $(;)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> OrmResult<Self> {
                    match NumericKind::$kind.coerce(&value)? {
                        Value::$variant(v) => Ok(v),
                        other => Err(OrmError::coercion(stringify!($ty), other.type_name())),
                    }
                }
            }

            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }
            }
        )*
    };
}

impl_numeric! {
    i8 => I8, TinyInt;
    i16 => I16, SmallInt;
    i32 => I32, Int;
    i64 => I64, BigInt;
    f32 => F32, Float;
    f64 => F64, Double;
}

impl FromValue for bool {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            ref v if v.is_numeric() => match v.as_i64() {
                Some(i) => Ok(i != 0),
                None => Ok(v.as_f64().is_some_and(|f| f != 0.0)),
            },
            other => Err(OrmError::coercion("bool", other.type_name())),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            Value::Timestamp(ts) => Ok(ts.format(DATE_TIME_FORMAT).to_string()),
            ref v if v.is_numeric() => Ok(render_number(v)),
            other => Err(OrmError::coercion("String", other.type_name())),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            Value::Text(s) => NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT)
                .map_err(|_| OrmError::coercion("NaiveDateTime", "Text")),
            other => Err(OrmError::coercion("NaiveDateTime", other.type_name())),
        }
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Date(d) => Ok(d),
            Value::Timestamp(ts) => Ok(ts.date()),
            Value::Text(s) => {
                let s = s.trim();
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .or_else(|_| NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).map(|ts| ts.date()))
                    .map_err(|_| OrmError::coercion("NaiveDate", "Text"))
            }
            other => Err(OrmError::coercion("NaiveDate", other.type_name())),
        }
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(OrmError::coercion("Vec<u8>", other.type_name())),
        }
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

#[cfg(feature = "rust_decimal")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> OrmResult<Self> {
        use rust_decimal::prelude::FromPrimitive;

        match value {
            Value::Decimal(d) => Ok(d),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| OrmError::coercion("Decimal", "Text")),
            ref v => match (v.as_i64(), v.as_f64()) {
                (Some(i), _) => Ok(rust_decimal::Decimal::from(i)),
                (None, Some(f)) => rust_decimal::Decimal::from_f64(f)
                    .ok_or_else(|| OrmError::coercion("Decimal", v.type_name())),
                _ => Err(OrmError::coercion("Decimal", v.type_name())),
            },
        }
    }
}

#[cfg(feature = "rust_decimal")]
impl ToValue for rust_decimal::Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> OrmResult<Self> {
        Ok(value)
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

/// Key value of a key field, `None` when the field holds no integral value.
pub fn key_of<T: ToValue + ?Sized>(field: &T) -> Option<i64> {
    field.to_value().as_i64()
}

fn render_number(value: &Value) -> String {
    match value {
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        #[cfg(feature = "rust_decimal")]
        Value::Decimal(v) => v.to_string(),
        other => other.to_string(),
    }
}

/// Render a value as literal SQL text.
pub fn render_literal(value: &Value, dialect: &dyn SqlDialect) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Text(s) => dialect.quote_str(s),
        Value::Date(d) => dialect.date_literal(&d.and_time(NaiveTime::MIN)),
        Value::Timestamp(ts) => dialect.date_literal(ts),
        Value::Bytes(b) => {
            let mut out = String::with_capacity(b.len() * 2 + 3);
            out.push_str("X'");
            for byte in b {
                out.push_str(&format!("{byte:02X}"));
            }
            out.push('\'');
            out
        }
        number => render_number(number),
    }
}
