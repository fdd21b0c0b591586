//! Scalar values carried by fields, rows and bound parameters.
//!
//! [`Value`] is the one representation shared by every stage: extraction
//! produces it from record fields, statements bind it as a parameter (or render
//! it as a literal for display), and row sets hold it until a record decodes
//! it back with [`FromValue`].

use crate::types::FieldKind;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use std::fmt::{self, Write};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// An opaque scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as an SQL literal.
    ///
    /// Strings and timestamps are single-quoted with embedded quotes doubled;
    /// numbers use their default formatting.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => quote_literal(s),
            Value::Timestamp(ts) => quote_literal(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 4);
                out.push_str("'\\x");
                for b in bytes {
                    let _ = write!(&mut out, "{b:02x}");
                }
                out.push('\'');
                out
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else {
                    Err(format!("cannot bind an integer to a {ty} parameter").into())
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else {
                    Err(format!("cannot bind a float to a {ty} parameter").into())
                }
            }
            Value::Text(s) => bind(s, ty, out, "text"),
            Value::Timestamp(ts) => {
                if *ty == Type::TIMESTAMPTZ {
                    bind(&ts.and_utc(), ty, out, "a timestamp")
                } else {
                    bind(ts, ty, out, "a timestamp")
                }
            }
            Value::Bool(b) => bind(b, ty, out, "a bool"),
            Value::Bytes(b) => bind(b, ty, out, "bytes"),
        }
    }

    // Each variant checks the parameter type itself in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn bind<T: ToSql>(
    value: &T,
    ty: &Type,
    out: &mut BytesMut,
    what: &str,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if !T::accepts(ty) {
        return Err(format!("cannot bind {what} to a {ty} parameter").into());
    }
    value.to_sql(ty, out)
}

/// A Rust type usable as a record field.
///
/// `KIND` feeds the type mapper; `is_zero` drives zero skipping for INSERT and
/// UPDATE payloads.
pub trait ColumnValue {
    const KIND: FieldKind;

    fn to_value(&self) -> Value;

    fn is_zero(&self) -> bool;
}

/// Decode a [`Value`] back into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.type_name())
}

macro_rules! int_column {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl ColumnValue for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, String> {
                match value {
                    Value::Int(v) => <$ty>::try_from(*v)
                        .map_err(|_| format!("{v} is out of range for {}", stringify!($ty))),
                    other => Err(mismatch("integer", other)),
                }
            }
        }
    )*};
}

int_column! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
}

impl ColumnValue for f32 {
    const KIND: FieldKind = FieldKind::F32;

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl ColumnValue for f64 {
    const KIND: FieldKind = FieldKind::F64;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl ColumnValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl ColumnValue for &str {
    const KIND: FieldKind = FieldKind::Str;

    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ColumnValue for NaiveDateTime {
    const KIND: FieldKind = FieldKind::NaiveDateTime;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl ColumnValue for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::DateTimeUtc;

    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|ts| ts.and_utc())
    }
}

impl ColumnValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl ColumnValue for Vec<u8> {
    const KIND: FieldKind = FieldKind::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

// `None` is the zero value; `Some(0)` is a deliberate value and is kept.
impl<T: ColumnValue> ColumnValue for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
