//! Column type tags and the native-kind mapping used for table definitions.

use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type tag of a table field.
///
/// `Display` prints the tag; DDL uses [`SqlType::column_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Text,
    Int,
    Float,
    Double,
    DateTime,
    Bool,
    Blob,
    Serial,
    None,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Int => "INT",
            SqlType::Float => "FLOAT",
            SqlType::Double => "DOUBLE",
            SqlType::DateTime => "DATETIME",
            SqlType::Bool => "BOOL",
            SqlType::Blob => "BLOB",
            SqlType::Serial => "SERIAL",
            SqlType::None => "NONE",
        }
    }

    /// PostgreSQL type name used in `CREATE TABLE` / `ALTER TABLE`.
    ///
    /// Tags whose names PostgreSQL does not know are spelled out.
    pub fn column_type(self) -> &'static str {
        match self {
            SqlType::Float => "REAL",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::DateTime => "TIMESTAMP",
            SqlType::Bool => "BOOLEAN",
            SqlType::Blob => "BYTEA",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native kind of a record field.
///
/// `Option<T>` fields report the kind of `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    String,
    Str,
    F32,
    F64,
    NaiveDateTime,
    DateTimeUtc,
    Bool,
    Bytes,
}

impl FieldKind {
    /// Human-readable name, as written in Rust source.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::I8 => "i8",
            FieldKind::I16 => "i16",
            FieldKind::I32 => "i32",
            FieldKind::I64 => "i64",
            FieldKind::Isize => "isize",
            FieldKind::U8 => "u8",
            FieldKind::U16 => "u16",
            FieldKind::U32 => "u32",
            FieldKind::String => "String",
            FieldKind::Str => "&str",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::NaiveDateTime => "NaiveDateTime",
            FieldKind::DateTimeUtc => "DateTime<Utc>",
            FieldKind::Bool => "bool",
            FieldKind::Bytes => "Vec<u8>",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a native field kind to its column type.
///
/// Integers map to `INT`, strings to `TEXT`, floats to `DOUBLE` and
/// timestamps to `DATETIME`. Every other kind is rejected.
pub fn map_kind(kind: FieldKind) -> OrmResult<SqlType> {
    match kind {
        FieldKind::I8
        | FieldKind::I16
        | FieldKind::I32
        | FieldKind::I64
        | FieldKind::Isize
        | FieldKind::U8
        | FieldKind::U16
        | FieldKind::U32 => Ok(SqlType::Int),
        FieldKind::String | FieldKind::Str => Ok(SqlType::Text),
        FieldKind::F32 | FieldKind::F64 => Ok(SqlType::Double),
        FieldKind::NaiveDateTime | FieldKind::DateTimeUtc => Ok(SqlType::DateTime),
        FieldKind::Bool | FieldKind::Bytes => Err(OrmError::UnsupportedType { kind: kind.name() }),
    }
}
