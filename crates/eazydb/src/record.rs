//! Record descriptors and field extraction.
//!
//! A [`Record`] is a struct whose tagged fields map to table columns. The
//! descriptor is static: `#[derive(Record)]` emits [`Record::COLUMNS`] in
//! declaration order, and [`Record::values`] reads the current field values in
//! the same order.
//!
//! ```ignore
//! use eazydb::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(column = "id")]
//!     id: i32,
//!     #[orm(column = "name")]
//!     name: String,
//!     #[orm(column = "age")]
//!     age: i32,
//!     // untagged: never read or written
//!     cache_hits: u32,
//! }
//! ```

use crate::error::{OrmError, OrmResult};
use crate::table::TableKey;
use crate::types::{FieldKind, SqlType, map_kind};
use crate::value::Value;

/// Static description of one tagged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name taken from the field tag.
    pub name: &'static str,
    /// Native kind of the field.
    pub kind: FieldKind,
}

/// Current value of one tagged field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub value: Value,
    /// Whether the field holds its type's zero value.
    pub zero: bool,
}

/// A struct that maps onto a table row.
///
/// Usually derived with `#[derive(Record)]`; a hand-written impl must return
/// one [`FieldValue`] per entry of `COLUMNS`, in the same order.
pub trait Record {
    /// Tagged fields, in declaration order.
    const COLUMNS: &'static [ColumnDef];

    /// Current values of the tagged fields, in declaration order.
    fn values(&self) -> Vec<FieldValue>;
}

impl<R: Record + ?Sized> Record for &R {
    const COLUMNS: &'static [ColumnDef] = R::COLUMNS;

    fn values(&self) -> Vec<FieldValue> {
        (**self).values()
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    const COLUMNS: &'static [ColumnDef] = R::COLUMNS;

    fn values(&self) -> Vec<FieldValue> {
        (**self).values()
    }
}

/// One extracted column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    /// Mapped column type; `NONE` for payload extraction.
    pub sql_type: SqlType,
    pub value: Value,
}

/// Extract the tagged fields of `record` in declaration order.
///
/// With `skip_zero`, fields holding their zero value are left out, so INSERT
/// and UPDATE only touch what the caller set.
pub fn extract<R: Record + ?Sized>(record: &R, skip_zero: bool) -> OrmResult<Vec<Field>> {
    let values = record.values();
    if values.len() != R::COLUMNS.len() {
        return Err(OrmError::build(format!(
            "record returned {} values for {} columns",
            values.len(),
            R::COLUMNS.len()
        )));
    }

    let fields: Vec<Field> = R::COLUMNS
        .iter()
        .zip(values)
        .filter(|(_, v)| !(skip_zero && v.zero))
        .map(|(col, v)| Field {
            name: col.name,
            sql_type: SqlType::None,
            value: v.value,
        })
        .collect();

    if fields.is_empty() {
        return Err(OrmError::NoFieldsFound);
    }
    Ok(fields)
}

/// Column names of `R`, used as the projection of a SELECT.
pub fn column_names<R: Record + ?Sized>() -> OrmResult<Vec<&'static str>> {
    if R::COLUMNS.is_empty() {
        return Err(OrmError::NoFieldsFound);
    }
    Ok(R::COLUMNS.iter().map(|c| c.name).collect())
}

/// Typed fields of `R` for a table definition.
///
/// A `SERIAL` key is generated by the database and is left out of the list;
/// any other key stays in so it can be typed from the record.
pub fn table_fields<R: Record + ?Sized>(key: &TableKey) -> OrmResult<Vec<Field>> {
    let mut fields = Vec::with_capacity(R::COLUMNS.len());
    for col in R::COLUMNS {
        if key.sql_type == SqlType::Serial && col.name.eq_ignore_ascii_case(&key.name) {
            tracing::debug!(
                target: "eazydb.table",
                column = col.name,
                "primary key of type SERIAL, leaving it out of the field list"
            );
            continue;
        }
        let sql_type = map_kind(col.kind)?;
        tracing::debug!(target: "eazydb.table", column = col.name, %sql_type, "extracted field");
        fields.push(Field {
            name: col.name,
            sql_type,
            value: Value::Null,
        });
    }

    if fields.is_empty() {
        return Err(OrmError::NoFieldsFound);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ColumnValue;

    #[derive(Default)]
    struct User {
        id: i32,
        name: String,
        email: String,
        age: i32,
        #[allow(dead_code)]
        untagged: u32,
    }

    impl Record for User {
        const COLUMNS: &'static [ColumnDef] = &[
            ColumnDef {
                name: "id",
                kind: FieldKind::I32,
            },
            ColumnDef {
                name: "name",
                kind: FieldKind::String,
            },
            ColumnDef {
                name: "email",
                kind: FieldKind::String,
            },
            ColumnDef {
                name: "age",
                kind: FieldKind::I32,
            },
        ];

        fn values(&self) -> Vec<FieldValue> {
            vec![
                fv(&self.id),
                fv(&self.name),
                fv(&self.email),
                fv(&self.age),
            ]
        }
    }

    struct Flags {
        active: bool,
    }

    impl Record for Flags {
        const COLUMNS: &'static [ColumnDef] = &[ColumnDef {
            name: "active",
            kind: FieldKind::Bool,
        }];

        fn values(&self) -> Vec<FieldValue> {
            vec![fv(&self.active)]
        }
    }

    fn fv<T: ColumnValue>(v: &T) -> FieldValue {
        FieldValue {
            value: v.to_value(),
            zero: v.is_zero(),
        }
    }

    fn names(fields: &[Field]) -> Vec<&'static str> {
        fields.iter().map(|f| f.name).collect()
    }

    fn full_user() -> User {
        User {
            id: 1,
            name: "Mat".into(),
            email: "mat@example.com".into(),
            age: 24,
            untagged: 9,
        }
    }

    #[test]
    fn keeps_declaration_order() {
        let fields = extract(&full_user(), true).unwrap();
        assert_eq!(names(&fields), ["id", "name", "email", "age"]);
        assert_eq!(fields[1].value, Value::Text("Mat".into()));
        assert!(fields.iter().all(|f| f.sql_type == SqlType::None));
    }

    #[test]
    fn skip_zero_omits_zero_fields() {
        let user = User {
            name: "Mat".into(),
            age: 24,
            ..Default::default()
        };
        assert_eq!(names(&extract(&user, true).unwrap()), ["name", "age"]);
        assert_eq!(
            names(&extract(&user, false).unwrap()),
            ["id", "name", "email", "age"]
        );
    }

    #[test]
    fn all_zero_with_skip_is_no_fields() {
        let err = extract(&User::default(), true).unwrap_err();
        assert!(matches!(err, OrmError::NoFieldsFound));
    }

    #[test]
    fn references_and_boxes_are_transparent() {
        let user = full_user();
        let by_ref = extract(&&user, true).unwrap();
        let boxed = extract(&Box::new(full_user()), true).unwrap();
        assert_eq!(by_ref, boxed);
    }

    #[test]
    fn serial_key_is_left_out() {
        let key = TableKey::new("id", SqlType::Serial);
        let fields = table_fields::<User>(&key).unwrap();
        assert_eq!(names(&fields), ["name", "email", "age"]);
        assert_eq!(fields[0].sql_type, SqlType::Text);
        assert_eq!(fields[2].sql_type, SqlType::Int);
    }

    #[test]
    fn serial_key_match_ignores_case() {
        let key = TableKey::new("ID", SqlType::Serial);
        let fields = table_fields::<User>(&key).unwrap();
        assert_eq!(names(&fields), ["name", "email", "age"]);
    }

    #[test]
    fn non_serial_key_stays_in() {
        let key = TableKey::new("id", SqlType::Int);
        let fields = table_fields::<User>(&key).unwrap();
        assert_eq!(names(&fields), ["id", "name", "email", "age"]);
        assert_eq!(fields[0].sql_type, SqlType::Int);
    }

    #[test]
    fn unsupported_kind_fails_table_fields() {
        let key = TableKey::new("id", SqlType::Serial);
        let err = table_fields::<Flags>(&key).unwrap_err();
        assert!(matches!(err, OrmError::UnsupportedType { kind: "bool" }));
    }

    #[test]
    fn payload_extraction_does_not_map_types() {
        let fields = extract(&Flags { active: true }, true).unwrap();
        assert_eq!(fields[0].value, Value::Bool(true));
    }
}
