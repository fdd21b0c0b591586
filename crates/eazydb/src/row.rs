//! Row sets and the decoding contracts that turn them into records.
//!
//! Query results are first collected into a [`RowSet`]: column names in the
//! order the database returned them and one [`Value`] per cell. Destinations
//! then decode from that shape through [`FromRowSet`], whether they hold one
//! record, an optional record or many.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, Type};

/// Shape-agnostic query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Create an empty row set with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one value per column.
    pub fn push_row(&mut self, values: Vec<Value>) -> OrmResult<()> {
        if values.len() != self.columns.len() {
            return Err(OrmError::conversion(
                "*",
                format!(
                    "row has {} values for {} columns",
                    values.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(values);
        Ok(())
    }

    /// Builder-style [`RowSet::push_row`].
    pub fn with_row(mut self, values: Vec<Value>) -> OrmResult<Self> {
        self.push_row(values)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn first(&self) -> Option<RowRef<'_>> {
        self.rows().next()
    }

    /// Collect `tokio-postgres` rows, decoding each cell by its column type.
    pub fn from_pg_rows(rows: &[tokio_postgres::Row]) -> OrmResult<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };

        let mut set = Self::new(first.columns().iter().map(|c| c.name()));
        for row in rows {
            let values = (0..row.len())
                .map(|idx| decode_pg_cell(row, idx))
                .collect::<OrmResult<Vec<_>>>()?;
            set.rows.push(values);
        }
        Ok(set)
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a tokio_postgres::Row, idx: usize) -> OrmResult<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| OrmError::conversion(row.columns()[idx].name(), e.to_string()))
}

fn decode_pg_cell(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    let value = if *ty == Type::INT2 {
        get::<i16>(row, idx)?.map(|v| Value::Int(v.into()))
    } else if *ty == Type::INT4 {
        get::<i32>(row, idx)?.map(|v| Value::Int(v.into()))
    } else if *ty == Type::INT8 {
        get::<i64>(row, idx)?.map(Value::Int)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, idx)?.map(|v| Value::Float(v.into()))
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, idx)?.map(Value::Float)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
    {
        get::<String>(row, idx)?.map(Value::Text)
    } else if *ty == Type::TIMESTAMP {
        get::<NaiveDateTime>(row, idx)?.map(Value::Timestamp)
    } else if *ty == Type::TIMESTAMPTZ {
        get::<DateTime<Utc>>(row, idx)?.map(|v| Value::Timestamp(v.naive_utc()))
    } else if *ty == Type::BOOL {
        get::<bool>(row, idx)?.map(Value::Bool)
    } else if *ty == Type::BYTEA {
        get::<Vec<u8>>(row, idx)?.map(Value::Bytes)
    } else {
        return Err(OrmError::conversion(
            column.name(),
            format!("unsupported column type {ty}"),
        ));
    };

    Ok(value.unwrap_or(Value::Null))
}

/// A borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Raw value of a column, if the row has it.
    ///
    /// Unquoted identifiers come back lowercased, so an exact match is tried
    /// first and an ASCII case-insensitive one second.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })
            .map(|i| &self.values[i])
    }

    /// Decode a column into `T`.
    ///
    /// A missing column or a NULL leaves the field at its default.
    pub fn decode<T: FromValue + Default>(&self, column: &str) -> OrmResult<T> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(v) => T::from_value(v).map_err(|message| OrmError::conversion(column, message)),
        }
    }
}

/// Decode one row into a record.
///
/// This trait should typically be derived using `#[derive(Record)]`.
pub trait FromRecord: Sized {
    fn from_row(row: &RowRef<'_>) -> OrmResult<Self>;
}

/// A destination for a whole row set.
///
/// Implemented for `Vec<R>` (every row), `Option<R>` (first row, if any) and,
/// through `#[derive(Record)]`, for `R` itself (first row, `NotFound` when
/// empty).
pub trait FromRowSet: Sized {
    fn from_row_set(rows: &RowSet) -> OrmResult<Self>;
}

impl<R: FromRecord> FromRowSet for Vec<R> {
    fn from_row_set(rows: &RowSet) -> OrmResult<Self> {
        rows.rows().map(|row| R::from_row(&row)).collect()
    }
}

impl<R: FromRecord> FromRowSet for Option<R> {
    fn from_row_set(rows: &RowSet) -> OrmResult<Self> {
        rows.first().map(|row| R::from_row(&row)).transpose()
    }
}

/// Decode the first row of `rows`, failing with `NotFound` when there is none.
pub fn first_record<R: FromRecord>(rows: &RowSet) -> OrmResult<R> {
    let row = rows
        .first()
        .ok_or_else(|| OrmError::not_found("expected one row, got none"))?;
    R::from_row(&row)
}

/// Decode `rows` into `dest`, replacing its contents.
pub fn materialize<D: FromRowSet>(rows: &RowSet, dest: &mut D) -> OrmResult<()> {
    *dest = D::from_row_set(rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct User {
        name: String,
        age: i32,
        nickname: Option<String>,
    }

    impl FromRecord for User {
        fn from_row(row: &RowRef<'_>) -> OrmResult<Self> {
            Ok(Self {
                name: row.decode("name")?,
                age: row.decode("age")?,
                nickname: row.decode("nickname")?,
            })
        }
    }

    fn users() -> RowSet {
        RowSet::new(["name", "age"])
            .with_row(vec![Value::Text("Mat".into()), Value::Int(24)])
            .unwrap()
            .with_row(vec![Value::Text("Ann".into()), Value::Null])
            .unwrap()
    }

    #[test]
    fn empty_set_into_vec_is_empty() {
        let mut out: Vec<User> = vec![User::default()];
        materialize(&RowSet::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn many_rows_into_vec() {
        let out = Vec::<User>::from_row_set(&users()).unwrap();
        assert_eq!(
            out,
            vec![
                User {
                    name: "Mat".into(),
                    age: 24,
                    nickname: None
                },
                User {
                    name: "Ann".into(),
                    age: 0,
                    nickname: None
                },
            ]
        );
    }

    #[test]
    fn option_takes_first_row() {
        let out = Option::<User>::from_row_set(&users()).unwrap();
        assert_eq!(out.map(|u| u.name), Some("Mat".to_string()));
        assert_eq!(Option::<User>::from_row_set(&RowSet::default()).unwrap(), None);
    }

    #[test]
    fn single_record_from_empty_set_is_not_found() {
        let err = first_record::<User>(&RowSet::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn type_mismatch_is_conversion_error() {
        let rows = RowSet::new(["name", "age"])
            .with_row(vec![Value::Text("Mat".into()), Value::Text("old".into())])
            .unwrap();
        match Vec::<User>::from_row_set(&rows) {
            Err(OrmError::Conversion { column, .. }) => assert_eq!(column, "age"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn column_order_is_preserved() {
        let rows = users();
        assert_eq!(rows.columns(), ["name", "age"]);
        assert_eq!(rows.first().unwrap().get("age"), Some(&Value::Int(24)));
    }

    #[test]
    fn mixed_case_column_matches_folded_name() {
        #[derive(Debug, Default)]
        struct Event {
            created_at: i64,
        }
        impl FromRecord for Event {
            fn from_row(row: &RowRef<'_>) -> OrmResult<Self> {
                Ok(Self {
                    created_at: row.decode("createdAt")?,
                })
            }
        }

        let rows = RowSet::new(["id", "createdat"])
            .with_row(vec![Value::Int(1), Value::Int(99)])
            .unwrap();
        let event = first_record::<Event>(&rows).unwrap();
        assert_eq!(event.created_at, 99);
    }

    #[test]
    fn exact_column_name_wins_over_folded() {
        let rows = RowSet::new(["Name", "name"])
            .with_row(vec![Value::Text("quoted".into()), Value::Text("plain".into())])
            .unwrap();
        let row = rows.first().unwrap();
        assert_eq!(row.get("name"), Some(&Value::Text("plain".into())));
        assert_eq!(row.get("NAME"), Some(&Value::Text("quoted".into())));
    }

    #[test]
    fn push_row_checks_width() {
        let mut rows = RowSet::new(["a", "b"]);
        assert!(rows.push_row(vec![Value::Int(1)]).is_err());
        assert!(rows.is_empty());
    }
}
