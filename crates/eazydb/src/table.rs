//! Table definitions: `CREATE TABLE` plus additive column sync.
//!
//! ```ignore
//! client
//!     .new_table("users")
//!     .key("id", SqlType::Serial)
//!     .fields::<User>()
//!     .add_new_fields()
//!     .exec()
//!     .await?;
//! ```
//!
//! Column sync only ever adds columns. Existing columns are never dropped or
//! retyped.

use crate::client::{Client, Executor};
use crate::error::{OrmError, OrmResult};
use crate::query::Metadata;
use crate::record::{Field, Record, table_fields};
use crate::statement::{Statement, validate_ident};
use crate::types::SqlType;
use crate::value::Value;
use std::time::Instant;

/// Primary key of a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKey {
    pub name: String,
    pub sql_type: SqlType,
}

impl TableKey {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

type FieldSource = fn(&TableKey) -> OrmResult<Vec<Field>>;

/// Builder for `CREATE TABLE`, created by [`Client::new_table`].
#[must_use]
pub struct TableBuilder<'a, E> {
    client: &'a Client<E>,
    name: String,
    key: Option<TableKey>,
    fields: Option<FieldSource>,
    error_if_exists: bool,
    add_new_fields: bool,
    dry: bool,
}

impl<'a, E: Executor> TableBuilder<'a, E> {
    pub(crate) fn new(client: &'a Client<E>, name: String) -> Self {
        Self {
            client,
            name,
            key: None,
            fields: None,
            error_if_exists: false,
            add_new_fields: false,
            dry: false,
        }
    }

    /// Set the primary key column.
    pub fn key(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.key = Some(TableKey::new(name, sql_type));
        self
    }

    /// Take the columns from the tagged fields of `R`.
    pub fn fields<R: Record>(mut self) -> Self {
        self.fields = Some(table_fields::<R>);
        self
    }

    /// Fail if the table already exists.
    pub fn error_if_exists(mut self) -> Self {
        self.error_if_exists = true;
        self
    }

    /// Add declared columns the existing table is missing.
    pub fn add_new_fields(mut self) -> Self {
        self.add_new_fields = true;
        self
    }

    /// Build without touching the database.
    pub fn dry(mut self) -> Self {
        self.dry = true;
        self
    }

    fn resolve(&self) -> OrmResult<(&TableKey, Vec<Field>)> {
        if self.name.is_empty() {
            return Err(OrmError::config("a table name is required"));
        }
        validate_ident(&self.name)?;

        let key = self
            .key
            .as_ref()
            .ok_or_else(|| OrmError::config("a primary key is required, set one with key()"))?;
        validate_ident(&key.name)?;

        let source = self.fields.ok_or_else(|| {
            OrmError::config("table fields are required, set them with fields::<R>()")
        })?;
        let fields = source(key)?;
        for field in &fields {
            validate_ident(field.name)?;
        }
        Ok((key, fields))
    }

    /// The `CREATE TABLE` statement this builder runs.
    pub fn to_statement(&self) -> OrmResult<Statement> {
        let (key, fields) = self.resolve()?;
        Ok(create_statement(
            &self.name,
            key,
            &fields,
            !self.error_if_exists,
        ))
    }

    /// Create the table, then add missing columns if requested.
    pub async fn exec(self) -> OrmResult<Metadata> {
        let (key, fields) = self.resolve()?;
        let create = create_statement(&self.name, key, &fields, !self.error_if_exists);
        let logger = self.client.sql_logger();
        let mut metadata = Metadata::new(create.to_literal_sql());
        logger.constructed(&self.name, &metadata.query);

        if self.dry {
            return Ok(metadata);
        }

        let executor = self.client.executor();
        let start = Instant::now();
        let affected = executor
            .execute(&create.to_sql(), &create.params_ref())
            .await?;

        if self.add_new_fields {
            let existing =
                existing_columns(executor, self.client.schema_name(), &self.name).await?;
            if existing.is_empty() {
                tracing::warn!(
                    target: "eazydb.sql",
                    table = %self.name,
                    schema = self.client.schema_name(),
                    "no columns found in information_schema, skipping column sync"
                );
            } else if let Some(alter) = alter_statement(&self.name, &fields, &existing) {
                let alter_sql = alter.to_literal_sql();
                logger.constructed(&self.name, &alter_sql);
                executor.execute(&alter.to_sql(), &alter.params_ref()).await?;

                let added: Vec<&str> = missing_fields(&fields, &existing)
                    .map(|f| f.name)
                    .collect();
                logger.columns_added(&self.name, &added);
                metadata.query.push('\n');
                metadata.query.push_str(&alter_sql);
            }
        }

        metadata.duration = start.elapsed();
        metadata.rows_affected = affected.unwrap_or(0);
        logger.executed(&self.name, metadata.duration, metadata.rows_affected, 0);
        Ok(metadata)
    }
}

/// `CREATE TABLE [IF NOT EXISTS] <name> (<key> <type> PRIMARY KEY, <col> <type>, ...);`
///
/// A field named like the key is rendered only once, as the key clause.
pub fn create_statement(
    name: &str,
    key: &TableKey,
    fields: &[Field],
    if_not_exists: bool,
) -> Statement {
    let mut stmt = Statement::new("CREATE TABLE ");
    if if_not_exists {
        stmt.push("IF NOT EXISTS ");
    }
    stmt.push(name)
        .push(" (")
        .push(&key.name)
        .push(" ")
        .push(key.sql_type.column_type())
        .push(" PRIMARY KEY");

    for field in fields
        .iter()
        .filter(|f| !f.name.eq_ignore_ascii_case(&key.name))
    {
        stmt.push(", ")
            .push(field.name)
            .push(" ")
            .push(field.sql_type.column_type());
    }
    stmt.push(");");
    stmt
}

fn missing_fields<'f>(
    fields: &'f [Field],
    existing: &'f [String],
) -> impl Iterator<Item = &'f Field> + 'f {
    fields
        .iter()
        .filter(move |f| !existing.iter().any(|c| c.eq_ignore_ascii_case(f.name)))
}

/// `ALTER TABLE <name> ADD COLUMN <col> <type>[, ADD COLUMN ...];` for every
/// field missing from `existing`, or `None` when nothing is missing.
pub fn alter_statement(name: &str, fields: &[Field], existing: &[String]) -> Option<Statement> {
    let mut missing = missing_fields(fields, existing).peekable();
    missing.peek()?;

    let mut stmt = Statement::new("ALTER TABLE ");
    stmt.push(name);
    for (i, field) in missing.enumerate() {
        stmt.push(if i == 0 { " " } else { ", " })
            .push("ADD COLUMN ")
            .push(field.name)
            .push(" ")
            .push(field.sql_type.column_type());
    }
    stmt.push(";");
    Some(stmt)
}

/// Catalog lookup for the columns of `schema.table`.
///
/// Both names are folded to lowercase, as PostgreSQL stores unquoted
/// identifiers.
fn columns_statement(schema: &str, table: &str) -> Statement {
    let mut stmt = Statement::new(
        "SELECT column_name::text AS column_name FROM information_schema.columns WHERE table_name = ",
    );
    stmt.push_bind(Value::Text(table.to_ascii_lowercase()))
        .push(" AND table_schema = ")
        .push_bind(Value::Text(schema.to_ascii_lowercase()))
        .push(";");
    stmt
}

/// Column names of an existing table, empty when the table does not exist.
pub async fn existing_columns<E: Executor>(
    executor: &E,
    schema: &str,
    table: &str,
) -> OrmResult<Vec<String>> {
    let stmt = columns_statement(schema, table);
    let rows = executor.query(&stmt.to_sql(), &stmt.params_ref()).await?;
    rows.rows()
        .map(|row| row.decode::<String>("column_name"))
        .collect()
}
