//! INSERT / SELECT / UPDATE / DELETE against an existing table.
//!
//! A [`Query`] is created by [`Client::table`] and consumed by
//! [`Query::exec`] or [`Query::exec_into`]. Each query carries exactly one
//! operation; asking for a second one is recorded and reported by `exec`.
//!
//! ```ignore
//! // SELECT name, age FROM users WHERE age = 24 LIMIT 10;
//! let mut users: Vec<User> = Vec::new();
//! client
//!     .table("users")
//!     .get::<User>()
//!     .filter(int("age").equals(24))
//!     .max_rows(10)
//!     .exec_into(&mut users)
//!     .await?;
//!
//! // INSERT INTO users (name, age) VALUES ('Mat', 24);
//! client.table("users").add([User { name: "Mat".into(), age: 24, ..Default::default() }]).exec().await?;
//! ```

use crate::client::{Client, Executor};
use crate::condition::Condition;
use crate::error::{OrmError, OrmResult};
use crate::record::{Field, Record, column_names, extract};
use crate::row::{FromRowSet, RowSet, materialize};
use crate::statement::{Statement, validate_ident};
use std::fmt;
use std::time::{Duration, Instant};

/// The statement kind a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Select,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Select => "SELECT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when a statement ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Statement text with values embedded as literals.
    pub query: String,
    pub duration: Duration,
    /// Rows changed by INSERT/UPDATE/DELETE; 0 when not reported.
    pub rows_affected: u64,
    /// Rows returned by SELECT.
    pub rows_returned: u64,
}

impl Metadata {
    pub(crate) fn new(query: String) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

/// Query builder, created by [`Client::table`].
#[must_use]
pub struct Query<'a, E> {
    client: &'a Client<E>,
    table: String,
    op: Option<Operation>,
    columns: Vec<&'static str>,
    rows: Vec<Vec<Field>>,
    sets: Vec<Field>,
    conditions: Vec<Condition>,
    max_rows: u64,
    dry: bool,
    err_if_none_returned: bool,
    error: Option<OrmError>,
}

impl<'a, E: Executor> Query<'a, E> {
    pub(crate) fn new(client: &'a Client<E>, table: String) -> Self {
        Self {
            client,
            table,
            op: None,
            columns: Vec::new(),
            rows: Vec::new(),
            sets: Vec::new(),
            conditions: Vec::new(),
            max_rows: 0,
            dry: false,
            err_if_none_returned: false,
            error: None,
        }
    }

    fn fail(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Set the operation, or record the conflict if one is already set.
    fn set_op(&mut self, requested: Operation) -> bool {
        if let Some(current) = self.op {
            self.fail(OrmError::OperationAlreadySet { current, requested });
            return false;
        }
        self.op = Some(requested);
        true
    }

    /// SELECT the tagged columns of `R`.
    pub fn get<R: Record>(mut self) -> Self {
        if self.set_op(Operation::Select) {
            match column_names::<R>() {
                Ok(columns) => self.columns = columns,
                Err(e) => self.fail(e),
            }
        }
        self
    }

    /// INSERT one row per record; zero-valued fields are left out.
    ///
    /// Every record in the batch must set the same columns.
    pub fn add<I>(mut self, records: I) -> Self
    where
        I: IntoIterator,
        I::Item: Record,
    {
        if self.set_op(Operation::Insert) {
            for record in records {
                match extract(&record, true) {
                    Ok(fields) => self.rows.push(fields),
                    Err(e) => {
                        self.fail(e);
                        break;
                    }
                }
            }
        }
        self
    }

    /// UPDATE the non-zero fields of `record`.
    pub fn update<R: Record>(mut self, record: R) -> Self {
        if self.set_op(Operation::Update) {
            match extract(&record, true) {
                Ok(fields) => self.sets = fields,
                Err(e) => self.fail(e),
            }
        }
        self
    }

    pub fn delete(mut self) -> Self {
        self.set_op(Operation::Delete);
        self
    }

    /// Add a condition; conditions are joined with AND.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filter_all(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Append `LIMIT n`; 0 means no limit.
    pub fn max_rows(mut self, n: u64) -> Self {
        self.max_rows = n;
        self
    }

    /// Build the statement but do not run it.
    pub fn dry(mut self) -> Self {
        self.dry = true;
        self
    }

    /// Make an empty SELECT result a `NotFound` error.
    pub fn err_if_none_returned(mut self) -> Self {
        self.err_if_none_returned = true;
        self
    }

    fn check(&mut self) -> OrmResult<Operation> {
        if self.table.is_empty() {
            return Err(OrmError::config("a table name is required"));
        }
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.op.ok_or_else(|| {
            OrmError::config("a table operation must be set, eg: table(\"users\").get::<User>()")
        })
    }

    fn build(&self, op: Operation) -> OrmResult<Statement> {
        validate_ident(&self.table)?;
        for condition in &self.conditions {
            condition.validate()?;
        }

        let mut stmt = match op {
            Operation::Select => self.build_select()?,
            Operation::Insert => self.build_insert()?,
            Operation::Update => self.build_update()?,
            Operation::Delete => Statement::new(format!("DELETE FROM {}", self.table)),
        };

        if op != Operation::Insert {
            self.push_where(&mut stmt);
            if self.max_rows > 0 {
                stmt.push(&format!(" LIMIT {}", self.max_rows));
            }
        }
        stmt.push(";");
        Ok(stmt)
    }

    fn build_select(&self) -> OrmResult<Statement> {
        if self.columns.is_empty() {
            return Err(OrmError::NoFieldsFound);
        }
        let mut stmt = Statement::new("SELECT ");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push_ident(column)?;
        }
        stmt.push(" FROM ").push(&self.table);
        Ok(stmt)
    }

    fn build_insert(&self) -> OrmResult<Statement> {
        let Some(first) = self.rows.first() else {
            return Err(OrmError::NoFieldsFound);
        };
        let names: Vec<&str> = first.iter().map(|f| f.name).collect();
        for (i, row) in self.rows.iter().enumerate().skip(1) {
            if !row.iter().map(|f| f.name).eq(names.iter().copied()) {
                let got: Vec<&str> = row.iter().map(|f| f.name).collect();
                return Err(OrmError::build(format!(
                    "record {i} sets columns ({}) but the first record sets ({})",
                    got.join(", "),
                    names.join(", ")
                )));
            }
        }

        let mut stmt = Statement::new(format!("INSERT INTO {} (", self.table));
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push_ident(name)?;
        }
        stmt.push(") VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push("(")
                .push_bind_list(row.iter().map(|f| f.value.clone()))
                .push(")");
        }
        Ok(stmt)
    }

    fn build_update(&self) -> OrmResult<Statement> {
        if self.sets.is_empty() {
            return Err(OrmError::NoFieldsFound);
        }
        let mut stmt = Statement::new(format!("UPDATE {} SET ", self.table));
        for (i, field) in self.sets.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push_ident(field.name)?
                .push(" = ")
                .push_bind(field.value.clone());
        }
        Ok(stmt)
    }

    fn push_where(&self, stmt: &mut Statement) {
        let mut conditions = self.conditions.iter().filter(|c| !c.is_empty());
        let Some(first) = conditions.next() else {
            return;
        };
        stmt.push(" WHERE ");
        first.append_to(stmt);
        for condition in conditions {
            stmt.push(" AND ");
            condition.append_to(stmt);
        }
    }

    /// Build the statement without running it.
    pub fn to_statement(mut self) -> OrmResult<Statement> {
        let op = self.check()?;
        self.build(op)
    }

    async fn run(mut self) -> OrmResult<(Metadata, Option<RowSet>)> {
        let op = self.check()?;
        let stmt = self.build(op)?;
        let logger = self.client.sql_logger();
        let mut metadata = Metadata::new(stmt.to_literal_sql());
        logger.constructed(&self.table, &metadata.query);

        if self.dry {
            return Ok((metadata, None));
        }

        let executor = self.client.executor();
        let sql = stmt.to_sql();
        let params = stmt.params_ref();

        if op != Operation::Select {
            let start = Instant::now();
            let affected = executor.execute(&sql, &params).await?;
            metadata.duration = start.elapsed();
            metadata.rows_affected = affected.unwrap_or(0);
            logger.executed(&self.table, metadata.duration, metadata.rows_affected, 0);
            return Ok((metadata, None));
        }

        let start = Instant::now();
        let rows = executor.query(&sql, &params).await?;
        metadata.duration = start.elapsed();
        metadata.rows_returned = rows.len() as u64;
        logger.executed(&self.table, metadata.duration, 0, metadata.rows_returned);

        if self.err_if_none_returned && rows.is_empty() {
            return Err(OrmError::not_found(format!(
                "no rows returned from table {}",
                self.table
            )));
        }
        Ok((metadata, Some(rows)))
    }

    /// Run the query, discarding any returned rows.
    pub async fn exec(self) -> OrmResult<Metadata> {
        let (metadata, _) = self.run().await?;
        Ok(metadata)
    }

    /// Run the query and decode returned rows into `dest`.
    ///
    /// `dest` is only written when the query returns rows, i.e. a SELECT that
    /// is not a dry run.
    pub async fn exec_into<D>(self, dest: &mut D) -> OrmResult<Metadata>
    where
        D: FromRowSet + Send,
    {
        let (metadata, rows) = self.run().await?;
        if let Some(rows) = rows {
            materialize(&rows, dest)?;
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests;
