//! Connection providers and the client facade.

use crate::config::ClientOptions;
use crate::error::OrmResult;
use crate::log::SqlLogger;
use crate::query::Query;
use crate::row::RowSet;
use crate::table::TableBuilder;
use tokio_postgres::types::ToSql;

/// Anything that can run SQL for a [`Client`].
///
/// Implemented for `tokio_postgres::Client`, `deadpool_postgres::Pool`
/// (feature `pool`) and references to either.
pub trait Executor: Send + Sync {
    /// Run a statement that returns no rows.
    ///
    /// Returns the number of affected rows, or `None` when the provider cannot
    /// report it.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Option<u64>>> + Send;

    /// Run a query and collect every row.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<RowSet>> + Send;
}

impl Executor for tokio_postgres::Client {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<u64>> {
        let affected = tokio_postgres::Client::execute(self, sql, params).await?;
        Ok(Some(affected))
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<RowSet> {
        let rows = tokio_postgres::Client::query(self, sql, params).await?;
        RowSet::from_pg_rows(&rows)
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Pool {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<u64>> {
        let conn = self.get().await?;
        let client: &tokio_postgres::Client = &conn;
        Executor::execute(client, sql, params).await
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<RowSet> {
        let conn = self.get().await?;
        let client: &tokio_postgres::Client = &conn;
        Executor::query(client, sql, params).await
    }
}

impl<E: Executor> Executor for &E {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<u64>> {
        (*self).execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<RowSet> {
        (*self).query(sql, params).await
    }
}

/// Entry point for building queries and table definitions.
///
/// ```ignore
/// let client = Client::connect(&ClientOptions::from_env()?).await?;
///
/// client.new_table("users").key("id", SqlType::Serial).fields::<User>().exec().await?;
///
/// let mut users: Vec<User> = Vec::new();
/// client
///     .table("users")
///     .get::<User>()
///     .filter(int("age").greater_than(18))
///     .exec_into(&mut users)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client<E> {
    executor: E,
    schema: String,
    logger: SqlLogger,
}

impl<E: Executor> Client<E> {
    /// Wrap an executor with default settings (schema `public`, logging off).
    pub fn new(executor: E) -> Self {
        Self::with_options(executor, &ClientOptions::default())
    }

    /// Wrap an executor, taking the schema and logging flag from `options`.
    pub fn with_options(executor: E, options: &ClientOptions) -> Self {
        Self {
            executor,
            schema: options.schema.clone(),
            logger: options.sql_logger(),
        }
    }

    /// Replace the SQL logger.
    pub fn logger(mut self, logger: SqlLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Schema searched when reading existing table columns.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn sql_logger(&self) -> &SqlLogger {
        &self.logger
    }

    pub(crate) fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Start a query against an existing table.
    pub fn table(&self, name: impl Into<String>) -> Query<'_, E> {
        Query::new(self, name.into())
    }

    /// Start a table definition.
    pub fn new_table(&self, name: impl Into<String>) -> TableBuilder<'_, E> {
        TableBuilder::new(self, name.into())
    }
}

#[cfg(feature = "pool")]
impl Client<deadpool_postgres::Pool> {
    /// Build a pool from `options` and check that a connection can be made.
    pub async fn connect(options: &ClientOptions) -> OrmResult<Self> {
        let pool = crate::pool::create_pool(options)?;
        let conn = pool
            .get()
            .await
            .map_err(|e| crate::error::OrmError::Connection(e.to_string()))?;
        drop(conn);
        Ok(Self::with_options(pool, options))
    }
}
