//! # eazydb
//!
//! Record-driven SQL for PostgreSQL: describe a table with a tagged struct,
//! then create it, insert into it, query it, update it and delete from it
//! without writing SQL.
//!
//! ## Features
//!
//! - **Tagged records**: `#[derive(Record)]` with `#[orm(column = "...")]`
//!   decides which fields are columns
//! - **Typed conditions**: `string("name").starts_with("Ma")`,
//!   `int("age").greater_than(18)`, combined with `or`
//! - **Parameterized execution**: values are bound as `$n` parameters; the
//!   literal statement text is kept for logs, dry runs and [`Metadata`]
//! - **Additive schema sync**: new tagged fields become new columns
//! - **Pluggable connection**: anything implementing [`Executor`]
//!
//! ## Example
//!
//! ```ignore
//! use eazydb::{Client, ClientOptions, Record, SqlType, int, string};
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(column = "id")]
//!     id: i32,
//!     #[orm(column = "name")]
//!     name: String,
//!     #[orm(column = "age")]
//!     age: i32,
//! }
//!
//! let client = Client::connect(&ClientOptions::from_env()?).await?;
//!
//! // CREATE TABLE IF NOT EXISTS users (id SERIAL PRIMARY KEY, name TEXT, age INT);
//! client
//!     .new_table("users")
//!     .key("id", SqlType::Serial)
//!     .fields::<User>()
//!     .add_new_fields()
//!     .exec()
//!     .await?;
//!
//! // INSERT INTO users (name, age) VALUES ('Mat', 24);
//! client
//!     .table("users")
//!     .add([User { name: "Mat".into(), age: 24, ..Default::default() }])
//!     .exec()
//!     .await?;
//!
//! // SELECT id, name, age FROM users WHERE (name LIKE 'Ma%' OR age > 30) LIMIT 10;
//! let mut users: Vec<User> = Vec::new();
//! let meta = client
//!     .table("users")
//!     .get::<User>()
//!     .filter(string("name").starts_with("Ma").or(int("age").greater_than(30)))
//!     .max_rows(10)
//!     .exec_into(&mut users)
//!     .await?;
//! println!("{} rows in {:?}", meta.rows_returned, meta.duration);
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod log;
pub mod query;
pub mod record;
pub mod row;
pub mod statement;
pub mod table;
pub mod types;
pub mod value;

pub use client::{Client, Executor};
pub use condition::{Condition, IntColumn, Op, StrColumn, int, string};
pub use config::ClientOptions;
pub use error::{ErrorKind, OrmError, OrmResult};
pub use log::SqlLogger;
pub use query::{Metadata, Operation, Query};
pub use record::{ColumnDef, Field, FieldValue, Record, extract};
pub use row::{FromRecord, FromRowSet, RowRef, RowSet, first_record, materialize};
pub use statement::Statement;
pub use table::{TableBuilder, TableKey};
pub use types::{FieldKind, SqlType, map_kind};
pub use value::{ColumnValue, FromValue, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};

#[cfg(feature = "derive")]
pub use eazydb_derive::Record;
