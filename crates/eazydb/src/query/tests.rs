use super::*;
use crate::condition::{int, string};
use crate::error::ErrorKind;
use crate::record::{ColumnDef, FieldValue};
use crate::row::{FromRecord, RowRef};
use crate::types::FieldKind;
use crate::value::{ColumnValue, Value};
use std::sync::Mutex;
use tokio_postgres::types::ToSql;

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    name: String,
    age: i32,
}

impl Record for User {
    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef {
            name: "name",
            kind: FieldKind::String,
        },
        ColumnDef {
            name: "age",
            kind: FieldKind::I32,
        },
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue {
                value: self.name.to_value(),
                zero: self.name.is_zero(),
            },
            FieldValue {
                value: self.age.to_value(),
                zero: self.age.is_zero(),
            },
        ]
    }
}

impl FromRecord for User {
    fn from_row(row: &RowRef<'_>) -> OrmResult<Self> {
        Ok(Self {
            name: row.decode("name")?,
            age: row.decode("age")?,
        })
    }
}

fn user(name: &str, age: i32) -> User {
    User {
        name: name.to_string(),
        age,
    }
}

#[derive(Default)]
struct MockExecutor {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    rows: RowSet,
    affected: Option<u64>,
}

impl MockExecutor {
    fn returning(rows: RowSet) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn affecting(n: Option<u64>) -> Self {
        Self {
            affected: n,
            ..Self::default()
        }
    }

    fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) {
        let params = params.iter().map(|p| format!("{p:?}")).collect();
        self.calls.lock().unwrap().push((sql.to_string(), params));
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for MockExecutor {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<u64>> {
        self.record(sql, params);
        Ok(self.affected)
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<RowSet> {
        self.record(sql, params);
        Ok(self.rows.clone())
    }
}

fn literal(query: Query<'_, MockExecutor>) -> String {
    query.to_statement().unwrap().to_literal_sql()
}

#[test]
fn select_renders_tagged_columns() {
    let client = Client::new(MockExecutor::default());
    let q = client
        .table("users")
        .get::<User>()
        .filter(int("age").equals(24));
    assert_eq!(literal(q), "SELECT name, age FROM users WHERE age = 24;");
}

#[test]
fn select_binds_condition_values() {
    let client = Client::new(MockExecutor::default());
    let stmt = client
        .table("users")
        .get::<User>()
        .filter(string("name").equals("Mat"))
        .filter(int("age").greater_than(10))
        .max_rows(5)
        .to_statement()
        .unwrap();
    assert_eq!(
        stmt.to_sql(),
        "SELECT name, age FROM users WHERE name = $1 AND age > $2 LIMIT 5;"
    );
    assert_eq!(
        stmt.params(),
        &[Value::Text("Mat".into()), Value::Int(10)]
    );
}

#[test]
fn zero_max_rows_has_no_limit() {
    let client = Client::new(MockExecutor::default());
    let q = client.table("users").get::<User>().max_rows(0);
    assert_eq!(literal(q), "SELECT name, age FROM users;");
}

#[test]
fn empty_conditions_are_skipped() {
    let client = Client::new(MockExecutor::default());
    let q = client
        .table("users")
        .get::<User>()
        .filter(Condition::empty())
        .filter(int("age").less_or_equal(30))
        .filter(Condition::empty());
    assert_eq!(literal(q), "SELECT name, age FROM users WHERE age <= 30;");

    let q = client.table("users").get::<User>().filter(Condition::empty());
    assert_eq!(literal(q), "SELECT name, age FROM users;");
}

#[test]
fn or_conditions_keep_parentheses() {
    let client = Client::new(MockExecutor::default());
    let q = client.table("users").delete().filter_all([
        int("age").less_than(18).or(int("age").greater_than(65)),
        string("name").starts_with("M"),
    ]);
    assert_eq!(
        literal(q),
        "DELETE FROM users WHERE (age < 18 OR age > 65) AND name LIKE 'M%';"
    );
}

#[test]
fn insert_single_record() {
    let client = Client::new(MockExecutor::default());
    let q = client.table("users").add([user("Mat", 24)]);
    assert_eq!(literal(q), "INSERT INTO users (name, age) VALUES ('Mat', 24);");
}

#[test]
fn insert_batch_uses_one_statement() {
    let client = Client::new(MockExecutor::default());
    let stmt = client
        .table("users")
        .add(vec![user("Mat", 24), user("Ann", 31)])
        .to_statement()
        .unwrap();
    assert_eq!(
        stmt.to_sql(),
        "INSERT INTO users (name, age) VALUES ($1, $2), ($3, $4);"
    );
    assert_eq!(
        stmt.to_literal_sql(),
        "INSERT INTO users (name, age) VALUES ('Mat', 24), ('Ann', 31);"
    );
}

#[test]
fn insert_skips_zero_fields() {
    let client = Client::new(MockExecutor::default());
    let q = client.table("users").add([user("Mat", 0)]);
    assert_eq!(literal(q), "INSERT INTO users (name) VALUES ('Mat');");
}

#[test]
fn insert_accepts_references() {
    let client = Client::new(MockExecutor::default());
    let users = [user("Mat", 24)];
    let q = client.table("users").add(&users);
    assert_eq!(literal(q), "INSERT INTO users (name, age) VALUES ('Mat', 24);");
}

#[test]
fn heterogeneous_batch_is_rejected() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("users")
        .add([user("Mat", 24), user("Ann", 0)])
        .to_statement()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Build);
}

#[test]
fn empty_batch_is_no_fields() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("users")
        .add(Vec::<User>::new())
        .to_statement()
        .unwrap_err();
    assert!(matches!(err, OrmError::NoFieldsFound));
}

#[test]
fn all_zero_record_is_no_fields() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("users")
        .update(User::default())
        .to_statement()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[test]
fn update_sets_non_zero_fields() {
    let client = Client::new(MockExecutor::default());
    let q = client
        .table("users")
        .update(user("Bob", 0))
        .filter(string("name").equals("Mat"));
    assert_eq!(literal(q), "UPDATE users SET name = 'Bob' WHERE name = 'Mat';");
}

#[test]
fn delete_without_where_is_allowed() {
    let client = Client::new(MockExecutor::default());
    assert_eq!(literal(client.table("users").delete()), "DELETE FROM users;");
}

#[test]
fn second_operation_is_reported() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("users")
        .get::<User>()
        .delete()
        .to_statement()
        .unwrap_err();
    match &err {
        OrmError::OperationAlreadySet { current, requested } => {
            assert_eq!(*current, Operation::Select);
            assert_eq!(*requested, Operation::Delete);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "table operation already set to SELECT and so cannot be set to DELETE"
    );
}

#[test]
fn missing_table_name_is_reported_first() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("")
        .get::<User>()
        .delete()
        .to_statement()
        .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("table name"));
}

#[test]
fn missing_operation_is_config_error() {
    let client = Client::new(MockExecutor::default());
    let err = client.table("users").to_statement().unwrap_err();
    assert!(err.is_config());
}

#[test]
fn invalid_table_name_is_rejected() {
    let client = Client::new(MockExecutor::default());
    let err = client
        .table("users; DROP TABLE users")
        .delete()
        .to_statement()
        .unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
async fn dry_run_never_calls_executor() {
    let client = Client::new(MockExecutor::affecting(Some(1)));
    let meta = client
        .table("users")
        .add([user("Mat", 24)])
        .dry()
        .exec()
        .await
        .unwrap();
    assert_eq!(meta.query, "INSERT INTO users (name, age) VALUES ('Mat', 24);");
    assert_eq!(meta.rows_affected, 0);
    assert_eq!(meta.duration, Duration::ZERO);
    assert!(client.executor().calls().is_empty());
}

#[tokio::test]
async fn errors_are_returned_before_executor_is_called() {
    let client = Client::new(MockExecutor::default());
    assert!(client.table("users").exec().await.is_err());
    assert!(client.table("").delete().exec().await.is_err());
    assert!(
        client
            .table("users")
            .delete()
            .update(user("a", 1))
            .exec()
            .await
            .is_err()
    );
    assert!(client.executor().calls().is_empty());
}

#[tokio::test]
async fn exec_runs_parameterized_sql() {
    let client = Client::new(MockExecutor::affecting(Some(2)));
    let meta = client
        .table("users")
        .delete()
        .filter(string("name").equals("Mat"))
        .exec()
        .await
        .unwrap();

    assert_eq!(meta.rows_affected, 2);
    assert_eq!(meta.query, "DELETE FROM users WHERE name = 'Mat';");
    let calls = client.executor().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "DELETE FROM users WHERE name = $1;");
    assert_eq!(calls[0].1.len(), 1);
}

#[tokio::test]
async fn unknown_rows_affected_is_zero() {
    let client = Client::new(MockExecutor::affecting(None));
    let meta = client.table("users").delete().exec().await.unwrap();
    assert_eq!(meta.rows_affected, 0);
}

#[tokio::test]
async fn select_materializes_rows() {
    let rows = RowSet::new(["name", "age"])
        .with_row(vec![Value::Text("Mat".into()), Value::Int(24)])
        .unwrap()
        .with_row(vec![Value::Text("Ann".into()), Value::Int(31)])
        .unwrap();
    let client = Client::new(MockExecutor::returning(rows));

    let mut users: Vec<User> = Vec::new();
    let meta = client
        .table("users")
        .get::<User>()
        .exec_into(&mut users)
        .await
        .unwrap();

    assert_eq!(meta.rows_returned, 2);
    assert_eq!(users, vec![user("Mat", 24), user("Ann", 31)]);
}

#[tokio::test]
async fn select_into_option_takes_first_row() {
    let rows = RowSet::new(["name", "age"])
        .with_row(vec![Value::Text("Mat".into()), Value::Int(24)])
        .unwrap();
    let client = Client::new(MockExecutor::returning(rows));

    let mut found: Option<User> = None;
    client
        .table("users")
        .get::<User>()
        .max_rows(1)
        .exec_into(&mut found)
        .await
        .unwrap();
    assert_eq!(found, Some(user("Mat", 24)));
}

#[tokio::test]
async fn empty_result_with_err_if_none_returned() {
    let client = Client::new(MockExecutor::default());

    let mut users: Vec<User> = vec![user("stale", 1)];
    let meta = client
        .table("users")
        .get::<User>()
        .exec_into(&mut users)
        .await
        .unwrap();
    assert_eq!(meta.rows_returned, 0);
    assert!(users.is_empty());

    let err = client
        .table("users")
        .get::<User>()
        .err_if_none_returned()
        .exec_into(&mut users)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn dry_select_leaves_destination_untouched() {
    let client = Client::new(MockExecutor::default());
    let mut users = vec![user("kept", 1)];
    client
        .table("users")
        .get::<User>()
        .dry()
        .exec_into(&mut users)
        .await
        .unwrap();
    assert_eq!(users, vec![user("kept", 1)]);
}
