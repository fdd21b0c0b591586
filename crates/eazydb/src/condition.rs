//! WHERE clause fragments.
//!
//! Conditions are built from typed column factories and combined with
//! [`Condition::or`]. AND is applied by the query across its condition list.
//!
//! # Example
//! ```ignore
//! use eazydb::{int, string};
//!
//! let adults = int("age").greater_or_equal(18);
//! let name = string("name").starts_with("Ma").or(string("name").equals("Bob"));
//! assert_eq!(name.clause(), "(name LIKE 'Ma%' OR name = 'Bob')");
//! ```

use crate::error::OrmResult;
use crate::statement::{Statement, validate_ident};
use crate::value::Value;
use std::fmt;

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// LIKE pattern match
    Like,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Inner {
    Empty,
    Cmp { column: String, op: Op, value: Value },
    Or(Box<Condition>, Box<Condition>),
}

/// An immutable WHERE clause fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(Inner);

impl Default for Condition {
    fn default() -> Self {
        Self::empty()
    }
}

impl Condition {
    /// The empty clause, identity of [`Condition::or`].
    pub fn empty() -> Self {
        Condition(Inner::Empty)
    }

    /// Create a structured condition.
    pub fn new(column: impl Into<String>, op: Op, value: Value) -> Self {
        Condition(Inner::Cmp {
            column: column.into(),
            op,
            value,
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0, Inner::Empty)
    }

    /// Combine into `(self OR other)`.
    ///
    /// An empty receiver yields `other` unchanged; an empty `other` yields
    /// `self`.
    pub fn or(self, other: Condition) -> Condition {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Condition(Inner::Or(Box::new(self), Box::new(other)))
    }

    /// Check every column name in this condition.
    pub fn validate(&self) -> OrmResult<()> {
        match &self.0 {
            Inner::Empty => Ok(()),
            Inner::Cmp { column, .. } => validate_ident(column),
            Inner::Or(a, b) => {
                a.validate()?;
                b.validate()
            }
        }
    }

    /// Append this condition to a statement, binding its values.
    pub fn append_to(&self, stmt: &mut Statement) {
        match &self.0 {
            Inner::Empty => {}
            Inner::Cmp { column, op, value } => {
                stmt.push(column)
                    .push(" ")
                    .push(op.as_str())
                    .push(" ")
                    .push_bind(value.clone());
            }
            Inner::Or(a, b) => {
                stmt.push("(");
                a.append_to(stmt);
                stmt.push(" OR ");
                b.append_to(stmt);
                stmt.push(")");
            }
        }
    }

    /// The clause with its values embedded as literals.
    pub fn clause(&self) -> String {
        let mut stmt = Statement::empty();
        self.append_to(&mut stmt);
        stmt.to_literal_sql()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clause())
    }
}

/// Conditions over a text column.
#[derive(Debug, Clone)]
pub struct StrColumn {
    name: String,
}

/// Start a condition on a text column.
pub fn string(name: impl Into<String>) -> StrColumn {
    StrColumn { name: name.into() }
}

impl StrColumn {
    fn cmp(&self, op: Op, value: String) -> Condition {
        Condition::new(self.name.clone(), op, Value::Text(value))
    }

    /// column = 'value'
    pub fn equals(&self, value: impl Into<String>) -> Condition {
        self.cmp(Op::Eq, value.into())
    }

    /// column != 'value'
    pub fn not_equal(&self, value: impl Into<String>) -> Condition {
        self.cmp(Op::Ne, value.into())
    }

    /// column LIKE '%value%'
    pub fn contains(&self, value: impl AsRef<str>) -> Condition {
        self.cmp(Op::Like, format!("%{}%", value.as_ref()))
    }

    /// column LIKE 'value%'
    pub fn starts_with(&self, value: impl AsRef<str>) -> Condition {
        self.cmp(Op::Like, format!("{}%", value.as_ref()))
    }

    /// column LIKE '%value'
    pub fn ends_with(&self, value: impl AsRef<str>) -> Condition {
        self.cmp(Op::Like, format!("%{}", value.as_ref()))
    }
}

/// Conditions over an integer column.
#[derive(Debug, Clone)]
pub struct IntColumn {
    name: String,
}

/// Start a condition on an integer column.
pub fn int(name: impl Into<String>) -> IntColumn {
    IntColumn { name: name.into() }
}

impl IntColumn {
    fn cmp(&self, op: Op, value: i64) -> Condition {
        Condition::new(self.name.clone(), op, Value::Int(value))
    }

    pub fn equals(&self, value: i64) -> Condition {
        self.cmp(Op::Eq, value)
    }

    pub fn not_equal(&self, value: i64) -> Condition {
        self.cmp(Op::Ne, value)
    }

    pub fn greater_than(&self, value: i64) -> Condition {
        self.cmp(Op::Gt, value)
    }

    pub fn greater_or_equal(&self, value: i64) -> Condition {
        self.cmp(Op::Gte, value)
    }

    pub fn less_than(&self, value: i64) -> Condition {
        self.cmp(Op::Lt, value)
    }

    pub fn less_or_equal(&self, value: i64) -> Condition {
        self.cmp(Op::Lte, value)
    }
}
