//! Placeholder-aware SQL fragments.
//!
//! A [`Statement`] stores SQL text and bound values separately. It renders two
//! ways:
//! - [`Statement::to_sql`]: `$1, $2, ...` placeholders, used for execution
//! - [`Statement::to_literal_sql`]: values embedded as literals, used for
//!   logging, dry runs and [`Metadata`](crate::Metadata)
//!
//! ```ignore
//! let mut s = Statement::new("SELECT name FROM users WHERE age = ");
//! s.push_bind(Value::Int(24)).push(";");
//! assert_eq!(s.to_sql(), "SELECT name FROM users WHERE age = $1;");
//! assert_eq!(s.to_literal_sql(), "SELECT name FROM users WHERE age = 24;");
//! ```

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::fmt::{self, Write};
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Raw(String),
    Param(usize),
}

/// SQL text with separately bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    parts: Vec<Part>,
    params: Vec<Value>,
}

impl Statement {
    /// Create a statement from an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let initial_sql: String = initial_sql.into();
        let mut s = Self::default();
        s.push(&initial_sql);
        s
    }

    /// Create an empty statement.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(Part::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        self.parts.push(Part::Param(self.params.len() - 1));
        self
    }

    /// Append a comma-separated list of placeholders.
    pub fn push_bind_list(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_bind(v);
        }
        self
    }

    /// Append another statement, renumbering its parameters.
    pub fn push_statement(&mut self, other: &Statement) -> &mut Self {
        let offset = self.params.len();
        self.params.extend(other.params.iter().cloned());
        for part in &other.parts {
            match part {
                Part::Raw(s) => {
                    self.push(s);
                }
                Part::Param(i) => self.parts.push(Part::Param(offset + i)),
            }
        }
        self
    }

    /// Append a SQL identifier (table/column).
    ///
    /// Identifiers cannot be parameterized, so each `.`-separated segment must
    /// match `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn push_ident(&mut self, ident: &str) -> OrmResult<&mut Self> {
        validate_ident(ident)?;
        Ok(self.push(ident))
    }

    /// Render with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param(i) => {
                    let _ = write!(&mut out, "${}", i + 1);
                }
            }
        }
        out
    }

    /// Render with values embedded as SQL literals.
    pub fn to_literal_sql(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param(i) => out.push_str(&self.params[*i].to_literal()),
            }
        }
        out
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal_sql())
    }
}

/// Check that `ident` is a plain or dotted SQL identifier.
pub fn validate_ident(ident: &str) -> OrmResult<()> {
    if ident.is_empty() {
        return Err(OrmError::config("empty identifier"));
    }

    for seg in ident.split('.') {
        let mut chars = seg.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
        if !first_ok || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err(OrmError::config(format!("invalid identifier '{ident}'")));
        }
    }
    Ok(())
}
