//! `tracing`-based SQL logging.
//!
//! Events go to the `eazydb.sql` target. Nothing is printed unless the
//! application installs a subscriber, and a disabled [`SqlLogger`] emits no
//! events at all.

use std::time::Duration;
use tracing::Level;

/// Emits the statements a client builds and runs.
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Whether any event is emitted.
    pub enabled: bool,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl SqlLogger {
    /// Create an enabled logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A logger that emits nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// A statement was built.
    pub fn constructed(&self, table: &str, sql: &str) {
        if !self.enabled {
            return;
        }
        let sql = self.truncate_sql(sql);
        emit_at_level!(self.level, target: "eazydb.sql", table, sql = %sql, "constructed query");
    }

    /// A statement finished running.
    pub fn executed(
        &self,
        table: &str,
        duration: Duration,
        rows_affected: u64,
        rows_returned: u64,
    ) {
        if !self.enabled {
            return;
        }
        emit_at_level!(
            self.level,
            target: "eazydb.sql",
            table,
            duration_us = duration.as_micros() as u64,
            rows_affected,
            rows_returned,
            "query executed"
        );
    }

    /// Missing columns were added to an existing table.
    pub fn columns_added(&self, table: &str, columns: &[&str]) {
        if !self.enabled {
            return;
        }
        let columns = columns.join(", ");
        emit_at_level!(self.level, target: "eazydb.sql", table, columns = %columns, "added columns");
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
