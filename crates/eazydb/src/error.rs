//! Error types for eazydb

use crate::query::Operation;
use thiserror::Error;

/// Result type alias for eazydb operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Broad category of an [`OrmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing table name, invalid option, builder misuse.
    Config,
    /// A field kind with no column type.
    Type,
    /// Nothing could be extracted from a record.
    Extraction,
    /// The statement could not be assembled.
    Build,
    /// Failure reported by the connection provider.
    Execution,
    /// A row could not be decoded into the destination type.
    Conversion,
}

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Configuration or builder misuse
    #[error("Config error: {0}")]
    Config(String),

    /// A second operation was requested on the same query
    #[error("table operation already set to {current} and so cannot be set to {requested}")]
    OperationAlreadySet {
        current: Operation,
        requested: Operation,
    },

    /// Field kind without a column type
    #[error("{kind} is not supported as a column type")]
    UnsupportedType { kind: &'static str },

    /// No tagged (or non-zero) fields were extracted
    #[error("no valid fields found, ensure fields are tagged with #[orm(column = \"name\")]")]
    NoFieldsFound,

    /// Statement construction error
    #[error("Build error: {0}")]
    Build(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row decode/mapping error
    #[error("Conversion error on column '{column}': {message}")]
    Conversion { column: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl OrmError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a conversion error for a specific column
    pub fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::OperationAlreadySet { .. } => ErrorKind::Config,
            Self::UnsupportedType { .. } => ErrorKind::Type,
            Self::NoFieldsFound => ErrorKind::Extraction,
            Self::Build(_) => ErrorKind::Build,
            Self::Query(_) | Self::Connection(_) | Self::NotFound(_) => ErrorKind::Execution,
            #[cfg(feature = "pool")]
            Self::Pool(_) => ErrorKind::Execution,
            Self::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        self.kind() == ErrorKind::Config
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
