//! Error types for the aggregate library.

use thiserror::Error;

/// Result type for aggregate operations.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Errors that can occur while configuring, feeding or registering aggregates.
///
/// Non-numeric cells and empty inputs are not errors: the former are skipped
/// and the latter finalize to [`AggregateValue::NoData`](crate::AggregateValue::NoData).
/// Everything here aborts the current aggregation group.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// A fold received the wrong number of per-row arguments.
    #[error("{aggregate}: expected {expected} argument(s), got {found}")]
    Arity {
        aggregate: String,
        expected: usize,
        found: usize,
    },

    /// A static parameter was missing, malformed or out of range.
    #[error("{aggregate}: invalid configuration: {message}")]
    InvalidConfiguration { aggregate: String, message: String },

    /// A folded value lies outside the domain of the aggregate.
    #[error("{aggregate}: value {value} is outside the domain: {message}")]
    Domain {
        aggregate: String,
        value: f64,
        message: String,
    },

    /// No aggregate with this name is registered.
    #[error("Unknown aggregate: {0}")]
    UnknownAggregate(String),

    /// SQLite rejected a registration.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// DataFusion query execution error.
    #[error("Query execution failed: {0}")]
    QueryExecution(#[from] datafusion::error::DataFusionError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AggregateError {
    /// Creates an arity error for the named aggregate.
    pub fn arity(aggregate: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::Arity {
            aggregate: aggregate.into(),
            expected,
            found,
        }
    }

    /// Creates an invalid configuration error with the given message.
    pub fn invalid_config(aggregate: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            aggregate: aggregate.into(),
            message: msg.into(),
        }
    }

    /// Creates a domain violation error for the offending value.
    pub fn domain(aggregate: impl Into<String>, value: f64, msg: impl Into<String>) -> Self {
        Self::Domain {
            aggregate: aggregate.into(),
            value,
            message: msg.into(),
        }
    }

    /// Returns true for errors caused by how the aggregate was invoked
    /// (argument count, parameters, unknown name).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Arity { .. } | Self::InvalidConfiguration { .. } | Self::UnknownAggregate(_)
        )
    }

    /// Returns true for domain violations raised by a fold.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    /// Name of the aggregate the error is about, when known.
    pub fn aggregate(&self) -> Option<&str> {
        match self {
            Self::Arity { aggregate, .. }
            | Self::InvalidConfiguration { aggregate, .. }
            | Self::Domain { aggregate, .. } => Some(aggregate),
            Self::UnknownAggregate(name) => Some(name),
            _ => None,
        }
    }
}

/// Converts serde_json errors to AggregateError.
impl From<serde_json::Error> for AggregateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
