//! Error types for query building, schema objects and execution.

use thiserror::Error;

use crate::name::ObjectName;

/// Errors raised by schema objects, views and expressions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// A call does not match any accepted argument count.
    #[error("invalid number of arguments: {0}")]
    ArgNum(String),

    /// An argument has a type that is not accepted here.
    #[error("invalid argument type: {0}")]
    ArgType(String),

    /// An argument value is not accepted here.
    #[error("invalid argument value: {0}")]
    ArgValue(String),

    /// A required object was not specified.
    #[error("object not specified: {0}")]
    NotSpecified(String),

    /// A named object could not be found.
    #[error("{message} ({name})")]
    NotFound {
        /// Description of the lookup that failed.
        message: String,
        /// The name that was looked up.
        name: String,
    },

    /// An object belongs to a different owner than the one it was used with.
    #[error("not a self object: {0}")]
    NotSelf(String),

    /// An optional reference (database, table, connection) is not set.
    #[error("{0}")]
    NotSet(String),

    /// A reference that can be set only once is already set.
    #[error("{0}")]
    AlreadySet(String),

    /// A name is already registered.
    #[error("{message} ({name})")]
    NameAlreadyExists {
        /// Description of the registration that failed.
        message: String,
        /// The conflicting name.
        name: String,
    },

    /// A name matches more than one object.
    #[error("ambiguous object: {0}")]
    Ambiguous(String),
}

impl ObjectError {
    /// Creates a [`ObjectError::NotFound`] for the given name.
    pub fn not_found(message: impl Into<String>, name: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: message.into(),
            name: name.to_string(),
        }
    }

    /// Creates a [`ObjectError::NameAlreadyExists`] for the given name.
    pub fn name_exists(message: impl Into<String>, name: &ObjectName) -> Self {
        Self::NameAlreadyExists {
            message: message.into(),
            name: name.to_string(),
        }
    }
}

/// Errors raised while compiling statements or resolving query arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A keyword fragment or identifier is not safe to splice into a statement.
    #[error("invalid query value: {0}")]
    Value(String),

    /// A value of this type cannot be appended to a statement.
    #[error("invalid value type: {0}")]
    Type(String),

    /// Query arguments are inconsistent, missing or unused.
    #[error("query argument error: {0}")]
    Argument(String),
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema, view or expression misuse.
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// Statement compilation or argument resolution failure.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A statement expected to return rows returned none.
    #[error("no results returned by the statement")]
    NoResults,

    /// A statement expected to return nothing returned rows.
    #[error("the statement returned results unexpectedly")]
    ResultExists,

    /// Failure reported by the connection driver.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Driver(err.into())
    }

    /// Returns the inner [`ObjectError`], if any.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectError> {
        match self {
            Self::Object(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the inner [`QueryError`], if any.
    #[must_use]
    pub const fn as_query(&self) -> Option<&QueryError> {
        match self {
            Self::Query(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` for query argument resolution failures.
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        matches!(self, Self::Query(QueryError::Argument(_)))
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(ObjectError::not_found("Column not found.", "price"));
        assert_eq!(err.to_string(), "Column not found. (price)");

        let err = Error::from(QueryError::Argument("Unused arguments exist.".into()));
        assert!(err.is_argument_error());
        assert_eq!(
            err.to_string(),
            "query argument error: Unused arguments exist."
        );
    }

    #[test]
    fn test_driver_error() {
        let err = Error::driver("connection reset");
        assert!(matches!(err, Error::Driver(_)));
        assert!(err.as_object().is_none());
    }
}
