//! Core error type for compilation and search failures

use thiserror::Error;

pub use super::error_code::*;

/// Main error type. Every failure aborts the whole request; there are no
/// partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The request envelope or its options are malformed
    #[error("{code}: invalid search request: {message}", code = FS0001)]
    InvalidRequest { message: String },

    /// Wrong argument shape or arity for an operator
    #[error("{code}: malformed expression for '{operator}': {message}", code = FS0002)]
    MalformedExpression { operator: String, message: String },

    /// Operator name absent from the registry
    #[error("{code}: unknown operator '{name}'", code = FS0003)]
    UnknownOperator { name: String },

    /// Registration refused by the collision policy
    #[error("{code}: operator '{name}' is already registered", code = FS0004)]
    OperatorConflict { name: String },

    /// Path absent from the root type's metadata catalog
    #[error("{code}: unknown field '{path}' on entity '{entity}'", code = FS0051)]
    UnknownField { entity: String, path: String },

    /// Entity type not registered in the schema
    #[error("{code}: unknown entity '{entity}'", code = FS0052)]
    UnknownEntity { entity: String },

    /// Literal cannot be converted, enum cannot be resolved, or a declared
    /// constraint is violated
    #[error("{code}: cannot coerce {value} to {target}: {message}", code = FS0053)]
    TypeCoercion {
        value: String,
        target: String,
        message: String,
    },

    /// A narrowing step has no valid target type along the traversal
    #[error(
        "{code}: cannot reach '{segment}' of path '{path}': '{declaring_type}' is not related to '{current_type}'",
        code = FS0054
    )]
    UnresolvableJoin {
        path: String,
        segment: String,
        declaring_type: String,
        current_type: String,
    },

    /// Schema declaration error
    #[error("{code}: invalid schema for '{entity}': {message}", code = FS0101)]
    InvalidSchema { entity: String, message: String },

    /// Failure reported by the query engine
    #[error("{code}: query execution failed: {message}", code = FS0151)]
    Execution { message: String },
}

impl SearchError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn malformed(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedExpression {
            operator: operator.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field(entity: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            path: path.into(),
        }
    }

    pub fn coercion(
        value: impl std::fmt::Display,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TypeCoercion {
            value: value.to_string(),
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn invalid_schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => FS0001,
            Self::MalformedExpression { .. } => FS0002,
            Self::UnknownOperator { .. } => FS0003,
            Self::OperatorConflict { .. } => FS0004,
            Self::UnknownField { .. } => FS0051,
            Self::UnknownEntity { .. } => FS0052,
            Self::TypeCoercion { .. } => FS0053,
            Self::UnresolvableJoin { .. } => FS0054,
            Self::InvalidSchema { .. } => FS0101,
            Self::Execution { .. } => FS0151,
        }
    }

    /// Get error information with help text
    pub fn error_info(&self) -> &'static ErrorInfo {
        self.error_code().info()
    }
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
