use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the data-access layer.
///
/// The first group maps to conditions that protocol front-ends translate into client
/// responses (404, 409, 400); the rest are server-side failures.
#[derive(Error, Debug)]
pub enum AriaError {
    #[error("entity not found")]
    NotFound,
    #[error("more than one entity matched a find expecting a single row")]
    MultipleFound,
    #[error("unique constraint violated on insert")]
    UniqueConflict,
    #[error("unsupported search rule '{rule}'")]
    UnsupportedRule { rule: String },
    #[error("unsupported operator '{operator}' for rule '{rule}'")]
    UnsupportedOperator { rule: String, operator: String },
    #[error("dialect '{dialect}' does not provide {feature}")]
    DialectUnavailable { dialect: String, feature: String },
    #[error("failed to parse config file {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("{0}")]
    Generic(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AriaError {
    pub fn unsupported_rule(rule: &str) -> AriaError {
        AriaError::UnsupportedRule { rule: rule.to_string() }
    }

    pub fn unsupported_operator(rule: &str, operator: &str) -> AriaError {
        AriaError::UnsupportedOperator {
            rule: rule.to_string(),
            operator: operator.to_string(),
        }
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AriaError::NotFound
                | AriaError::UniqueConflict
                | AriaError::UnsupportedRule { .. }
                | AriaError::UnsupportedOperator { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AriaError>;
