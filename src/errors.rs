use thiserror::Error;

use crate::guard::Method;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure surfaced by a rule while a request is being evaluated.
///
/// The evaluator never inspects or wraps it; it reaches the pipeline as-is.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single rule or predicate evaluation.
pub type RuleResult<T> = std::result::Result<T, BoxError>;

/// Configuration errors. These are raised while rules are built or routes are
/// registered, never while a request is being served.
#[derive(Debug, Error)]
pub enum Error {
    #[error("An error occurred deserializing options {0}.")]
    Deserializing(#[source] serde_json::Error),

    #[error("Invalid options: {0}.")]
    InvalidOptions(String),

    #[error("Invalid parameter specifier: {0}.")]
    InvalidParameter(String),

    #[error("Route does not have an authorization middleware: {method} {path}")]
    UnprotectedRoute { method: Method, path: String },
}
