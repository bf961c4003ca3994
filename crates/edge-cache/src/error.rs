//! Cache policy error types.

use thiserror::Error;

/// Result type for cache policy operations.
pub type CachePolicyResult<T> = Result<T, CachePolicyError>;

/// Errors raised while configuring cache directives.
///
/// These indicate a programming or configuration mistake. A priority request
/// that loses to a stronger one is not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CachePolicyError {
    /// Unrecognized cache state label.
    #[error("invalid cache state: {0}")]
    InvalidState(String),

    /// Directive name outside the configured allow-list.
    #[error("invalid cache directive: {0}")]
    InvalidDirective(String),

    /// Unset or unrepresentable directive value.
    #[error("invalid value for cache directive {0}")]
    InvalidValue(String),

    /// Header that cannot be written to an HTTP response.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
