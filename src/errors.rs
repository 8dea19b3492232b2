//! Error types for the directory filter/context core.
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for the filter AST and operation-context core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A filter node was constructed in violation of a §3.3 invariant
    /// (e.g. an empty attribute name, or a substring filter with no
    /// initial/any/final component).
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Refinement rendering was attempted on a node that is not one of
    /// {And, Or, Not, Equality on objectClass}.
    #[error("filter is not refinable: {0}")]
    NotRefinable(String),

    /// A distinguished name failed to parse.
    #[error("invalid DN: {0}")]
    InvalidDn(String),

    /// An RDN component failed to parse.
    #[error("invalid RDN: {0}")]
    InvalidRdn(String),

    /// A collateral sub-operation re-entered the chain past the
    /// configured maximum depth.
    #[error("collateral recursion too deep (max {max}, attempted depth {attempted})")]
    CollateralRecursionTooDeep {
        /// Configured maximum depth.
        max: u32,
        /// Depth at which the bound was exceeded.
        attempted: u32,
    },

    /// A compose-name operation's configured prefix is not an ancestor
    /// of the name being composed.
    #[error("prefix is not an ancestor of the composed name: {0}")]
    PrefixNotAnAncestor(String),

    /// An Abandon was observed for the in-flight operation at a
    /// cancellation checkpoint.
    #[error("operation cancelled: message id {0}")]
    CancellationRequested(u32),

    /// An error surfaced unchanged from the backend nexus.
    #[error("backend failure: {0}")]
    BackendFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Interceptor chain or crate configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<std::env::VarError> for CoreError {
    fn from(err: std::env::VarError) -> Self {
        CoreError::Configuration(err.to_string())
    }
}
