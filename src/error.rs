//! Error types for the lubrication law and its queries.

use thiserror::Error;

use crate::utils::allocator::BodyId;

/// Result type alias for fallible lubrication operations.
pub type Result<T> = std::result::Result<T, LubricationError>;

/// Errors surfaced to callers of the law.
///
/// Numerical trouble inside a pair evaluation never shows up here: the gap
/// integrator recovers locally and invalid physical states are logged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LubricationError {
    /// A domain-averaged quantity was requested without a periodic cell.
    #[error("bulk stress can only be computed in periodic simulations")]
    NonPeriodicDomain,

    /// Configuration values outside their admissible range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pair or query referenced a body that is not in the world.
    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),

    /// A material or geometric input was outside its physical range.
    #[error("invalid physical parameter: {0}")]
    InvalidParameter(String),

    /// Lubrication torques were requested across a closed film.
    #[error("non-positive film gap {0} with a viscous fluid")]
    InvalidGap(f64),
}

impl LubricationError {
    #[must_use]
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig(details.into())
    }

    #[must_use]
    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::InvalidParameter(details.into())
    }
}
