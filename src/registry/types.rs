//! Registry error definitions.

use thiserror::Error;

/// Errors raised while building or querying a call registry.
///
/// All of these are configuration defects: they surface at startup or on
/// lookup and are never caught by the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No descriptor is registered under the label.
    #[error("Unknown call '{label}' in registry '{registry}'")]
    UnknownCall { registry: String, label: String },

    /// Two descriptors share one label.
    #[error("Duplicate call '{label}' in registry '{registry}'")]
    DuplicateCall { registry: String, label: String },

    /// An argument name appears in more than one argument map.
    #[error("Call '{label}': argument '{argument}' declared more than once")]
    ArgumentCollision { label: String, argument: String },

    /// A positional parameter names an argument no map declares.
    #[error("Call '{label}': parameter '{parameter}' is not a declared argument")]
    UnknownParameter { label: String, parameter: String },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
