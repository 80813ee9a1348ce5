//! Namespace errors

use joopl_runtime::JooplError;
use thiserror::Error;

/// Result type for namespace operations
pub type NamespaceResult<T> = Result<T, NamespaceError>;

/// Errors raised by the namespace layer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NamespaceError {
    /// `using` a namespace nobody registered
    #[error("Namespace '{0}' is not registered")]
    NotRegistered(String),

    /// Short class name not declared in the namespace
    #[error("Class '{class}' is not declared in namespace '{namespace}'")]
    ClassNotFound {
        /// Namespace searched
        namespace: String,
        /// Short class name
        class: String,
    },

    /// Short class name that is empty or contains the namespace separator
    #[error("Invalid class name '{class}' in namespace '{namespace}'")]
    InvalidClassName {
        /// Namespace the class was declared or looked up in
        namespace: String,
        /// Offending short name
        class: String,
    },

    /// Error from declaration, construction or member access
    #[error(transparent)]
    Runtime(#[from] JooplError),
}

impl NamespaceError {
    /// Runtime error underneath, if any
    pub fn as_runtime(&self) -> Option<&JooplError> {
        match self {
            NamespaceError::Runtime(err) => Some(err),
            _ => None,
        }
    }
}
