//! Runtime errors

use thiserror::Error;

use crate::member::MemberKind;

/// Result type for declaration, construction and member access
pub type JooplResult<T> = Result<T, JooplError>;

/// Errors raised by the class runtime
///
/// Every variant is returned at the point of violation. Nothing is deferred
/// or swallowed, and a failed declaration or construction leaves no partial
/// state behind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JooplError {
    /// An `attributes` entry does not inherit the `Attribute` root class
    #[error("Invalid attribute on class '{class}': {found} is not an Attribute")]
    InvalidAttribute {
        /// Class being declared
        class: String,
        /// Description of the offending value
        found: String,
    },

    /// A member override changes the kind of the inherited member
    #[error("Kind mismatch on '{class}.{member}': cannot override {inherited} with {declared}")]
    KindMismatch {
        /// Class being declared
        class: String,
        /// Member name
        member: String,
        /// Kind of the inherited (or first) definition
        inherited: MemberKind,
        /// Kind of the new definition
        declared: MemberKind,
    },

    /// Adding a member to a sealed or frozen instance
    #[error("Cannot add '{member}': instance of '{class}' is not extensible")]
    NotExtensible {
        /// Class of the instance
        class: String,
        /// Member name
        member: String,
    },

    /// Redefining or deleting an existing member of a sealed or frozen instance
    #[error("Cannot redefine or delete '{member}': member of '{class}' is not configurable")]
    NotConfigurable {
        /// Class of the instance
        class: String,
        /// Member name
        member: String,
    },

    /// Querying an attribute class the type does not carry
    #[error("Class '{class}' has no attribute of type '{attribute}'")]
    AttributeNotFound {
        /// Queried class
        class: String,
        /// Requested attribute class
        attribute: String,
    },

    /// Member name not present on the instance or on the base view
    #[error("Unknown member '{member}' on '{class}'")]
    UnknownMember {
        /// Class searched
        class: String,
        /// Member name
        member: String,
    },

    /// Writing a getter-only property or a frozen data property
    #[error("Cannot assign to read-only member '{member}' of '{class}'")]
    ReadOnly {
        /// Class of the instance
        class: String,
        /// Member name
        member: String,
    },

    /// Calling a member that does not hold a function
    #[error("Member '{member}' of '{class}' is not callable")]
    NotCallable {
        /// Class of the instance
        class: String,
        /// Member name
        member: String,
    },

    /// A class with the same qualified name already exists
    #[error("Class '{name}' is already declared")]
    DuplicateClass {
        /// Qualified class name
        name: String,
    },

    /// Lookup of an undeclared class
    #[error("Class '{name}' is not declared")]
    ClassNotFound {
        /// Qualified class name
        name: String,
    },

    /// Error raised by user code inside a member body, constructor or handler
    #[error("{0}")]
    Thrown(String),
}

impl JooplError {
    /// Raise a user error from a member body
    pub fn thrown(message: impl Into<String>) -> Self {
        JooplError::Thrown(message.into())
    }

    /// Whether this error is a structural-locking violation
    pub fn is_locking_violation(&self) -> bool {
        matches!(
            self,
            JooplError::NotExtensible { .. }
                | JooplError::NotConfigurable { .. }
                | JooplError::ReadOnly { .. }
        )
    }
}

impl From<String> for JooplError {
    fn from(s: String) -> Self {
        JooplError::Thrown(s)
    }
}

impl From<&str> for JooplError {
    fn from(s: &str) -> Self {
        JooplError::Thrown(s.to_string())
    }
}
