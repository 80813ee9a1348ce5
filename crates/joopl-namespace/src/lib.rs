//! jOOPL namespaces
//!
//! Groups classes under dotted namespace names on top of a
//! [`joopl_runtime::TypeRegistry`]. A namespace is opened with
//! [`NamespaceRegistry::register`], which may be called again to add more
//! classes, and consumed with [`NamespaceRegistry::using`].
//!
//! # Example
//!
//! ```rust,ignore
//! use joopl_namespace::NamespaceRegistry;
//! use joopl_runtime::{ClassDeclaration, Value};
//!
//! let mut namespaces = NamespaceRegistry::new();
//!
//! namespaces.register("shapes", |ns| {
//!     ns.declare_class(
//!         "Square",
//!         ClassDeclaration::new().getter("sides", |_| Ok(Value::from(4))),
//!     )?;
//!     Ok(())
//! })?;
//!
//! let sides = namespaces.using("shapes", |ns| {
//!     Ok(ns.instantiate("Square", &[])?.get("sides")?)
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Error types
pub mod error;

/// Namespace registry
pub mod registry;

/// Scopes handed to namespace callbacks
pub mod scope;

pub use error::{NamespaceError, NamespaceResult};
pub use registry::NamespaceRegistry;
pub use scope::{Scope, ScopeView};
