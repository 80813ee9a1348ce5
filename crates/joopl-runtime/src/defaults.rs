//! Default constants for runtime configuration.
//!
//! Centralizes values shared by the declaration pipeline, the type registry
//! and the namespace layer.

/// Instances may gain and lose members after construction unless declared otherwise.
pub const DEFAULT_DYNAMIC: bool = true;

/// Instances are mutable unless declared otherwise.
pub const DEFAULT_IMMUTABLE: bool = false;

/// Qualified name of the built-in root class every attribute class inherits.
pub const ATTRIBUTE_CLASS_NAME: &str = "joopl.Attribute";

/// Separator between a namespace and a class short name.
pub const NAMESPACE_SEPARATOR: &str = ".";
