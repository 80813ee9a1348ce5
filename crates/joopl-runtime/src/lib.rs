//! jOOPL class runtime
//!
//! This crate provides the class declaration and metaobject layer:
//! - **Declarations**: classes with single inheritance, properties, methods
//!   and events (`declaration`, `member` modules)
//! - **Types**: immutable class descriptors with typed attributes (`class`,
//!   `attribute` modules)
//! - **Instances**: construction, `base` / `derived` dispatch and
//!   structural locking (`factory`, `instance` modules)
//! - **Events**: per-instance multicast channels (`event` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use joopl_runtime::{ClassDeclaration, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//!
//! let a = registry.declare_class(
//!     "demo.A",
//!     ClassDeclaration::new()
//!         .ctor(|this, _| {
//!             this.set_field("value", "hello world");
//!             Ok(())
//!         })
//!         .getter("value", |this| Ok(this.field("value"))),
//! )?;
//!
//! let b = registry.declare_class(
//!     "demo.B",
//!     ClassDeclaration::new()
//!         .inherits(&a)
//!         .ctor(|this, args| this.base().ctor(args))
//!         .getter("value", |this| {
//!             let base = this.base().get("value")?;
//!             Ok(Value::from(format!("{}!", base.as_str().unwrap_or_default())))
//!         }),
//! )?;
//!
//! let instance = b.instantiate(&[])?;
//! assert_eq!(instance.get("value")?, Value::from("hello world!"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Attribute sets attached to classes
pub mod attribute;

/// Type descriptors
pub mod class;

/// Class declaration builder
pub mod declaration;

/// Default configuration values
pub mod defaults;

/// Error types
pub mod error;

/// Event channels
pub mod event;

/// Class and instance construction
pub mod factory;

/// Instances and dispatch views
pub mod instance;

/// Member definitions and tables
pub mod member;

/// Runtime options
pub mod options;

/// Type registry
pub mod registry;

/// Dynamic values
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use attribute::{is_attribute, AttributeSet};
pub use class::{Class, ClassId};
pub use declaration::ClassDeclaration;
pub use error::{JooplError, JooplResult};
pub use event::{EventChannel, RaiseArgs};
pub use factory::ClassFactory;
pub use instance::{Base, Instance, PropertyDescriptor, This, WeakInstance};
pub use member::{
    MemberDefinition, MemberDescriptor, MemberKind, MemberTable, PropertyDefinition,
};
pub use options::{AttributeLookup, Extensibility, Policy, RuntimeOptions};
pub use registry::TypeRegistry;
pub use value::{Function, Value};
