//! Class declaration records
//!
//! # Example
//!
//! ```rust,ignore
//! let decl = ClassDeclaration::new()
//!     .inherits(&base)
//!     .ctor(|this, args| {
//!         this.base().ctor(args)?;
//!         this.set_field("value", Value::Null);
//!         Ok(())
//!     })
//!     .getter("value", |this| Ok(this.field("value")))
//!     .setter("value", |this, v| {
//!         this.set_field("value", v);
//!         Ok(())
//!     })
//!     .method("someMethod", |_, _| Ok(Value::from(11)))
//!     .events(["click"])
//!     .dynamic(false);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::class::Class;
use crate::error::JooplResult;
use crate::instance::This;
use crate::member::{CtorBody, MemberDefinition, PropertyDefinition};
use crate::options::Policy;
use crate::value::Value;

/// Declaration of a class: base, constructor, members, attributes, policy
#[derive(Clone, Default)]
pub struct ClassDeclaration {
    pub(crate) inherits: Option<Class>,
    pub(crate) ctor: Option<CtorBody>,
    pub(crate) members: Vec<(String, MemberDefinition)>,
    pub(crate) attributes: Vec<Value>,
    pub(crate) dynamic: Option<bool>,
    pub(crate) immutable: Option<bool>,
}

impl ClassDeclaration {
    /// Empty declaration: no base, no constructor, no members
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base class
    pub fn inherits(mut self, base: &Class) -> Self {
        self.inherits = Some(base.clone());
        self
    }

    /// Set the constructor body
    pub fn ctor<F>(mut self, f: F) -> Self
    where
        F: Fn(&This<'_>, &[Value]) -> JooplResult<()> + 'static,
    {
        self.ctor = Some(Rc::new(f));
        self
    }

    /// Add a member definition
    pub fn member(mut self, name: &str, definition: MemberDefinition) -> Self {
        self.members.push((name.to_string(), definition));
        self
    }

    /// Add a property
    ///
    /// Accessor halves declared separately for the same name are merged.
    pub fn property(mut self, name: &str, property: PropertyDefinition) -> Self {
        let existing = self
            .members
            .iter_mut()
            .rev()
            .find(|(n, d)| n == name && matches!(d, MemberDefinition::Property(_)));
        match existing {
            Some((_, MemberDefinition::Property(current))) => current.merge(property),
            _ => self
                .members
                .push((name.to_string(), MemberDefinition::Property(property))),
        }
        self
    }

    /// Add (or complete) a property getter
    pub fn getter<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&This<'_>) -> JooplResult<Value> + 'static,
    {
        self.property(name, PropertyDefinition::getter(f))
    }

    /// Add (or complete) a property setter
    pub fn setter<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&This<'_>, Value) -> JooplResult<()> + 'static,
    {
        self.property(name, PropertyDefinition::setter(f))
    }

    /// Add a method
    pub fn method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&This<'_>, &[Value]) -> JooplResult<Value> + 'static,
    {
        self.member(name, MemberDefinition::method(f))
    }

    /// Add an event
    pub fn event(self, name: &str) -> Self {
        self.member(name, MemberDefinition::Event)
    }

    /// Add several events
    pub fn events<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().fold(self, |decl, name| decl.event(name))
    }

    /// Attach an attribute instance
    pub fn attribute(mut self, attribute: impl Into<Value>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Attach several attribute instances
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Value>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Whether instances may gain and lose members after construction
    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// Whether instances are frozen after construction
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = Some(immutable);
        self
    }

    /// Declared base class
    pub fn base(&self) -> Option<&Class> {
        self.inherits.as_ref()
    }

    /// Policy with unset flags taken from `defaults`
    pub fn policy(&self, defaults: Policy) -> Policy {
        Policy {
            dynamic: self.dynamic.unwrap_or(defaults.dynamic),
            immutable: self.immutable.unwrap_or(defaults.immutable),
        }
    }
}

impl fmt::Debug for ClassDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDeclaration")
            .field("inherits", &self.inherits.as_ref().map(|c| c.name().to_string()))
            .field("ctor", &self.ctor.is_some())
            .field("members", &self.members)
            .field("attributes", &self.attributes.len())
            .field("dynamic", &self.dynamic)
            .field("immutable", &self.immutable)
            .finish()
    }
}
