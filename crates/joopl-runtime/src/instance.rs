//! Instance runtime
//!
//! An [`Instance`] owns its private backing store (the `_` fields), one
//! event channel per event in its class chain, and a per-instance shape
//! overlay holding dynamic expandos, redefinitions and deletions. Member
//! lookups go through the overlay first, then through the class's merged
//! member table.
//!
//! Member bodies receive a [`This`] that remembers the depth of the class
//! that declared the executing body. `this.base()` resolves one level above
//! that depth; `this.derived()` is the instance itself, so it always reaches
//! the most-derived implementation.
//!
//! The structural policy is applied once the constructor returns:
//!
//! | Extensibility | add | redefine / delete | write data |
//! |---------------|-----|-------------------|------------|
//! | Extensible    | yes | yes               | yes        |
//! | Sealed        | no  | no                | yes        |
//! | Frozen        | no  | no                | no         |
//!
//! Accessor setters keep working on frozen instances: they write the
//! backing store, which is not part of the shape.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::class::Class;
use crate::error::{JooplError, JooplResult};
use crate::event::EventChannel;
use crate::member::{MemberDefinition, MemberDescriptor, PropertyDefinition};
use crate::options::Extensibility;
use crate::value::{Function, Value};

/// Global counter for generating unique instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Own property definition for [`Instance::define_property`]
#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    /// Plain data property
    Data(Value),
    /// Accessor property; bodies run one level below the concrete class, so
    /// `this.base()` reaches the class's own member of the same name
    Accessor(PropertyDefinition),
}

#[derive(Clone)]
enum OwnSlot {
    Data(Value),
    Accessor(PropertyDefinition),
    /// A class member deleted from this instance
    Removed,
}

struct InstanceInner {
    id: u64,
    class: Class,
    store: RefCell<FxHashMap<String, Value>>,
    events: FxHashMap<Rc<str>, EventChannel>,
    /// Insertion-ordered shape overlay
    own: RefCell<Vec<(String, OwnSlot)>>,
    extensibility: Cell<Extensibility>,
}

/// Shared handle to a constructed object
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

impl Instance {
    /// Allocate the backing store and one channel per event in the chain
    pub(crate) fn allocate(class: Class) -> Self {
        let events = class
            .members()
            .event_names()
            .map(|name| (name.clone(), EventChannel::new(name.clone())))
            .collect();

        Instance(Rc::new(InstanceInner {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            class,
            store: RefCell::new(FxHashMap::default()),
            events,
            own: RefCell::new(Vec::new()),
            extensibility: Cell::new(Extensibility::Extensible),
        }))
    }

    /// Apply the post-construction policy
    pub(crate) fn lock(&self, extensibility: Extensibility) {
        if extensibility != Extensibility::Extensible {
            tracing::trace!(
                class = %self.0.class.name(),
                id = self.0.id,
                ?extensibility,
                "locking instance"
            );
        }
        self.0.extensibility.set(extensibility);
    }

    /// Depth own accessors run at: below the concrete class
    fn own_depth(&self) -> usize {
        self.0.class.depth() + 1
    }

    pub(crate) fn this_at(&self, depth: usize) -> This<'_> {
        This {
            instance: self,
            depth,
        }
    }

    /// Unique instance id
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Concrete class
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// Check if the instance's class is `class` or derives from it
    pub fn is_type_of(&self, class: &Class) -> bool {
        self.0.class.is_subclass_of(class)
    }

    /// Current shape state
    pub fn extensibility(&self) -> Extensibility {
        self.0.extensibility.get()
    }

    /// Whether members can still be added
    pub fn is_extensible(&self) -> bool {
        self.extensibility() == Extensibility::Extensible
    }

    /// Whether the instance is sealed (frozen instances are sealed too)
    pub fn is_sealed(&self) -> bool {
        self.extensibility() >= Extensibility::Sealed
    }

    /// Whether the instance is frozen
    pub fn is_frozen(&self) -> bool {
        self.extensibility() == Extensibility::Frozen
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Non-owning handle that does not keep the instance alive
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    // ========================================================================
    // Shape operations
    // ========================================================================

    /// Check if a member or expando is visible on the instance
    pub fn has(&self, name: &str) -> bool {
        match self.own_slot(name) {
            Some(OwnSlot::Removed) => false,
            Some(_) => true,
            None => self.0.class.has_member(name),
        }
    }

    /// Visible member names: class members first, then expandos
    pub fn keys(&self) -> Vec<String> {
        let own = self.0.own.borrow();
        let removed = |name: &str| {
            own.iter()
                .any(|(n, slot)| n == name && matches!(slot, OwnSlot::Removed))
        };

        let mut keys: Vec<String> = self
            .0
            .class
            .members()
            .iter()
            .map(|d| d.name())
            .filter(|name| !removed(*name))
            .map(str::to_string)
            .collect();
        keys.extend(
            own.iter()
                .filter(|(n, slot)| {
                    !matches!(slot, OwnSlot::Removed) && !self.0.class.has_member(n)
                })
                .map(|(n, _)| n.clone()),
        );
        keys
    }

    /// Read a property, method or event by name
    ///
    /// Methods read as bound functions and events as their channel.
    /// Unknown names read as `Undefined`.
    pub fn get(&self, name: &str) -> JooplResult<Value> {
        match self.own_slot(name) {
            Some(OwnSlot::Data(value)) => return Ok(value),
            Some(OwnSlot::Accessor(property)) => {
                return self.read_accessor(&property, self.own_depth())
            }
            Some(OwnSlot::Removed) => return Ok(Value::Undefined),
            None => {}
        }

        match self.0.class.member(name) {
            Some(descriptor) => self.read_member(descriptor),
            None => Ok(Value::Undefined),
        }
    }

    /// Assign a property or add an expando
    pub fn set(&self, name: &str, value: Value) -> JooplResult<()> {
        match self.own_slot(name) {
            Some(OwnSlot::Data(_)) => {
                if self.is_frozen() {
                    return Err(self.read_only(name));
                }
                self.put_own(name, OwnSlot::Data(value));
                return Ok(());
            }
            Some(OwnSlot::Accessor(property)) => {
                return self.write_accessor(&property, self.own_depth(), name, value)
            }
            Some(OwnSlot::Removed) => return self.add_own(name, OwnSlot::Data(value)),
            None => {}
        }

        match self.0.class.member(name) {
            Some(descriptor) => match descriptor.definition() {
                MemberDefinition::Property(property) => {
                    self.write_accessor(property, descriptor.depth(), name, value)
                }
                MemberDefinition::Method(_) | MemberDefinition::Event => {
                    if !self.is_extensible() {
                        return Err(self.not_configurable(name));
                    }
                    self.put_own(name, OwnSlot::Data(value));
                    Ok(())
                }
            },
            None => self.add_own(name, OwnSlot::Data(value)),
        }
    }

    /// Call a method, or a property / expando holding a function
    pub fn call(&self, name: &str, args: &[Value]) -> JooplResult<Value> {
        let target = match self.own_slot(name) {
            Some(OwnSlot::Data(value)) => value,
            Some(OwnSlot::Accessor(property)) => {
                self.read_accessor(&property, self.own_depth())?
            }
            Some(OwnSlot::Removed) => return Err(self.unknown_member(name)),
            None => match self.0.class.member(name) {
                Some(descriptor) => match descriptor.definition() {
                    MemberDefinition::Method(body) => {
                        return body(&self.this_at(descriptor.depth()), args)
                    }
                    MemberDefinition::Property(property) => {
                        self.read_accessor(property, descriptor.depth())?
                    }
                    MemberDefinition::Event => return Err(self.not_callable(name)),
                },
                None => return Err(self.unknown_member(name)),
            },
        };
        self.call_value(name, &target, args)
    }

    /// Define or redefine an own property
    ///
    /// Fails with `NotConfigurable` for existing names and `NotExtensible`
    /// for new ones once the instance is sealed or frozen.
    pub fn define_property(&self, name: &str, descriptor: PropertyDescriptor) -> JooplResult<()> {
        if !self.is_extensible() {
            return Err(if self.has(name) {
                self.not_configurable(name)
            } else {
                self.not_extensible(name)
            });
        }

        let slot = match descriptor {
            PropertyDescriptor::Data(value) => OwnSlot::Data(value),
            PropertyDescriptor::Accessor(property) => OwnSlot::Accessor(property),
        };
        self.put_own(name, slot);
        Ok(())
    }

    /// Delete a member or expando
    ///
    /// Returns `false` when the name was not visible.
    pub fn delete(&self, name: &str) -> JooplResult<bool> {
        if !self.has(name) {
            return Ok(false);
        }
        if !self.is_extensible() {
            return Err(self.not_configurable(name));
        }

        if self.0.class.has_member(name) {
            self.put_own(name, OwnSlot::Removed);
        } else {
            self.0.own.borrow_mut().retain(|(n, _)| n != name);
        }
        Ok(true)
    }

    /// Event channel by name
    pub fn event(&self, name: &str) -> JooplResult<EventChannel> {
        match self.get(name)? {
            Value::Event(channel) => Ok(channel),
            _ => Err(self.unknown_member(name)),
        }
    }

    // ========================================================================
    // Backing store
    // ========================================================================

    pub(crate) fn field(&self, name: &str) -> Value {
        self.0.store.borrow().get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn set_field(&self, name: &str, value: Value) {
        self.0.store.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn has_field(&self, name: &str) -> bool {
        self.0.store.borrow().contains_key(name)
    }

    pub(crate) fn remove_field(&self, name: &str) -> Option<Value> {
        self.0.store.borrow_mut().remove(name)
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    pub(crate) fn read_member(&self, descriptor: &MemberDescriptor) -> JooplResult<Value> {
        match descriptor.definition() {
            MemberDefinition::Property(property) => {
                self.read_accessor(property, descriptor.depth())
            }
            MemberDefinition::Method(_) => Ok(Value::Function(self.bind(descriptor.clone()))),
            MemberDefinition::Event => self
                .0
                .events
                .get(descriptor.name())
                .cloned()
                .map(Value::Event)
                .ok_or_else(|| self.unknown_member(descriptor.name())),
        }
    }

    pub(crate) fn write_member(
        &self,
        descriptor: &MemberDescriptor,
        value: Value,
    ) -> JooplResult<()> {
        match descriptor.definition() {
            MemberDefinition::Property(property) => {
                self.write_accessor(property, descriptor.depth(), descriptor.name(), value)
            }
            _ => Err(self.read_only(descriptor.name())),
        }
    }

    pub(crate) fn call_member(
        &self,
        descriptor: &MemberDescriptor,
        args: &[Value],
    ) -> JooplResult<Value> {
        match descriptor.definition() {
            MemberDefinition::Method(body) => body(&self.this_at(descriptor.depth()), args),
            MemberDefinition::Property(property) => {
                let target = self.read_accessor(property, descriptor.depth())?;
                self.call_value(descriptor.name(), &target, args)
            }
            MemberDefinition::Event => Err(self.not_callable(descriptor.name())),
        }
    }

    fn read_accessor(&self, property: &PropertyDefinition, depth: usize) -> JooplResult<Value> {
        match property.get_fn() {
            Some(getter) => getter(&self.this_at(depth)),
            None => Ok(Value::Undefined),
        }
    }

    fn write_accessor(
        &self,
        property: &PropertyDefinition,
        depth: usize,
        name: &str,
        value: Value,
    ) -> JooplResult<()> {
        match property.set_fn() {
            Some(setter) => setter(&self.this_at(depth), value),
            None => Err(self.read_only(name)),
        }
    }

    fn call_value(&self, name: &str, target: &Value, args: &[Value]) -> JooplResult<Value> {
        match target {
            Value::Function(f) => f.call(&Value::Object(self.clone()), args),
            _ => Err(self.not_callable(name)),
        }
    }

    /// Method read as a value: a function bound to this instance
    ///
    /// The binding is weak, so storing the function on the instance (or in
    /// one of its channels) does not keep the instance alive. Calling it
    /// after the instance is dropped fails with `UnknownMember`.
    fn bind(&self, descriptor: MemberDescriptor) -> Function {
        let instance = self.downgrade();
        let class = self.0.class.name().to_string();
        Function::new(move |_, args| match instance.upgrade() {
            Some(instance) => instance.call_member(&descriptor, args),
            None => Err(JooplError::UnknownMember {
                class: class.clone(),
                member: descriptor.name().to_string(),
            }),
        })
    }

    fn own_slot(&self, name: &str) -> Option<OwnSlot> {
        self.0
            .own
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot.clone())
    }

    fn put_own(&self, name: &str, slot: OwnSlot) {
        let mut own = self.0.own.borrow_mut();
        match own.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = slot,
            None => own.push((name.to_string(), slot)),
        }
    }

    fn add_own(&self, name: &str, slot: OwnSlot) -> JooplResult<()> {
        if !self.is_extensible() {
            return Err(self.not_extensible(name));
        }
        self.put_own(name, slot);
        Ok(())
    }

    // ========================================================================
    // Errors
    // ========================================================================

    fn not_extensible(&self, name: &str) -> JooplError {
        JooplError::NotExtensible {
            class: self.0.class.name().to_string(),
            member: name.to_string(),
        }
    }

    fn not_configurable(&self, name: &str) -> JooplError {
        JooplError::NotConfigurable {
            class: self.0.class.name().to_string(),
            member: name.to_string(),
        }
    }

    fn read_only(&self, name: &str) -> JooplError {
        JooplError::ReadOnly {
            class: self.0.class.name().to_string(),
            member: name.to_string(),
        }
    }

    fn not_callable(&self, name: &str) -> JooplError {
        JooplError::NotCallable {
            class: self.0.class.name().to_string(),
            member: name.to_string(),
        }
    }

    pub(crate) fn unknown_member(&self, name: &str) -> JooplError {
        JooplError::UnknownMember {
            class: self.0.class.name().to_string(),
            member: name.to_string(),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.0.class.name())
            .field("id", &self.0.id)
            .field("extensibility", &self.extensibility())
            .finish()
    }
}

/// Weak handle to an [`Instance`]
#[derive(Clone)]
pub struct WeakInstance(Weak<InstanceInner>);

impl WeakInstance {
    /// The instance, if it is still alive
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakInstance")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

/// Receiver of a member body, constructor or accessor
///
/// Carries the depth of the class that declared the executing body.
///
/// Closures that outlive the body and end up stored on the instance, such
/// as event handlers subscribed from a constructor, must capture
/// [`This::downgrade`] rather than [`This::as_value`]: a strong handle
/// stored inside the instance forms a cycle and the instance is never
/// dropped.
#[derive(Clone, Copy)]
pub struct This<'a> {
    instance: &'a Instance,
    depth: usize,
}

impl<'a> This<'a> {
    /// The receiving instance
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// The receiving instance as a value
    pub fn as_value(&self) -> Value {
        Value::Object(self.instance.clone())
    }

    /// Weak handle to the receiving instance
    pub fn downgrade(&self) -> WeakInstance {
        self.instance.downgrade()
    }

    /// Class that declared the executing body
    pub fn declaring_class(&self) -> &'a Class {
        let class = self.instance.class();
        class.at_depth(self.depth).unwrap_or(class)
    }

    /// Read a private field (`this._.name`)
    pub fn field(&self, name: &str) -> Value {
        self.instance.field(name)
    }

    /// Write a private field (`this._.name = value`)
    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        self.instance.set_field(name, value.into());
    }

    /// Check for a private field
    pub fn has_field(&self, name: &str) -> bool {
        self.instance.has_field(name)
    }

    /// Remove a private field
    pub fn remove_field(&self, name: &str) -> Option<Value> {
        self.instance.remove_field(name)
    }

    /// Virtual read (`this.name`)
    pub fn get(&self, name: &str) -> JooplResult<Value> {
        self.instance.get(name)
    }

    /// Virtual write (`this.name = value`)
    pub fn set(&self, name: &str, value: impl Into<Value>) -> JooplResult<()> {
        self.instance.set(name, value.into())
    }

    /// Virtual call (`this.name(args)`)
    pub fn call(&self, name: &str, args: &[Value]) -> JooplResult<Value> {
        self.instance.call(name, args)
    }

    /// Event channel (`this.name`)
    pub fn event(&self, name: &str) -> JooplResult<EventChannel> {
        self.instance.event(name)
    }

    /// Next less-derived implementations (`this.base`)
    pub fn base(&self) -> Base<'a> {
        Base {
            instance: self.instance,
            depth: self.depth.checked_sub(1),
        }
    }

    /// Most-derived implementations (`this.derived`)
    pub fn derived(&self) -> &'a Instance {
        self.instance
    }
}

impl fmt::Debug for This<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("This")
            .field("instance", self.instance)
            .field("depth", &self.depth)
            .finish()
    }
}

/// View resolving members one level above the executing body's class
#[derive(Clone, Copy)]
pub struct Base<'a> {
    instance: &'a Instance,
    /// `None` above the root
    depth: Option<usize>,
}

impl<'a> Base<'a> {
    /// Class the view resolves against; `None` above the root
    pub fn class(&self) -> Option<&'a Class> {
        self.depth
            .and_then(|depth| self.instance.class().at_depth(depth))
    }

    /// Run the nearest ancestor constructor (`this.base.ctor(args)`)
    ///
    /// Levels without their own constructor are skipped; above the root this
    /// is a no-op.
    pub fn ctor(&self, args: &[Value]) -> JooplResult<()> {
        let Some(top) = self.depth else {
            return Ok(());
        };
        let class = self.instance.class();

        for depth in (0..=top).rev() {
            if let Some(ctor) = class.at_depth(depth).and_then(|c| c.ctor()) {
                return ctor(&self.instance.this_at(depth), args);
            }
        }
        Ok(())
    }

    /// Read the base implementation of a member
    pub fn get(&self, name: &str) -> JooplResult<Value> {
        let descriptor = self.lookup(name)?;
        self.instance.read_member(descriptor)
    }

    /// Write through the base implementation of a property
    pub fn set(&self, name: &str, value: impl Into<Value>) -> JooplResult<()> {
        let descriptor = self.lookup(name)?;
        self.instance.write_member(descriptor, value.into())
    }

    /// Call the base implementation of a method
    pub fn call(&self, name: &str, args: &[Value]) -> JooplResult<Value> {
        let descriptor = self.lookup(name)?;
        self.instance.call_member(descriptor, args)
    }

    /// Check if the base level has a member
    pub fn has(&self, name: &str) -> bool {
        self.class().is_some_and(|class| class.has_member(name))
    }

    fn lookup(&self, name: &str) -> JooplResult<&'a MemberDescriptor> {
        self.class()
            .and_then(|class| class.member(name))
            .ok_or_else(|| self.instance.unknown_member(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ClassDeclaration;
    use crate::registry::TypeRegistry;

    fn exclaim(this: &This<'_>) -> JooplResult<Value> {
        let base = this.base().get("value")?;
        Ok(Value::from(format!("{}!", base.as_str().unwrap_or_default())))
    }

    fn value_chain(registry: &mut TypeRegistry) -> (Class, Class, Class) {
        let a = registry
            .declare_class(
                "poly.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("value", "hello world");
                        Ok(())
                    })
                    .getter("value", |this| Ok(this.field("value")))
                    .method("someMethod", |this, _| Ok(this.field("value"))),
            )
            .unwrap();

        let b = registry
            .declare_class(
                "poly.B",
                ClassDeclaration::new()
                    .inherits(&a)
                    .ctor(|this, args| this.base().ctor(args))
                    .getter("value", exclaim)
                    .method("someMethod", |this, _| exclaim(this)),
            )
            .unwrap();

        let c = registry
            .declare_class(
                "poly.C",
                ClassDeclaration::new()
                    .inherits(&b)
                    .ctor(|this, args| this.base().ctor(args))
                    .getter("value", exclaim)
                    .method("someMethod", |this, _| exclaim(this)),
            )
            .unwrap();

        (a, b, c)
    }

    #[test]
    fn test_base_chain_accumulates() {
        let mut registry = TypeRegistry::new();
        let (a, b, c) = value_chain(&mut registry);

        assert_eq!(a.instantiate(&[]).unwrap().get("value").unwrap(), Value::from("hello world"));
        assert_eq!(b.instantiate(&[]).unwrap().get("value").unwrap(), Value::from("hello world!"));

        let instance = c.instantiate(&[]).unwrap();
        assert_eq!(instance.get("value").unwrap(), Value::from("hello world!!"));
        assert_eq!(
            instance.call("someMethod", &[]).unwrap(),
            Value::from("hello world!!")
        );
    }

    #[test]
    fn test_base_skips_levels_without_override() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "skip.A",
                ClassDeclaration::new().getter("value", |_| Ok(Value::from("a"))),
            )
            .unwrap();
        let b = registry
            .declare_class(
                "skip.B",
                ClassDeclaration::new()
                    .inherits(&a)
                    .method("other", |_, _| Ok(Value::Null)),
            )
            .unwrap();
        let c = registry
            .declare_class(
                "skip.C",
                ClassDeclaration::new().inherits(&b).getter("value", |this| {
                    let base = this.base().get("value")?;
                    Ok(Value::from(format!("c+{}", base.as_str().unwrap_or_default())))
                }),
            )
            .unwrap();

        let instance = c.instantiate(&[]).unwrap();
        assert_eq!(instance.get("value").unwrap(), Value::from("c+a"));
    }

    #[test]
    fn test_derived_reaches_far_override() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "abs.A",
                ClassDeclaration::new()
                    .ctor(|_, _| Ok(()))
                    .method("someMethod", |this, _| {
                        this.derived().call("abstractMethod", &[])
                    })
                    .method("abstractMethod", |_, _| Ok(Value::Undefined)),
            )
            .unwrap();
        let b = registry
            .declare_class(
                "abs.B",
                ClassDeclaration::new()
                    .inherits(&a)
                    .ctor(|this, args| this.base().ctor(args)),
            )
            .unwrap();
        let c = registry
            .declare_class(
                "abs.C",
                ClassDeclaration::new()
                    .inherits(&b)
                    .ctor(|this, args| this.base().ctor(args))
                    .method("abstractMethod", |_, _| Ok(Value::from("hello world"))),
            )
            .unwrap();

        let instance = c.instantiate(&[]).unwrap();
        assert_eq!(
            instance.call("someMethod", &[]).unwrap(),
            Value::from("hello world")
        );
        assert!(b.instantiate(&[]).unwrap().call("someMethod", &[]).unwrap().is_undefined());
    }

    #[test]
    fn test_base_ctor_skips_levels_without_ctor() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "ctor.A",
                ClassDeclaration::new().ctor(|this, args| {
                    this.set_field("seed", args.first().cloned().unwrap_or_default());
                    Ok(())
                }),
            )
            .unwrap();
        let b = registry
            .declare_class("ctor.B", ClassDeclaration::new().inherits(&a))
            .unwrap();
        let c = registry
            .declare_class(
                "ctor.C",
                ClassDeclaration::new()
                    .inherits(&b)
                    .ctor(|this, args| this.base().ctor(args))
                    .getter("seed", |this| Ok(this.field("seed"))),
            )
            .unwrap();

        let instance = c.instantiate(&[Value::from(7)]).unwrap();
        assert_eq!(instance.get("seed").unwrap(), Value::from(7));
    }

    #[test]
    fn test_base_ctor_is_not_implicit() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "implicit.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("ran", true);
                        Ok(())
                    })
                    .getter("ran", |this| Ok(this.field("ran"))),
            )
            .unwrap();
        let b = registry
            .declare_class(
                "implicit.B",
                ClassDeclaration::new().inherits(&a).ctor(|_, _| Ok(())),
            )
            .unwrap();

        assert!(b.instantiate(&[]).unwrap().get("ran").unwrap().is_undefined());
    }

    #[test]
    fn test_base_above_root() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "root.A",
                ClassDeclaration::new()
                    .ctor(|this, args| this.base().ctor(args))
                    .method("probe", |this, _| {
                        assert!(this.base().class().is_none());
                        assert!(!this.base().has("probe"));
                        this.base().get("probe")
                    }),
            )
            .unwrap();

        let instance = a.instantiate(&[]).unwrap();
        assert!(matches!(
            instance.call("probe", &[]),
            Err(JooplError::UnknownMember { .. })
        ));
    }

    #[test]
    fn test_declaring_class_follows_body() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "decl.A",
                ClassDeclaration::new().method("where", |this, _| {
                    Ok(Value::from(this.declaring_class().short_name()))
                }),
            )
            .unwrap();
        let b = registry
            .declare_class("decl.B", ClassDeclaration::new().inherits(&a))
            .unwrap();

        let instance = b.instantiate(&[]).unwrap();
        assert_eq!(instance.call("where", &[]).unwrap(), Value::from("A"));
    }

    #[test]
    fn test_instances_do_not_share_fields() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "fields.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("value", Value::empty_list());
                        Ok(())
                    })
                    .getter("value", |this| Ok(this.field("value"))),
            )
            .unwrap();

        let first = a.instantiate(&[]).unwrap();
        let second = a.instantiate(&[]).unwrap();
        first
            .get("value")
            .unwrap()
            .as_list()
            .unwrap()
            .borrow_mut()
            .push(Value::from("hello world"));

        assert_eq!(second.get("value").unwrap().as_list().unwrap().borrow().len(), 0);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_read_write_and_read_only_properties() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "props.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("value", Value::Null);
                        Ok(())
                    })
                    .getter("value", |this| Ok(this.field("value")))
                    .setter("value", |this, v| {
                        this.set_field("value", v);
                        Ok(())
                    })
                    .getter("fixedValue", |_| Ok(Value::from(28)))
                    .setter("writeOnly", |this, v| {
                        this.set_field("writeOnly", v);
                        Ok(())
                    }),
            )
            .unwrap();

        let instance = a.instantiate(&[]).unwrap();
        instance.set("value", Value::from("hello world")).unwrap();
        assert_eq!(instance.get("value").unwrap(), Value::from("hello world"));
        assert_eq!(instance.get("fixedValue").unwrap(), Value::from(28));
        assert!(matches!(
            instance.set("fixedValue", Value::from(1)),
            Err(JooplError::ReadOnly { .. })
        ));
        instance.set("writeOnly", Value::from(1)).unwrap();
        assert!(instance.get("writeOnly").unwrap().is_undefined());
    }

    #[test]
    fn test_method_reads_as_bound_function() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "bound.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("n", 11);
                        Ok(())
                    })
                    .method("someMethod", |this, _| Ok(this.field("n"))),
            )
            .unwrap();

        let instance = a.instantiate(&[]).unwrap();
        let method = instance.get("someMethod").unwrap();
        let f = method.as_function().unwrap();
        assert_eq!(f.call(&Value::Undefined, &[]).unwrap(), Value::from(11));
    }

    #[test]
    fn test_unknown_names() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class("unknown.A", ClassDeclaration::new().event("click"))
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();

        assert!(instance.get("nothing").unwrap().is_undefined());
        assert!(matches!(
            instance.call("nothing", &[]),
            Err(JooplError::UnknownMember { .. })
        ));
        assert!(matches!(
            instance.call("click", &[]),
            Err(JooplError::NotCallable { .. })
        ));
        assert!(matches!(
            instance.event("nothing"),
            Err(JooplError::UnknownMember { .. })
        ));
    }

    #[test]
    fn test_dynamic_instance_allows_shape_changes() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "dyn.A",
                ClassDeclaration::new()
                    .getter("value", |_| Ok(Value::from("hello world")))
                    .method("someMethod", |_, _| Ok(Value::from(1))),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();

        instance.set("some", Value::from("new property")).unwrap();
        assert_eq!(instance.get("some").unwrap(), Value::from("new property"));

        instance
            .define_property("value", PropertyDescriptor::Data(Value::from(5)))
            .unwrap();
        assert_eq!(instance.get("value").unwrap(), Value::from(5));

        instance
            .set("someMethod", Value::function(|_, _| Ok(Value::from(2))))
            .unwrap();
        assert_eq!(instance.call("someMethod", &[]).unwrap(), Value::from(2));

        assert!(instance.delete("value").unwrap());
        assert!(instance.get("value").unwrap().is_undefined());
        assert!(!instance.has("value"));
        assert!(!instance.delete("value").unwrap());

        assert_eq!(instance.keys(), vec!["someMethod".to_string(), "some".to_string()]);
    }

    #[test]
    fn test_deleted_member_can_be_re_added() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "readd.A",
                ClassDeclaration::new().method("m", |_, _| Ok(Value::from(1))),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();

        instance.delete("m").unwrap();
        assert!(matches!(
            instance.call("m", &[]),
            Err(JooplError::UnknownMember { .. })
        ));
        instance
            .set("m", Value::function(|_, _| Ok(Value::from(3))))
            .unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), Value::from(3));
    }

    #[test]
    fn test_own_accessor_property() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class("accessor.A", ClassDeclaration::new())
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();

        instance
            .define_property(
                "doubled",
                PropertyDescriptor::Accessor(
                    PropertyDefinition::getter(|this| {
                        let n = this.field("n").as_number().unwrap_or(0.0);
                        Ok(Value::from(n * 2.0))
                    })
                    .with_setter(|this, v| {
                        this.set_field("n", v);
                        Ok(())
                    }),
                ),
            )
            .unwrap();

        instance.set("doubled", Value::from(4)).unwrap();
        assert_eq!(instance.get("doubled").unwrap(), Value::from(8));
    }

    #[test]
    fn test_own_accessor_base_reaches_class_member() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "ownbase.A",
                ClassDeclaration::new().getter("value", |_| Ok(Value::from("a"))),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();

        instance
            .define_property(
                "value",
                PropertyDescriptor::Accessor(PropertyDefinition::getter(|this| {
                    assert_eq!(this.declaring_class().short_name(), "A");
                    let base = this.base().get("value")?;
                    Ok(Value::from(format!("{}+own", base.as_str().unwrap_or_default())))
                })),
            )
            .unwrap();

        assert_eq!(instance.get("value").unwrap(), Value::from("a+own"));
    }

    #[test]
    fn test_bound_method_stored_on_instance_is_released() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "release.A",
                ClassDeclaration::new().method("m", |_, _| Ok(Value::from(1))),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();
        let store = Rc::downgrade(&instance.0);

        instance.set("alias", instance.get("m").unwrap()).unwrap();
        let alias = instance.get("alias").unwrap();
        let alias = alias.as_function().unwrap().clone();
        assert_eq!(alias.call(&Value::Undefined, &[]).unwrap(), Value::from(1));

        drop(instance);
        assert!(store.upgrade().is_none());
        assert!(matches!(
            alias.call(&Value::Undefined, &[]),
            Err(JooplError::UnknownMember { .. })
        ));
    }

    #[test]
    fn test_handler_with_weak_this_is_released() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "release.B",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        let me = this.downgrade();
                        this.event("saidHello")?.subscribe(move |_, args| {
                            if let Some(instance) = me.upgrade() {
                                instance.set_field("heard", args[0].clone());
                            }
                            Ok(Value::Undefined)
                        });
                        Ok(())
                    })
                    .getter("heard", |this| Ok(this.field("heard")))
                    .events(["saidHello"]),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();
        let store = Rc::downgrade(&instance.0);

        instance
            .event("saidHello")
            .unwrap()
            .raise(Value::from("hello world!"))
            .unwrap();
        assert_eq!(instance.get("heard").unwrap(), Value::from("hello world!"));

        let weak = instance.downgrade();
        drop(instance);
        assert!(store.upgrade().is_none());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_sealed_instance() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "sealed.A",
                ClassDeclaration::new()
                    .ctor(|this, _| this.set("expando", 1))
                    .getter("value", |_| Ok(Value::from("hello world")))
                    .setter("classField", |this, v| {
                        this.set_field("classField", v);
                        Ok(())
                    })
                    .method("m", |_, _| Ok(Value::Null))
                    .dynamic(false),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();
        assert!(instance.is_sealed());
        assert!(!instance.is_frozen());

        assert!(matches!(
            instance.set("some", Value::from("new property")),
            Err(JooplError::NotExtensible { .. })
        ));
        assert!(matches!(
            instance.define_property("value", PropertyDescriptor::Data(Value::Null)),
            Err(JooplError::NotConfigurable { .. })
        ));
        assert!(matches!(
            instance.delete("value"),
            Err(JooplError::NotConfigurable { .. })
        ));
        assert_eq!(instance.get("value").unwrap(), Value::from("hello world"));
        assert!(matches!(
            instance.set("someMethod", Value::function(|_, _| Ok(Value::Null))),
            Err(JooplError::NotExtensible { .. })
        ));
        assert!(matches!(
            instance.set("m", Value::function(|_, _| Ok(Value::Null))),
            Err(JooplError::NotConfigurable { .. })
        ));

        // Existing data stays writable, setters keep working
        instance.set("expando", Value::from(2)).unwrap();
        assert_eq!(instance.get("expando").unwrap(), Value::from(2));
        instance.set("classField", Value::from("x")).unwrap();
    }

    #[test]
    fn test_frozen_instance() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "frozen.A",
                ClassDeclaration::new()
                    .ctor(|this, _| {
                        this.set_field("classField", "hello world");
                        this.set("expando", 1)
                    })
                    .getter("value", |_| Ok(Value::from("hello world")))
                    .setter("classField", |this, v| {
                        this.set_field("classField", v);
                        Ok(())
                    })
                    .immutable(true),
            )
            .unwrap();
        let instance = a.instantiate(&[]).unwrap();
        assert!(instance.is_frozen());
        assert!(instance.is_sealed());

        assert!(matches!(
            instance.set("some", Value::from("new property")),
            Err(JooplError::NotExtensible { .. })
        ));
        assert!(matches!(
            instance.define_property("value", PropertyDescriptor::Data(Value::Null)),
            Err(JooplError::NotConfigurable { .. })
        ));
        assert!(matches!(
            instance.delete("value"),
            Err(JooplError::NotConfigurable { .. })
        ));
        assert_eq!(instance.get("value").unwrap(), Value::from("hello world"));
        assert!(matches!(
            instance.set("expando", Value::from(2)),
            Err(JooplError::ReadOnly { .. })
        ));
        assert_eq!(instance.get("expando").unwrap(), Value::from(1));
        instance.set("classField", Value::from("changed")).unwrap();
    }

    #[test]
    fn test_policy_is_not_inherited() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class("inherit.A", ClassDeclaration::new().immutable(true))
            .unwrap();
        let b = registry
            .declare_class("inherit.B", ClassDeclaration::new().inherits(&a))
            .unwrap();

        assert!(a.instantiate(&[]).unwrap().is_frozen());
        let instance = b.instantiate(&[]).unwrap();
        assert!(instance.is_extensible());
        instance.set("some", Value::from(1)).unwrap();
    }

    #[test]
    fn test_events_are_per_instance() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class("events.A", ClassDeclaration::new().events(["click"]))
            .unwrap();
        let b = registry
            .declare_class("events.B", ClassDeclaration::new().inherits(&a))
            .unwrap();

        let first = b.instantiate(&[]).unwrap();
        let second = b.instantiate(&[]).unwrap();
        let count = Rc::new(Cell::new(0));

        for instance in [&first, &second] {
            let counter = count.clone();
            instance.event("click").unwrap().subscribe(move |_, _| {
                counter.set(counter.get() + 1);
                Ok(Value::Undefined)
            });
        }

        first.event("click").unwrap().raise(Value::Null).unwrap();
        assert_eq!(count.get(), 1);
        assert!(!first
            .event("click")
            .unwrap()
            .ptr_eq(&second.event("click").unwrap()));
    }

    #[test]
    fn test_failed_ctor_yields_no_instance() {
        let mut registry = TypeRegistry::new();
        let a = registry
            .declare_class(
                "fail.A",
                ClassDeclaration::new().ctor(|_, _| Err(JooplError::thrown("nope"))),
            )
            .unwrap();
        assert_eq!(a.instantiate(&[]).unwrap_err(), JooplError::thrown("nope"));
    }
}
