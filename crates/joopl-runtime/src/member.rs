//! Member definitions and member-table resolution
//!
//! A class's member table is its base table with the class's own
//! declarations laid over it. Overrides must keep the member kind; each
//! descriptor remembers the depth of the class that declared it so that
//! `base` dispatch can resume one level above the executing body.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::class::ClassId;
use crate::error::{JooplError, JooplResult};
use crate::instance::This;
use crate::value::Value;

/// Property getter body
pub type Getter = Rc<dyn Fn(&This<'_>) -> JooplResult<Value>>;

/// Property setter body
pub type Setter = Rc<dyn Fn(&This<'_>, Value) -> JooplResult<()>>;

/// Method body
pub type MethodBody = Rc<dyn Fn(&This<'_>, &[Value]) -> JooplResult<Value>>;

/// Constructor body
pub type CtorBody = Rc<dyn Fn(&This<'_>, &[Value]) -> JooplResult<()>>;

/// Kind of a class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Getter / setter pair
    Property,
    /// Callable
    Method,
    /// Per-instance event channel
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => write!(f, "property"),
            MemberKind::Method => write!(f, "method"),
            MemberKind::Event => write!(f, "event"),
        }
    }
}

/// Accessor pair of a property; either half may be absent
#[derive(Clone, Default)]
pub struct PropertyDefinition {
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyDefinition {
    /// Property with neither accessor
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only property
    pub fn getter<F>(f: F) -> Self
    where
        F: Fn(&This<'_>) -> JooplResult<Value> + 'static,
    {
        Self::new().with_getter(f)
    }

    /// Write-only property
    pub fn setter<F>(f: F) -> Self
    where
        F: Fn(&This<'_>, Value) -> JooplResult<()> + 'static,
    {
        Self::new().with_setter(f)
    }

    /// Replace the getter
    pub fn with_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&This<'_>) -> JooplResult<Value> + 'static,
    {
        self.getter = Some(Rc::new(f));
        self
    }

    /// Replace the setter
    pub fn with_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&This<'_>, Value) -> JooplResult<()> + 'static,
    {
        self.setter = Some(Rc::new(f));
        self
    }

    /// Whether the property has a getter
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the property has a setter
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn get_fn(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub(crate) fn set_fn(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    /// Overlay the accessor halves that `other` defines
    pub(crate) fn merge(&mut self, other: PropertyDefinition) {
        if other.getter.is_some() {
            self.getter = other.getter;
        }
        if other.setter.is_some() {
            self.setter = other.setter;
        }
    }
}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// A member as written in a declaration
#[derive(Clone)]
pub enum MemberDefinition {
    /// Getter / setter pair
    Property(PropertyDefinition),
    /// Method body
    Method(MethodBody),
    /// Event; the channel is created per instance
    Event,
}

impl MemberDefinition {
    /// Method definition from a closure
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&This<'_>, &[Value]) -> JooplResult<Value> + 'static,
    {
        MemberDefinition::Method(Rc::new(f))
    }

    /// Kind of this definition
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDefinition::Property(_) => MemberKind::Property,
            MemberDefinition::Method(_) => MemberKind::Method,
            MemberDefinition::Event => MemberKind::Event,
        }
    }
}

impl fmt::Debug for MemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberDefinition::Property(p) => write!(f, "{:?}", p),
            MemberDefinition::Method(_) => write!(f, "Method"),
            MemberDefinition::Event => write!(f, "Event"),
        }
    }
}

/// A resolved member: its definition plus the class that declared it
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    name: Rc<str>,
    definition: MemberDefinition,
    declaring: ClassId,
    depth: usize,
}

impl MemberDescriptor {
    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member kind
    pub fn kind(&self) -> MemberKind {
        self.definition.kind()
    }

    /// Definition as declared
    pub fn definition(&self) -> &MemberDefinition {
        &self.definition
    }

    /// Id of the declaring class
    pub fn declaring_class(&self) -> ClassId {
        self.declaring
    }

    /// Depth of the declaring class in the inheritance chain (root = 0)
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Merged member table of a class
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    entries: FxHashMap<Rc<str>, MemberDescriptor>,
    /// Declaration order, inherited names first
    order: Vec<Rc<str>>,
}

impl MemberTable {
    /// Build the table of a class declared at `depth` over `base`
    ///
    /// Fails with `KindMismatch` when a declaration changes the kind of an
    /// inherited member or of an earlier declaration of the same name.
    pub fn resolve(
        class_name: &str,
        class_id: ClassId,
        depth: usize,
        base: Option<&MemberTable>,
        declared: &[(String, MemberDefinition)],
    ) -> JooplResult<Self> {
        let mut table = base.cloned().unwrap_or_default();

        for (name, definition) in declared {
            if let Some(existing) = table.entries.get(name.as_str()) {
                if existing.kind() != definition.kind() {
                    return Err(JooplError::KindMismatch {
                        class: class_name.to_string(),
                        member: name.clone(),
                        inherited: existing.kind(),
                        declared: definition.kind(),
                    });
                }
            }

            let key: Rc<str> = Rc::from(name.as_str());
            let descriptor = MemberDescriptor {
                name: key.clone(),
                definition: definition.clone(),
                declaring: class_id,
                depth,
            };
            if table.entries.insert(key.clone(), descriptor).is_none() {
                table.order.push(key);
            }
        }

        Ok(table)
    }

    /// Look up a member by name
    pub fn get(&self, name: &str) -> Option<&MemberDescriptor> {
        self.entries.get(name)
    }

    /// Check if a member exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.order.iter().filter_map(move |name| self.entries.get(name))
    }

    /// Names of event members in declaration order
    pub fn event_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.order.iter().filter(move |name| {
            self.entries
                .get(*name)
                .is_some_and(|d| d.kind() == MemberKind::Event)
        })
    }
}
