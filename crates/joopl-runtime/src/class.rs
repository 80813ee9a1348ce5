//! Type descriptors
//!
//! A [`Class`] is the runtime record of a declared class: identity, base
//! link, ancestry, member table, attributes, structural policy and its own
//! constructor body. It is read-only once declared and shared by every
//! instance and subclass.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::attribute::AttributeSet;
use crate::error::{JooplError, JooplResult};
use crate::factory::ClassFactory;
use crate::instance::Instance;
use crate::member::{CtorBody, MemberDescriptor, MemberKind, MemberTable};
use crate::options::{AttributeLookup, Policy};
use crate::value::Value;

/// Global counter for type tokens
static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

/// Unique type token of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    /// Allocate a fresh token
    pub(crate) fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the factory computed for a new class
pub(crate) struct ClassParts {
    pub id: ClassId,
    pub name: String,
    pub base: Option<Class>,
    pub ancestors: Vec<Class>,
    pub ctor: Option<CtorBody>,
    pub members: MemberTable,
    pub attributes: AttributeSet,
    pub policy: Policy,
    pub attribute_lookup: AttributeLookup,
}

struct ClassInner {
    id: ClassId,
    name: String,
    base: Option<Class>,
    /// Root first, excluding this class; `ancestors[d]` sits at depth `d`
    ancestors: Vec<Class>,
    ctor: Option<CtorBody>,
    members: MemberTable,
    attributes: AttributeSet,
    policy: Policy,
    attribute_lookup: AttributeLookup,
}

/// Shared handle to a type descriptor
#[derive(Clone)]
pub struct Class(Rc<ClassInner>);

impl Class {
    pub(crate) fn from_parts(parts: ClassParts) -> Self {
        Class(Rc::new(ClassInner {
            id: parts.id,
            name: parts.name,
            base: parts.base,
            ancestors: parts.ancestors,
            ctor: parts.ctor,
            members: parts.members,
            attributes: parts.attributes,
            policy: parts.policy,
            attribute_lookup: parts.attribute_lookup,
        }))
    }

    /// Type token
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name without its namespace prefix
    pub fn short_name(&self) -> &str {
        self.0
            .name
            .rsplit(crate::defaults::NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.0.name)
    }

    /// Direct base class
    pub fn base(&self) -> Option<&Class> {
        self.0.base.as_ref()
    }

    /// Ancestors from the root down to the direct base
    pub fn ancestors(&self) -> &[Class] {
        &self.0.ancestors
    }

    /// Position in the inheritance chain (root = 0)
    pub fn depth(&self) -> usize {
        self.0.ancestors.len()
    }

    /// This class or the ancestor declared at `depth`
    pub(crate) fn at_depth(&self, depth: usize) -> Option<&Class> {
        if depth == self.depth() {
            Some(self)
        } else {
            self.0.ancestors.get(depth)
        }
    }

    /// Inheritance chain from this class up to the root
    ///
    /// The first element is the class itself, the last is the root ancestor.
    pub fn hierarchy(&self) -> Vec<&Class> {
        let mut hierarchy = Vec::with_capacity(self.depth() + 1);
        let mut current = Some(self);
        while let Some(class) = current {
            hierarchy.push(class);
            current = class.base();
        }
        hierarchy
    }

    /// Check if this class is `other` or derives from it
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.id() == other.id() {
                return true;
            }
            current = class.base();
        }
        false
    }

    /// Merged member table
    pub fn members(&self) -> &MemberTable {
        &self.0.members
    }

    /// Look up a member (own or inherited)
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.0.members.get(name)
    }

    /// Check if a member exists (own or inherited)
    pub fn has_member(&self, name: &str) -> bool {
        self.0.members.contains(name)
    }

    /// Kind of a member
    pub fn member_kind(&self, name: &str) -> Option<MemberKind> {
        self.member(name).map(|d| d.kind())
    }

    /// Event names declared anywhere in the chain
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.0.members.event_names().map(|name| &**name)
    }

    /// Structural policy applied to instances
    pub fn policy(&self) -> Policy {
        self.0.policy
    }

    /// Whether this class declares its own constructor
    pub fn has_ctor(&self) -> bool {
        self.0.ctor.is_some()
    }

    pub(crate) fn ctor(&self) -> Option<&CtorBody> {
        self.0.ctor.as_ref()
    }

    /// Own attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = &Instance> {
        self.0.attributes.iter()
    }

    /// Check for an attribute of class `attribute`
    pub fn has_attribute(&self, attribute: &Class) -> bool {
        self.find_attribute(attribute).is_some()
    }

    /// Get the attribute of class `attribute`
    pub fn get_attribute(&self, attribute: &Class) -> JooplResult<Instance> {
        self.find_attribute(attribute)
            .cloned()
            .ok_or_else(|| JooplError::AttributeNotFound {
                class: self.name().to_string(),
                attribute: attribute.name().to_string(),
            })
    }

    fn find_attribute(&self, attribute: &Class) -> Option<&Instance> {
        match self.0.attribute_lookup {
            AttributeLookup::OwnOnly => self.0.attributes.get(attribute.id()),
            AttributeLookup::Inherited => self
                .hierarchy()
                .into_iter()
                .find_map(|class| class.0.attributes.get(attribute.id())),
        }
    }

    /// Construct an instance
    pub fn instantiate(&self, args: &[Value]) -> JooplResult<Instance> {
        ClassFactory::instantiate(self, args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("base", &self.base().map(|b| b.name().to_string()))
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
