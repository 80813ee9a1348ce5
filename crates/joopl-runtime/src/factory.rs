//! Class construction and instantiation
//!
//! Declaration turns a [`ClassDeclaration`] into an immutable [`Class`]:
//! ancestry, merged member table, validated attributes and effective
//! policy are all computed up front, so a failed declaration produces
//! nothing. Instantiation runs the construction pipeline:
//!
//! 1. allocate the backing store and the per-instance event channels
//! 2. run the concrete class's own constructor, if it declares one
//! 3. apply the class's structural policy

use crate::attribute::AttributeSet;
use crate::class::{Class, ClassId, ClassParts};
use crate::declaration::ClassDeclaration;
use crate::error::JooplResult;
use crate::instance::Instance;
use crate::member::MemberTable;
use crate::options::RuntimeOptions;
use crate::value::Value;

/// Builds classes and their instances
pub struct ClassFactory;

impl ClassFactory {
    /// Build a class from its declaration
    ///
    /// `attribute_root` is the class every attribute must derive from; with
    /// `None` any attribute is rejected.
    pub fn declare(
        name: &str,
        decl: ClassDeclaration,
        options: &RuntimeOptions,
        attribute_root: Option<&Class>,
    ) -> JooplResult<Class> {
        let id = ClassId::next();
        let base = decl.inherits.clone();

        let (ancestors, base_members) = match &base {
            Some(base) => {
                let mut ancestors = base.ancestors().to_vec();
                ancestors.push(base.clone());
                (ancestors, Some(base.members()))
            }
            None => (Vec::new(), None),
        };
        let depth = ancestors.len();

        let members = MemberTable::resolve(name, id, depth, base_members, &decl.members)?;
        let attributes = AttributeSet::build(name, &decl.attributes, attribute_root)?;
        let policy = decl.policy(options.default_policy);

        tracing::trace!(
            class = name,
            %id,
            depth,
            members = members.len(),
            "resolved class"
        );

        Ok(Class::from_parts(ClassParts {
            id,
            name: name.to_string(),
            base,
            ancestors,
            ctor: decl.ctor,
            members,
            attributes,
            policy,
            attribute_lookup: options.attribute_lookup,
        }))
    }

    /// Build a class that declares nothing, such as the Attribute root
    pub fn builtin(name: &str, options: &RuntimeOptions) -> Class {
        Class::from_parts(ClassParts {
            id: ClassId::next(),
            name: name.to_string(),
            base: None,
            ancestors: Vec::new(),
            ctor: None,
            members: MemberTable::default(),
            attributes: AttributeSet::default(),
            policy: options.default_policy,
            attribute_lookup: options.attribute_lookup,
        })
    }

    /// Construct an instance of `class`
    pub fn instantiate(class: &Class, args: &[Value]) -> JooplResult<Instance> {
        let instance = Instance::allocate(class.clone());

        if let Some(ctor) = class.ctor() {
            ctor(&instance.this_at(class.depth()), args)?;
        }

        instance.lock(class.policy().extensibility());
        tracing::trace!(class = %class.name(), id = instance.id(), "constructed instance");
        Ok(instance)
    }
}
