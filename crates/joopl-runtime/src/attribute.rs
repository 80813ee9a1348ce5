//! Typed attributes attached to classes
//!
//! An attribute is an instance of a class inheriting the registry's built-in
//! `Attribute` root class. A class keeps at most one attribute per concrete
//! attribute class; anything that is not such an instance is rejected when
//! the class is declared.

use crate::class::{Class, ClassId};
use crate::error::{JooplError, JooplResult};
use crate::instance::Instance;
use crate::value::Value;

/// Check whether a value satisfies the Attribute capability
pub fn is_attribute(value: &Value, root: &Class) -> bool {
    value
        .as_object()
        .is_some_and(|instance| instance.is_type_of(root))
}

/// Attributes of one class, keyed by attribute class
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    entries: Vec<(ClassId, Instance)>,
}

impl AttributeSet {
    /// Validate and collect the `attributes` of a declaration
    ///
    /// A later attribute of the same class replaces an earlier one.
    pub(crate) fn build(
        class_name: &str,
        attributes: &[Value],
        root: Option<&Class>,
    ) -> JooplResult<Self> {
        let mut set = AttributeSet::default();

        for value in attributes {
            let instance = match (root, value.as_object()) {
                (Some(root), Some(instance)) if instance.is_type_of(root) => instance,
                _ => {
                    return Err(JooplError::InvalidAttribute {
                        class: class_name.to_string(),
                        found: value.type_name(),
                    })
                }
            };

            let key = instance.class().id();
            if let Some(slot) = set.entries.iter_mut().find(|(id, _)| *id == key) {
                tracing::warn!(
                    class = class_name,
                    attribute = instance.class().name(),
                    "duplicate attribute replaces earlier one"
                );
                slot.1 = instance.clone();
            } else {
                set.entries.push((key, instance.clone()));
            }
        }

        Ok(set)
    }

    /// Attribute of the given class
    pub fn get(&self, attribute: ClassId) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(id, _)| *id == attribute)
            .map(|(_, instance)| instance)
    }

    /// Check for an attribute of the given class
    pub fn contains(&self, attribute: ClassId) -> bool {
        self.get(attribute).is_some()
    }

    /// Attributes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.entries.iter().map(|(_, instance)| instance)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
