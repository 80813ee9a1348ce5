//! Type registry
//!
//! Owns every class declared through it, indexed by type token and by
//! qualified name, plus the built-in `Attribute` root class. Registries are
//! plain values: two registries never see each other's classes.

use rustc_hash::FxHashMap;

use crate::class::{Class, ClassId};
use crate::declaration::ClassDeclaration;
use crate::defaults::ATTRIBUTE_CLASS_NAME;
use crate::error::{JooplError, JooplResult};
use crate::factory::ClassFactory;
use crate::options::RuntimeOptions;

/// Registry of declared classes
#[derive(Debug)]
pub struct TypeRegistry {
    /// Classes in declaration order
    classes: Vec<Class>,
    /// Qualified name to index mapping
    name_to_index: FxHashMap<String, usize>,
    /// Type token to index mapping
    id_to_index: FxHashMap<ClassId, usize>,
    options: RuntimeOptions,
    /// Built-in root of every attribute class
    attribute: Class,
}

impl TypeRegistry {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a registry with the given options
    pub fn with_options(options: RuntimeOptions) -> Self {
        let attribute = ClassFactory::builtin(ATTRIBUTE_CLASS_NAME, &options);
        let mut registry = Self {
            classes: Vec::new(),
            name_to_index: FxHashMap::default(),
            id_to_index: FxHashMap::default(),
            options,
            attribute: attribute.clone(),
        };
        registry.insert(attribute);
        registry
    }

    /// Options classes are declared with
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// The built-in `Attribute` root class
    pub fn attribute_class(&self) -> &Class {
        &self.attribute
    }

    /// Declare a class under a qualified name
    ///
    /// Nothing is registered when the declaration fails.
    pub fn declare_class(&mut self, name: &str, decl: ClassDeclaration) -> JooplResult<Class> {
        if self.name_to_index.contains_key(name) {
            return Err(JooplError::DuplicateClass {
                name: name.to_string(),
            });
        }

        let class = ClassFactory::declare(name, decl, &self.options, Some(&self.attribute))?;
        tracing::debug!(
            class = name,
            id = %class.id(),
            base = class.base().map(|b| b.name()),
            "declared class"
        );

        self.insert(class.clone());
        Ok(class)
    }

    fn insert(&mut self, class: Class) {
        let index = self.classes.len();
        self.name_to_index.insert(class.name().to_string(), index);
        self.id_to_index.insert(class.id(), index);
        self.classes.push(class);
    }

    /// Get class by type token
    pub fn get_class(&self, id: ClassId) -> Option<&Class> {
        self.id_to_index
            .get(&id)
            .and_then(|index| self.classes.get(*index))
    }

    /// Get class by qualified name
    pub fn get_class_by_name(&self, name: &str) -> Option<&Class> {
        self.name_to_index
            .get(name)
            .and_then(|index| self.classes.get(*index))
    }

    /// Get class by qualified name, failing with `ClassNotFound`
    pub fn class(&self, name: &str) -> JooplResult<&Class> {
        self.get_class_by_name(name)
            .ok_or_else(|| JooplError::ClassNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a class name is taken
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Number of classes, the `Attribute` root included
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry holds nothing but the built-in classes
    pub fn is_empty(&self) -> bool {
        self.classes.len() <= 1
    }

    /// Iterate over classes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
