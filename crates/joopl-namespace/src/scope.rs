//! Namespace scopes
//!
//! A [`Scope`] is the receiver handed to `register` callbacks and a
//! [`ScopeView`] the read-only one handed to `using` callbacks. Classes
//! declared through a scope get the namespace-qualified name
//! `namespace.Short`; lookups take the short name. Short names never contain
//! the namespace separator, so one namespace cannot declare into another.

use joopl_runtime::defaults::NAMESPACE_SEPARATOR;
use joopl_runtime::{Class, ClassDeclaration, Instance, TypeRegistry, Value};

use crate::error::{NamespaceError, NamespaceResult};

fn is_valid_short_name(short: &str) -> bool {
    !short.is_empty() && !short.contains(NAMESPACE_SEPARATOR)
}

fn qualify(namespace: &str, short: &str) -> String {
    if namespace.is_empty() {
        short.to_string()
    } else {
        format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, short)
    }
}

/// Read-only binding of a namespace to the type registry
#[derive(Clone, Copy)]
pub struct ScopeView<'r> {
    name: &'r str,
    types: &'r TypeRegistry,
    classes: &'r [String],
}

impl<'r> ScopeView<'r> {
    pub(crate) fn new(name: &'r str, types: &'r TypeRegistry, classes: &'r [String]) -> Self {
        Self {
            name,
            types,
            classes,
        }
    }

    /// Namespace name
    pub fn name(&self) -> &'r str {
        self.name
    }

    /// Qualified name of a class of this namespace
    ///
    /// The empty namespace is the global one: names are left as they are.
    pub fn qualify(&self, short: &str) -> String {
        qualify(self.name, short)
    }

    /// Class of this namespace by short name
    pub fn get(&self, short: &str) -> Option<Class> {
        if !is_valid_short_name(short) {
            return None;
        }
        self.types.get_class_by_name(&self.qualify(short)).cloned()
    }

    /// Class of this namespace by short name, failing with `ClassNotFound`
    pub fn class(&self, short: &str) -> NamespaceResult<Class> {
        if !is_valid_short_name(short) {
            return Err(self.invalid_name(short));
        }
        self.get(short).ok_or_else(|| NamespaceError::ClassNotFound {
            namespace: self.name.to_string(),
            class: short.to_string(),
        })
    }

    /// Construct an instance of a class of this namespace
    pub fn instantiate(&self, short: &str, args: &[Value]) -> NamespaceResult<Instance> {
        Ok(self.class(short)?.instantiate(args)?)
    }

    /// Classes of this namespace in declaration order
    pub fn classes(&self) -> Vec<Class> {
        self.classes
            .iter()
            .filter_map(|short| self.get(short))
            .collect()
    }

    /// The built-in `Attribute` root class
    pub fn attribute_class(&self) -> Class {
        self.types.attribute_class().clone()
    }

    /// Underlying type registry
    pub fn types(&self) -> &'r TypeRegistry {
        self.types
    }

    fn invalid_name(&self, short: &str) -> NamespaceError {
        NamespaceError::InvalidClassName {
            namespace: self.name.to_string(),
            class: short.to_string(),
        }
    }
}

/// Binding of a namespace to the type registry, able to declare classes
pub struct Scope<'r> {
    name: &'r str,
    types: &'r mut TypeRegistry,
    classes: &'r mut Vec<String>,
}

impl<'r> Scope<'r> {
    pub(crate) fn new(
        name: &'r str,
        types: &'r mut TypeRegistry,
        classes: &'r mut Vec<String>,
    ) -> Self {
        Self {
            name,
            types,
            classes,
        }
    }

    /// Read-only view of this scope
    pub fn view(&self) -> ScopeView<'_> {
        ScopeView::new(self.name, &*self.types, self.classes.as_slice())
    }

    /// Namespace name
    pub fn name(&self) -> &str {
        self.name
    }

    /// Qualified name of a class of this namespace
    pub fn qualify(&self, short: &str) -> String {
        qualify(self.name, short)
    }

    /// Declare a class in this namespace
    ///
    /// Fails with `InvalidClassName` when `short` is empty or contains the
    /// namespace separator.
    pub fn declare_class(
        &mut self,
        short: &str,
        decl: ClassDeclaration,
    ) -> NamespaceResult<Class> {
        if !is_valid_short_name(short) {
            return Err(self.view().invalid_name(short));
        }
        let qualified = self.qualify(short);
        let class = self.types.declare_class(&qualified, decl)?;
        self.classes.push(short.to_string());
        Ok(class)
    }

    /// Alias of [`Scope::declare_class`]
    pub fn def(&mut self, short: &str, decl: ClassDeclaration) -> NamespaceResult<Class> {
        self.declare_class(short, decl)
    }

    /// Class of this namespace by short name
    pub fn get(&self, short: &str) -> Option<Class> {
        self.view().get(short)
    }

    /// Class of this namespace by short name, failing with `ClassNotFound`
    pub fn class(&self, short: &str) -> NamespaceResult<Class> {
        self.view().class(short)
    }

    /// Construct an instance of a class of this namespace
    pub fn instantiate(&self, short: &str, args: &[Value]) -> NamespaceResult<Instance> {
        self.view().instantiate(short, args)
    }

    /// Classes of this namespace in declaration order
    pub fn classes(&self) -> Vec<Class> {
        self.view().classes()
    }

    /// The built-in `Attribute` root class
    pub fn attribute_class(&self) -> Class {
        self.types.attribute_class().clone()
    }

    /// Underlying type registry
    pub fn types(&self) -> &TypeRegistry {
        &*self.types
    }
}
