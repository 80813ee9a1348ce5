//! Namespace registry

use joopl_runtime::{RuntimeOptions, TypeRegistry};
use rustc_hash::FxHashMap;

use crate::error::{NamespaceError, NamespaceResult};
use crate::scope::{Scope, ScopeView};

/// Named groups of classes over one type registry
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    types: TypeRegistry,
    /// Namespace name to short class names, in declaration order
    namespaces: FxHashMap<String, Vec<String>>,
}

impl NamespaceRegistry {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose classes are declared with `options`
    pub fn with_options(options: RuntimeOptions) -> Self {
        Self {
            types: TypeRegistry::with_options(options),
            namespaces: FxHashMap::default(),
        }
    }

    /// Register (or reopen) a namespace and run `f` against its scope
    ///
    /// The namespace exists from the start of the call, even when `f` fails.
    pub fn register<F, R>(&mut self, name: &str, f: F) -> NamespaceResult<R>
    where
        F: FnOnce(&mut Scope<'_>) -> NamespaceResult<R>,
    {
        if !self.namespaces.contains_key(name) {
            tracing::debug!(namespace = name, "registering namespace");
        }
        let classes = self.namespaces.entry(name.to_string()).or_default();
        let mut scope = Scope::new(name, &mut self.types, classes);
        f(&mut scope)
    }

    /// Run `f` against a read-only view of a registered namespace
    pub fn using<F, R>(&self, name: &str, f: F) -> NamespaceResult<R>
    where
        F: FnOnce(&ScopeView<'_>) -> NamespaceResult<R>,
    {
        let classes = self
            .namespaces
            .get(name)
            .ok_or_else(|| NamespaceError::NotRegistered(name.to_string()))?;
        let scope = ScopeView::new(name, &self.types, classes);
        f(&scope)
    }

    /// Check if a namespace was registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Registered namespace names
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Underlying type registry
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }
}
