//! Runtime configuration

use crate::defaults::{DEFAULT_DYNAMIC, DEFAULT_IMMUTABLE};

/// Structural policy of a class's instances
///
/// Read from the most-derived class only; ancestors' flags never leak into
/// a subclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Instances may gain and lose members after construction
    pub dynamic: bool,
    /// Existing members are frozen after construction (implies sealed)
    pub immutable: bool,
}

impl Policy {
    /// Extensibility applied to an instance once its constructor returns
    pub fn extensibility(&self) -> Extensibility {
        if self.immutable {
            Extensibility::Frozen
        } else if !self.dynamic {
            Extensibility::Sealed
        } else {
            Extensibility::Extensible
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            dynamic: DEFAULT_DYNAMIC,
            immutable: DEFAULT_IMMUTABLE,
        }
    }
}

/// Shape state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Extensibility {
    /// Members can be added, redefined and deleted
    Extensible,
    /// No members can be added, redefined or deleted; data stays writable
    Sealed,
    /// Sealed, and existing data members are read-only
    Frozen,
}

/// Where `has_attribute` / `get_attribute` look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeLookup {
    /// Only the queried class's own attributes
    #[default]
    OwnOnly,
    /// The queried class first, then its ancestors from nearest to root
    Inherited,
}

/// Options for a type registry
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Policy for declarations that leave `dynamic` / `immutable` unset
    pub default_policy: Policy,
    /// Attribute lookup rule for classes declared in this registry
    pub attribute_lookup: AttributeLookup,
}

impl RuntimeOptions {
    /// Set the default policy
    pub fn with_default_policy(mut self, policy: Policy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Set the attribute lookup rule
    pub fn with_attribute_lookup(mut self, lookup: AttributeLookup) -> Self {
        self.attribute_lookup = lookup;
        self
    }
}
