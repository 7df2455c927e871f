//! Argument deduction.
//!
//! A [`Deducer`] is the transient proxy through which an injector resolves
//! one constructor invocation's arguments against a bound source. Each
//! `deduce` call resolves one parameter slot; the slot's type drives trait
//! dispatch, so which argument a slot receives is settled entirely at
//! compile time.
//!
//! [`Descriptor`] and [`AccessKind`] name the delivery forms a dependency
//! can be requested in. They are the explicit, pattern-matchable rendering
//! of what would otherwise be hidden inside trait dispatch, and the
//! container's diagnostics are built on them.

use std::fmt;

use crate::compose::ProvideAt;
use crate::type_key::TypeKey;

/// How a dependency is delivered to its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// A fresh, owned value constructed for this consumer alone.
    Value,
    /// A shared handle (`Arc`) to the one cached instance.
    Shared,
    /// A deferred handle resolved on first use; breaks dependency cycles.
    Lazy,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Value => f.write_str("value"),
            AccessKind::Shared => f.write_str("shared"),
            AccessKind::Lazy => f.write_str("lazy"),
        }
    }
}

/// One constructor parameter: the target type plus its delivery form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    key: TypeKey,
    kind: AccessKind,
}

impl Descriptor {
    pub fn new(key: TypeKey, kind: AccessKind) -> Self {
        Self { key, kind }
    }

    pub fn value<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), AccessKind::Value)
    }

    pub fn shared<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), AccessKind::Shared)
    }

    pub fn lazy<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), AccessKind::Lazy)
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn kind(&self) -> AccessKind {
        self.kind
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key.name(), self.kind)
    }
}

/// Transient resolution proxy bound to a source.
///
/// A deducer is created per constructor invocation and discarded after it;
/// it never outlives the call it serves.
pub struct Deducer<'s, S: ?Sized> {
    source: &'s mut S,
}

impl<'s, S: ?Sized> Deducer<'s, S> {
    pub fn new(source: &'s mut S) -> Self {
        Self { source }
    }

    /// Resolve one parameter slot of type `T` against the bound source.
    ///
    /// Compiles only if the source composition can provide `T` through
    /// exactly one child; the index `I` is inferred.
    pub fn deduce<T, I>(&mut self) -> T
    where
        S: ProvideAt<T, I>,
    {
        self.source.provide_at()
    }
}
