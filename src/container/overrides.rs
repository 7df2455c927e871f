//! Polymorphic override registry.
//!
//! A concrete service may stand in for one or more base (trait-object)
//! types. Each base keeps an *ordered* list of registered overrides; a
//! request for the base resolves the most recently registered one, and the
//! full list can be enumerated in registration order.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

use super::Container;
use crate::error::Result;
use crate::type_key::TypeKey;

/// Marker for base types that may be overridden.
///
/// Implemented for the trait object a concrete service stands in for:
///
/// ```
/// use spindle::OverrideTarget;
///
/// trait Notifier: Send + Sync {}
/// impl OverrideTarget for dyn Notifier {}
/// ```
///
/// A base that is sealed against overriding simply does not implement this
/// trait, which makes an illegal override a compile error rather than
/// anything a container could observe at run time.
pub trait OverrideTarget: 'static {}

/// Produces the stored override as a double-wrapped handle:
/// `Arc<dyn Any>` holding an `Arc<B>`, so the caller can downcast to the
/// sized `Arc<B>` and clone the inner handle out.
type ErasedResolver =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct OverrideEntry {
    pub(crate) concrete: TypeKey,
    pub(crate) resolver: ErasedResolver,
}

#[derive(Clone)]
struct BaseEntries {
    base: TypeKey,
    entries: Vec<OverrideEntry>,
}

#[derive(Default)]
pub(crate) struct OverrideRegistry {
    bases: DashMap<TypeId, BaseEntries>,
}

impl OverrideRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, base: TypeKey, entry: OverrideEntry) {
        tracing::debug!(
            "registering override {} for base {}",
            entry.concrete.name(),
            base.name()
        );
        self.bases
            .entry(base.id())
            .or_insert_with(|| BaseEntries {
                base,
                entries: Vec::new(),
            })
            .entries
            .push(entry);
    }

    /// The most recently registered override for `base`, if any.
    pub(crate) fn latest(&self, base: TypeId) -> Option<OverrideEntry> {
        self.bases
            .get(&base)
            .and_then(|b| b.entries.last().cloned())
    }

    /// Every override of `base`, in registration order.
    pub(crate) fn all(&self, base: TypeId) -> Vec<OverrideEntry> {
        self.bases
            .get(&base)
            .map(|b| b.entries.clone())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, base: TypeId) -> bool {
        self.bases.contains_key(&base)
    }

    pub(crate) fn base_keys(&self) -> Vec<TypeKey> {
        self.bases.iter().map(|b| b.value().base).collect()
    }

    /// Point-in-time copy of every base's entry list, minus excluded bases.
    pub(crate) fn snapshot(&self, exclude: &dyn Fn(TypeKey) -> bool) -> OverrideRegistry {
        let bases = DashMap::new();
        for entry in self.bases.iter() {
            if !exclude(entry.value().base) {
                bases.insert(*entry.key(), entry.value().clone());
            }
        }
        OverrideRegistry { bases }
    }

    /// Fold a donor's lists into this registry. Donated entries are placed
    /// *before* local ones so the receiver's registrations stay the recency
    /// winners.
    pub(crate) fn absorb(&self, donor: &OverrideRegistry) {
        for donated in donor.bases.iter() {
            match self.bases.get_mut(donated.key()) {
                Some(mut local) => {
                    let mut combined = donated.value().entries.clone();
                    combined.append(&mut local.entries);
                    local.entries = combined;
                }
                None => {
                    self.bases.insert(*donated.key(), donated.value().clone());
                }
            }
        }
    }
}
