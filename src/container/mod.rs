//! The service container.
//!
//! A [`Container`] is the outermost wrapper around the whole resolution
//! pipeline: single-instance cache, then registered instances, then
//! registered factories, then recursive [`Injectable`] construction — an
//! explicit first-wins order, checked per request under a cycle guard.
//! Everything the container constructs is owned by its heap storage and
//! torn down in reverse construction order when the container is dropped.

mod builder;
mod cache;
mod cycle;
mod overrides;
mod storage;

pub use builder::ContainerBuilder;
pub use overrides::OverrideTarget;

use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use self::cache::InstanceCache;
use self::cycle::ResolutionStack;
use self::overrides::{OverrideEntry, OverrideRegistry};
use self::storage::HeapStorage;
use crate::error::{Result, SpindleError};
use crate::injectable::Injectable;
use crate::type_key::TypeKey;

#[derive(Clone)]
struct RegisteredEntry {
    key: TypeKey,
    instance: Arc<dyn Any + Send + Sync>,
}

#[derive(Clone)]
struct FactoryEntry {
    key: TypeKey,
    produce: Arc<dyn Fn(&Container) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>,
}

struct ContainerInner {
    instances: DashMap<TypeId, RegisteredEntry>,
    factories: DashMap<TypeId, FactoryEntry>,
    overrides: OverrideRegistry,
    cache: InstanceCache,
    resolving: ResolutionStack,
    // Declared last: the maps above must release their handles first so
    // storage teardown actually destroys instances, in reverse order.
    storage: HeapStorage,
}

impl ContainerInner {
    fn empty() -> Self {
        Self {
            instances: DashMap::new(),
            factories: DashMap::new(),
            overrides: OverrideRegistry::new(),
            cache: InstanceCache::new(),
            resolving: ResolutionStack::new(),
            storage: HeapStorage::new(),
        }
    }
}

/// Dependency injection container.
///
/// Cloning a `Container` yields another handle to the *same* container;
/// use [`Container::fork`] for an independent snapshot.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// A weak container handle, used where a strong handle would keep the
/// container alive through its own cache (see [`crate::Lazy`]).
#[derive(Clone)]
pub struct ContainerHandle {
    inner: Weak<ContainerInner>,
}

impl ContainerHandle {
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerInner::empty()),
        }
    }

    pub fn downgrade(&self) -> ContainerHandle {
        ContainerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Register an eagerly created service instance.
    pub fn register<T: Send + Sync + 'static>(&self, instance: T) -> &Self {
        self.register_shared(Arc::new(instance))
    }

    /// Register an already-shared service instance.
    pub fn register_shared<T: Send + Sync + 'static>(&self, instance: Arc<T>) -> &Self {
        let key = TypeKey::of::<T>();
        tracing::debug!("registering instance of {}", key.name());
        self.inner.instances.insert(key.id(), RegisteredEntry {
            key,
            instance,
        });
        self
    }

    /// Register a factory for `T`. The factory runs once per cached
    /// resolution of `T`, and once per [`Container::construct`] call.
    pub fn register_factory<T, F>(&self, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        tracing::debug!("registering factory for {}", key.name());
        self.inner.factories.insert(key.id(), FactoryEntry {
            key,
            produce: Arc::new(move |c| {
                factory(c).map(|t| Box::new(t) as Box<dyn Any + Send + Sync>)
            }),
        });
        self
    }

    /// Look up an existing instance (cached or registered) without
    /// constructing anything.
    pub fn lookup<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        if let Some(hit) = self.inner.cache.get::<T>() {
            return Ok(hit);
        }
        let entry = self
            .inner
            .instances
            .get(&TypeId::of::<T>())
            .map(|e| e.instance.clone())
            .ok_or_else(|| SpindleError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        entry
            .downcast::<T>()
            .map_err(|_| SpindleError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve a shared handle to `T` — the "single" path.
    ///
    /// For cached types ([`Injectable::CACHED`], the default) at most one
    /// instance is ever constructed per container, and every resolution
    /// returns a handle to it. Transient types get a fresh instance per
    /// call.
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let _guard = self.inner.resolving.begin(key)?;

        if T::CACHED {
            if let Some(hit) = self.inner.cache.get::<T>() {
                tracing::debug!("cache hit for {}", key.name());
                return Ok(hit);
            }
        }

        self.check_unambiguous(key)?;

        // Clone entries out so no map guard is held across recursive calls.
        let registered = self.inner.instances.get(&key.id()).map(|e| e.clone());
        if let Some(entry) = registered {
            return entry
                .instance
                .downcast::<T>()
                .map_err(|_| SpindleError::DowncastFailed {
                    type_name: key.name().to_string(),
                });
        }

        let factory = self.inner.factories.get(&key.id()).map(|e| e.produce.clone());
        let instance = if let Some(factory) = factory {
            tracing::debug!("constructing {} via factory", key.name());
            let boxed = factory(self)?;
            let value = boxed
                .downcast::<T>()
                .map_err(|_| SpindleError::DowncastFailed {
                    type_name: key.name().to_string(),
                })?;
            Arc::new(*value)
        } else {
            tracing::debug!("constructing {} via injection", key.name());
            Arc::new(T::inject(self)?)
        };

        if T::CACHED {
            let instance = self.inner.storage.adopt(instance);
            self.inner.cache.insert(instance.clone());
            T::register_overrides(self, &instance);
            Ok(instance)
        } else {
            Ok(instance)
        }
    }

    /// Construct a fresh, owned `T` — the "by value" path.
    ///
    /// Never aliases a cached single and never inserts into the cache:
    /// requesting an owned value is a request for a new object.
    pub fn construct<T: Injectable>(&self) -> Result<T> {
        let key = TypeKey::of::<T>();
        let _guard = self.inner.resolving.begin(key)?;

        let factory = self.inner.factories.get(&key.id()).map(|e| e.produce.clone());
        if let Some(factory) = factory {
            let boxed = factory(self)?;
            return boxed
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| SpindleError::DowncastFailed {
                    type_name: key.name().to_string(),
                });
        }

        T::inject(self)
    }

    /// Declare that resolving base `B` may be satisfied by the concrete
    /// service `D`. The concrete instance is resolved (and cached) on
    /// demand through the normal pipeline.
    ///
    /// Later registrations win: the most recently registered override of a
    /// base is the one a [`Container::resolve_override`] call returns.
    pub fn register_override<B, D, F>(&self, caster: F) -> &Self
    where
        B: ?Sized + OverrideTarget + Send + Sync,
        D: Injectable,
        F: Fn(Arc<D>) -> Arc<B> + Send + Sync + 'static,
    {
        let entry = OverrideEntry {
            concrete: TypeKey::of::<D>(),
            resolver: Arc::new(move |container: &Container| {
                let concrete = container.resolve::<D>()?;
                let base: Arc<B> = caster(concrete);
                Ok(Arc::new(base) as Arc<dyn Any + Send + Sync>)
            }),
        };
        self.inner.overrides.register(TypeKey::of::<B>(), entry);
        self
    }

    /// Register an already-built instance as an override of base `B`.
    pub fn register_override_instance<B>(&self, concrete: TypeKey, instance: Arc<B>) -> &Self
    where
        B: ?Sized + OverrideTarget + Send + Sync,
    {
        let entry = OverrideEntry {
            concrete,
            resolver: Arc::new(move |_| {
                Ok(Arc::new(instance.clone()) as Arc<dyn Any + Send + Sync>)
            }),
        };
        self.inner.overrides.register(TypeKey::of::<B>(), entry);
        self
    }

    /// Resolve the most recently registered override of base `B`.
    ///
    /// Whether *any* override has been registered is inherently a runtime
    /// fact, so this is the one resolution path that can fail for a reason
    /// other than a broken dependency graph.
    pub fn resolve_override<B: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<B>> {
        let entry = self
            .inner
            .overrides
            .latest(TypeId::of::<B>())
            .ok_or_else(|| SpindleError::NoOverride {
                type_name: std::any::type_name::<B>().to_string(),
            })?;
        self.materialize_override(entry)
    }

    /// Every registered override of base `B`, in registration order.
    pub fn overrides_of<B: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<B>>> {
        self.inner
            .overrides
            .all(TypeId::of::<B>())
            .into_iter()
            .map(|entry| self.materialize_override(entry))
            .collect()
    }

    fn materialize_override<B: ?Sized + Send + Sync + 'static>(
        &self,
        entry: OverrideEntry,
    ) -> Result<Arc<B>> {
        let produced = (entry.resolver)(self)?;
        let wrapped = produced
            .downcast::<Arc<B>>()
            .map_err(|_| SpindleError::DowncastFailed {
                type_name: std::any::type_name::<B>().to_string(),
            })?;
        Ok(Arc::clone(&*wrapped))
    }

    /// Whether the container knows `T`: cached, registered, or standing as
    /// an override base.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.inner.cache.contains(id)
            || self.inner.instances.contains_key(&id)
            || self.inner.overrides.contains(id)
    }

    /// Number of instances currently held (cached plus registered).
    pub fn len(&self) -> usize {
        self.inner.cache.len() + self.inner.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty() && self.inner.instances.is_empty()
    }

    /// Fork this container: an independent container observing everything
    /// present here at fork time.
    ///
    /// Entry handles are copied, instances are not: both containers see the
    /// same pre-fork objects at the same addresses, while anything either
    /// side constructs afterwards stays private to it. The parent keeps
    /// teardown ownership of pre-fork instances; the fork owns only what it
    /// builds itself.
    pub fn fork(&self) -> Container {
        self.fork_filtered(|_| false)
    }

    /// Fork, excluding entries whose key matches `exclude` from being
    /// inherited. The predicate applies to cached singles, registered
    /// instances, factories, and override bases alike.
    pub fn fork_filtered(&self, exclude: impl Fn(TypeKey) -> bool) -> Container {
        tracing::debug!("forking container ({} entries)", self.len());
        let inner = ContainerInner {
            instances: {
                let map = DashMap::new();
                for entry in self.inner.instances.iter() {
                    if !exclude(entry.value().key) {
                        map.insert(*entry.key(), entry.value().clone());
                    }
                }
                map
            },
            factories: {
                let map = DashMap::new();
                for entry in self.inner.factories.iter() {
                    if !exclude(entry.value().key) {
                        map.insert(*entry.key(), entry.value().clone());
                    }
                }
                map
            },
            overrides: self.inner.overrides.snapshot(&|key| exclude(key)),
            cache: self.inner.cache.snapshot(&|key| exclude(key)),
            resolving: ResolutionStack::new(),
            storage: HeapStorage::new(),
        };
        Container {
            inner: Arc::new(inner),
        }
    }

    /// Move a donor container's entries into this one. On a key collision
    /// this container's entry wins and the donor's stops being visible, but
    /// the donor's instance storage is still taken over so donated objects
    /// live (and tear down) with the receiver.
    pub fn merge(&self, donor: Container) {
        tracing::debug!(
            "merging {} donor entries ({} stored instances)",
            donor.len(),
            donor.inner.storage.len()
        );
        self.inner.cache.absorb(&donor.inner.cache);
        for entry in donor.inner.instances.iter() {
            self.inner
                .instances
                .entry(*entry.key())
                .or_insert_with(|| entry.value().clone());
        }
        for entry in donor.inner.factories.iter() {
            self.inner
                .factories
                .entry(*entry.key())
                .or_insert_with(|| entry.value().clone());
        }
        self.inner.overrides.absorb(&donor.inner.overrides);
        self.inner.storage.absorb(&donor.inner.storage);
    }

    /// Copy a donor's currently-visible entries into this container's
    /// lookup tables without taking over its storage. Instances stay under
    /// shared ownership, so the donor remains free to drop independently.
    pub fn rebase(&self, donor: &Container) {
        tracing::debug!("rebasing onto {} donor entries", donor.len());
        self.inner.cache.absorb(&donor.inner.cache);
        for entry in donor.inner.instances.iter() {
            self.inner
                .instances
                .entry(*entry.key())
                .or_insert_with(|| entry.value().clone());
        }
    }

    fn check_unambiguous(&self, key: TypeKey) -> Result<()> {
        if self.inner.instances.contains_key(&key.id())
            && self.inner.factories.contains_key(&key.id())
        {
            return Err(SpindleError::AmbiguousProvider {
                type_name: key.name().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn has_cached(&self, id: TypeId) -> bool {
        self.inner.cache.contains(id)
    }

    pub(crate) fn has_instance(&self, id: TypeId) -> bool {
        self.inner.instances.contains_key(&id)
    }

    pub(crate) fn has_factory(&self, id: TypeId) -> bool {
        self.inner.factories.contains_key(&id)
    }

    pub(crate) fn is_resolving(&self, id: TypeId) -> bool {
        self.inner.resolving.is_resolving(id)
    }

    pub(crate) fn override_concretes(&self, base: TypeId) -> Vec<TypeKey> {
        self.inner
            .overrides
            .all(base)
            .into_iter()
            .map(|e| e.concrete)
            .collect()
    }

    pub(crate) fn known_override_bases(&self) -> Vec<TypeKey> {
        self.inner.overrides.base_keys()
    }

    pub(crate) fn cached_keys(&self) -> Vec<TypeKey> {
        self.inner.cache.keys()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
