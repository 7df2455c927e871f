use std::sync::Arc;

use crate::container::Container;
use crate::deduce::Descriptor;
use crate::error::Result;

/// Trait for types the container can construct by resolving their
/// dependencies.
///
/// Typically implemented via `#[derive(Injectable)]`, which resolves each
/// field from the container in declaration order:
///
/// ```
/// use spindle::prelude::*;
/// use std::sync::Arc;
///
/// #[derive(Default, Injectable)]
/// #[injectable(defaultable)]
/// struct Config;
///
/// #[derive(Injectable)]
/// struct UserService {
///     config: Arc<Config>,
/// }
///
/// let container = Container::new();
/// let service = container.resolve::<UserService>().unwrap();
/// let again = container.resolve::<UserService>().unwrap();
/// assert!(Arc::ptr_eq(&service, &again));
/// ```
///
/// The associated metadata is the type's own declaration of how it behaves
/// inside a container; there is no central registration table.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Whether one instance is cached per container ("single" semantics).
    /// Transient types (`#[injectable(transient)]`) get a fresh instance per
    /// resolution instead.
    const CACHED: bool = true;

    /// Whether the type may be constructed with zero injected dependencies.
    /// Types not tagged (`#[injectable(defaultable)]`) must receive at least
    /// one dependency; this prevents a service that was meant to be wired
    /// from being silently default-constructed.
    const EMPTY_INJECTABLE: bool = false;

    /// Create an instance by resolving dependencies from the container.
    ///
    /// # Errors
    /// Returns an error if any required dependency cannot be resolved.
    fn inject(container: &Container) -> Result<Self>;

    /// The dependencies this type requests, in resolution order.
    fn dependencies() -> Vec<Descriptor> {
        Vec::new()
    }

    /// Called once, after the first instance is constructed and cached, to
    /// register the instance under any base types it stands in for.
    /// Generated by `#[injectable(implements(...))]`; a no-op by default.
    fn register_overrides(_container: &Container, _instance: &Arc<Self>) {}
}
