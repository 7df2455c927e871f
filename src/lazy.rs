use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use crate::container::{Container, ContainerHandle};
use crate::error::{Result, SpindleError};
use crate::injectable::Injectable;

/// A deferred handle for breaking dependency cycles.
///
/// `Lazy<T>` holds a weak reference back to the container and resolves the
/// actual service only when first accessed, so two services may each hold a
/// `Lazy` of the other without the container recursing forever during
/// construction.
///
/// The container reference is weak on purpose: a cached service holding a
/// strong container handle would keep the container alive through its own
/// cache entry and the whole graph would leak.
///
/// # Panics
///
/// `Deref` panics if the service cannot be resolved at first access, or if
/// the owning container has already been dropped. Use [`Lazy::try_get`] for
/// a fallible access path.
pub struct Lazy<T: Send + Sync + 'static> {
    container: ContainerHandle,
    cell: OnceLock<Arc<T>>,
}

impl<T: Injectable> Lazy<T> {
    /// Creates a new `Lazy<T>` bound to `container`.
    ///
    /// Typically called by the `#[derive(Injectable)]` macro for fields of
    /// type `Lazy<T>`.
    pub fn new(container: &Container) -> Self {
        Self {
            container: container.downgrade(),
            cell: OnceLock::new(),
        }
    }

    /// Resolve the service if not yet resolved, returning a shared handle.
    pub fn try_get(&self) -> Result<Arc<T>> {
        if let Some(hit) = self.cell.get() {
            return Ok(Arc::clone(hit));
        }
        let container = self.container.upgrade().ok_or_else(|| {
            SpindleError::Internal(format!(
                "container dropped before lazy dependency '{}' was first used",
                std::any::type_name::<T>()
            ))
        })?;
        let resolved = container.resolve::<T>()?;
        // A concurrent first access may have won the race; keep its value.
        Ok(Arc::clone(self.cell.get_or_init(|| resolved)))
    }

    /// Whether the service has been resolved yet.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: Injectable> Deref for Lazy<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // try_get populates the cell on success.
        if let Err(e) = self.try_get() {
            panic!(
                "Failed to lazily resolve dependency '{}': {}",
                std::any::type_name::<T>(),
                e
            );
        }
        self.cell.get().expect("lazy cell initialized by try_get")
    }
}

impl<T: Injectable> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(v) = self.cell.get() {
            let _ = cell.set(Arc::clone(v));
        }
        Self {
            container: self.container.clone(),
            cell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    struct Greeting {
        text: String,
    }

    impl Injectable for Greeting {
        const EMPTY_INJECTABLE: bool = true;

        fn inject(_container: &Container) -> Result<Self> {
            Ok(Self {
                text: String::from("hello"),
            })
        }
    }

    #[test]
    fn resolves_on_first_access_only() {
        let container = Container::new();
        let lazy: Lazy<Greeting> = Lazy::new(&container);
        assert!(!lazy.is_resolved());
        assert_eq!(lazy.text, "hello");
        assert!(lazy.is_resolved());
    }

    #[test]
    fn try_get_returns_the_cached_single() {
        let container = Container::new();
        let lazy: Lazy<Greeting> = Lazy::new(&container);
        let direct = container.resolve::<Greeting>().unwrap();
        let through_lazy = lazy.try_get().unwrap();
        assert!(Arc::ptr_eq(&direct, &through_lazy));
    }

    #[test]
    fn dropping_the_container_fails_unresolved_lazies() {
        let lazy = {
            let container = Container::new();
            let lazy: Lazy<Greeting> = Lazy::new(&container);
            drop(container);
            lazy
        };
        assert!(lazy.try_get().is_err());
    }
}
