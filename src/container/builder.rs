use std::sync::Arc;

use crate::container::{Container, OverrideTarget};
use crate::error::Result;
use crate::injectable::Injectable;
use crate::module::Module;
use crate::type_key::TypeKey;

/// Fluent construction of a [`Container`].
///
/// Everything the builder offers is also available on the container
/// directly; the builder exists for the common setup phase where a chain
/// of registrations reads better than repeated statements.
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register an eagerly created service instance.
    pub fn register<T: Send + Sync + 'static>(self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Register an already-shared service instance.
    pub fn register_shared<T: Send + Sync + 'static>(self, instance: Arc<T>) -> Self {
        self.container.register_shared(instance);
        self
    }

    /// Register a factory for `T`.
    pub fn register_factory<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.container.register_factory(factory);
        self
    }

    /// Declare concrete service `D` as an override of base `B`.
    pub fn register_override<B, D, F>(self, caster: F) -> Self
    where
        B: ?Sized + OverrideTarget + Send + Sync,
        D: Injectable,
        F: Fn(Arc<D>) -> Arc<B> + Send + Sync + 'static,
    {
        self.container.register_override::<B, D, F>(caster);
        self
    }

    /// Register an already-built instance as an override of base `B`.
    pub fn register_override_instance<B>(self, concrete: TypeKey, instance: Arc<B>) -> Self
    where
        B: ?Sized + OverrideTarget + Send + Sync,
    {
        self.container.register_override_instance(concrete, instance);
        self
    }

    /// Apply a [`Module`]'s registrations.
    pub fn module<M: Module>(self) -> Result<Self> {
        M::register(&self.container)?;
        Ok(self)
    }

    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config {
        port: u16,
    }

    #[test]
    fn builder_chains_registrations() {
        let container = ContainerBuilder::new()
            .register(Config { port: 8080 })
            .register_factory(|_| Ok(String::from("ready")))
            .build();
        assert_eq!(container.lookup::<Config>().unwrap().port, 8080);
    }

    #[test]
    fn module_registrations_land_in_the_container() {
        struct AppModule;

        impl Module for AppModule {
            fn register(container: &Container) -> Result<()> {
                container.register(Config { port: 9000 });
                Ok(())
            }
        }

        let container = ContainerBuilder::new()
            .module::<AppModule>()
            .unwrap()
            .build();
        assert_eq!(container.lookup::<Config>().unwrap().port, 9000);
    }
}
