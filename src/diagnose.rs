//! Resolution diagnostics.
//!
//! [`diagnose`] answers "what would happen if I resolved `T` right now"
//! without resolving anything: it walks the same decision order the
//! container uses and reports the first branch that would be taken,
//! together with the standing of each declared dependency.

use std::fmt;

use crate::container::Container;
use crate::deduce::{AccessKind, Descriptor};
use crate::injectable::Injectable;
use crate::type_key::TypeKey;

/// The branch a `resolve` call would take, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Resolution of this type is already in flight on this container;
    /// resolving now would report a cycle.
    ResolutionInFlight,
    /// A cached single exists and would be returned as-is.
    CacheHit,
    /// Both an instance and a factory are registered; resolving would fail.
    AmbiguousProvider,
    /// A registered instance would be returned.
    RegisteredInstance,
    /// A registered factory would run.
    FactoryConstruction,
    /// Recursive injection would run, visiting the listed dependencies.
    RecursiveInjection,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Finding::ResolutionInFlight => "resolution already in flight (cycle)",
            Finding::CacheHit => "cached single would be returned",
            Finding::AmbiguousProvider => "instance and factory both registered (ambiguous)",
            Finding::RegisteredInstance => "registered instance would be returned",
            Finding::FactoryConstruction => "registered factory would run",
            Finding::RecursiveInjection => "recursive injection would run",
        };
        f.write_str(text)
    }
}

/// Standing of one declared dependency at diagnosis time.
#[derive(Debug, Clone)]
pub struct DependencyStanding {
    pub descriptor: Descriptor,
    pub present: bool,
}

impl DependencyStanding {
    /// Whether resolving the parent would have to construct this
    /// dependency first. Lazy dependencies never block construction.
    pub fn blocks_construction(&self) -> bool {
        !self.present && self.descriptor.kind() != AccessKind::Lazy
    }
}

/// Report produced by [`diagnose`].
#[derive(Debug, Clone)]
pub struct Diagnosis {
    key: TypeKey,
    cached_policy: bool,
    finding: Finding,
    dependencies: Vec<DependencyStanding>,
}

impl Diagnosis {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn finding(&self) -> &Finding {
        &self.finding
    }

    /// Whether the diagnosed type is cached once constructed.
    pub fn cached(&self) -> bool {
        self.cached_policy
    }

    pub fn dependencies(&self) -> &[DependencyStanding] {
        &self.dependencies
    }

    /// Dependencies that would be constructed on the spot.
    pub fn missing(&self) -> impl Iterator<Item = &DependencyStanding> {
        self.dependencies.iter().filter(|d| d.blocks_construction())
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "diagnosis for {}", self.key)?;
        writeln!(
            f,
            "  policy: {}",
            if self.cached_policy { "cached" } else { "transient" }
        )?;
        writeln!(f, "  outcome: {}", self.finding)?;
        if self.dependencies.is_empty() {
            writeln!(f, "  dependencies: none declared")?;
        } else {
            writeln!(f, "  dependencies:")?;
            for dep in &self.dependencies {
                writeln!(
                    f,
                    "    {} — {}",
                    dep.descriptor,
                    if dep.present {
                        "present"
                    } else if dep.descriptor.kind() == AccessKind::Lazy {
                        "deferred"
                    } else {
                        "would be constructed"
                    }
                )?;
            }
        }
        Ok(())
    }
}

/// Inspect how `T` stands in `container` without resolving it.
pub fn diagnose<T: Injectable>(container: &Container) -> Diagnosis {
    let key = TypeKey::of::<T>();
    let id = key.id();

    let finding = if container.is_resolving(id) {
        Finding::ResolutionInFlight
    } else if T::CACHED && container.has_cached(id) {
        Finding::CacheHit
    } else if container.has_instance(id) && container.has_factory(id) {
        Finding::AmbiguousProvider
    } else if container.has_instance(id) {
        Finding::RegisteredInstance
    } else if container.has_factory(id) {
        Finding::FactoryConstruction
    } else {
        Finding::RecursiveInjection
    };

    let dependencies = T::dependencies()
        .into_iter()
        .map(|descriptor| {
            let dep_id = descriptor.key().id();
            let present = container.has_cached(dep_id)
                || container.has_instance(dep_id)
                || container.has_factory(dep_id);
            DependencyStanding {
                descriptor,
                present,
            }
        })
        .collect();

    Diagnosis {
        key,
        cached_policy: T::CACHED,
        finding,
        dependencies,
    }
}

/// Overview of a container's override registry: each base type together
/// with the concrete types standing in for it, in registration order.
pub fn override_report(container: &Container) -> Vec<(TypeKey, Vec<TypeKey>)> {
    container
        .known_override_bases()
        .into_iter()
        .map(|base| {
            let concretes = container.override_concretes(base.id());
            (base, concretes)
        })
        .collect()
}

/// Keys of every cached single, for teardown-order inspection and tests.
pub fn cached_report(container: &Container) -> Vec<TypeKey> {
    container.cached_keys()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct Standalone;

    impl Injectable for Standalone {
        const EMPTY_INJECTABLE: bool = true;

        fn inject(_container: &Container) -> Result<Self> {
            Ok(Standalone)
        }
    }

    struct Dependent;

    impl Injectable for Dependent {
        fn inject(container: &Container) -> Result<Self> {
            container.resolve::<Standalone>()?;
            Ok(Dependent)
        }

        fn dependencies() -> Vec<Descriptor> {
            vec![Descriptor::shared::<Standalone>()]
        }
    }

    #[test]
    fn unregistered_type_diagnoses_as_injection() {
        let container = Container::new();
        let report = diagnose::<Standalone>(&container);
        assert_eq!(*report.finding(), Finding::RecursiveInjection);
        assert!(report.cached());
    }

    #[test]
    fn cached_single_diagnoses_as_cache_hit() {
        let container = Container::new();
        container.resolve::<Standalone>().unwrap();
        let report = diagnose::<Standalone>(&container);
        assert_eq!(*report.finding(), Finding::CacheHit);
    }

    #[test]
    fn missing_dependencies_are_reported() {
        let container = Container::new();
        let report = diagnose::<Dependent>(&container);
        assert_eq!(report.missing().count(), 1);

        container.resolve::<Standalone>().unwrap();
        let report = diagnose::<Dependent>(&container);
        assert_eq!(report.missing().count(), 0);
    }

    #[test]
    fn report_renders_each_dependency() {
        let container = Container::new();
        let rendered = diagnose::<Dependent>(&container).to_string();
        assert!(rendered.contains("would be constructed"));
    }

    #[test]
    fn reports_enumerate_registry_state() {
        use std::sync::Arc;

        use crate::container::OverrideTarget;

        trait Greeter: Send + Sync {}
        impl OverrideTarget for dyn Greeter {}
        impl Greeter for Standalone {}

        let container = Container::new();
        container.resolve::<Standalone>().unwrap();
        container.register_override::<dyn Greeter, Standalone, _>(|s| s as Arc<dyn Greeter>);

        assert_eq!(cached_report(&container), vec![TypeKey::of::<Standalone>()]);
        let overrides = override_report(&container);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].0, TypeKey::of::<dyn Greeter>());
        assert_eq!(overrides[0].1, vec![TypeKey::of::<Standalone>()]);
    }
}
