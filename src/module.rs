use crate::container::Container;
use crate::error::Result;

/// A batch-registration unit: one place to register a related group of
/// providers and overrides.
///
/// # Example
/// ```
/// use spindle::prelude::*;
///
/// struct Port(u16);
///
/// struct NetModule;
///
/// impl Module for NetModule {
///     fn register(container: &Container) -> spindle::Result<()> {
///         container.register(Port(8080));
///         Ok(())
///     }
/// }
///
/// let container = ContainerBuilder::new().module::<NetModule>().unwrap().build();
/// assert_eq!(container.lookup::<Port>().unwrap().0, 8080);
/// ```
pub trait Module {
    /// Register all providers in this module.
    fn register(container: &Container) -> Result<()>;
}
