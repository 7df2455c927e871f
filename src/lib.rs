//! # Spindle
//!
//! A dependency injection library for Rust with a fully typed wiring layer.
//!
//! Spindle has two layers. The wiring layer ([`source`], [`compose`],
//! [`deduce`], [`inject`]) settles at compile time which value feeds which
//! constructor parameter: a composition of sources either provides each
//! requested type through exactly one child, or the program does not
//! compile. The container layer ([`container`], [`injectable`]) adds the
//! runtime conveniences a real application wants on top: per-container
//! single instances, factories, overrides of trait bases, forking, and
//! deterministic reverse-order teardown.
//!
//! ## Features
//!
//! - **Typed composition**: ambiguous or missing providers are compile errors
//! - **Recursive injection**: `#[derive(Injectable)]` resolves fields from the container
//! - **Trait overrides**: resolve `Arc<dyn Trait>` through registered concrete services
//! - **Container forking**: snapshot a container, then let both sides diverge
//! - **Deterministic teardown**: constructed singles drop in reverse order
//!
//! ## Quick Start
//!
//! ```rust
//! use spindle::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Default, Injectable)]
//! #[injectable(defaultable)]
//! struct Config {
//!     url: String,
//! }
//!
//! #[derive(Injectable)]
//! struct Repository {
//!     config: Arc<Config>,
//! }
//!
//! #[derive(Injectable)]
//! struct UserService {
//!     repository: Arc<Repository>,
//! }
//!
//! let container = Container::new();
//! let service = container.resolve::<UserService>().unwrap();
//! let again = container.resolve::<UserService>().unwrap();
//! assert!(Arc::ptr_eq(&service, &again));
//! assert!(Arc::ptr_eq(&service.repository, &again.repository));
//! ```

pub mod compose;
pub mod container;
pub mod deduce;
pub mod diagnose;
pub mod error;
pub mod inject;
pub mod injectable;
pub mod lazy;
pub mod module;
pub mod source;
pub mod type_key;

// Re-export core types
pub use container::{Container, ContainerBuilder, ContainerHandle, OverrideTarget};
pub use deduce::{AccessKind, Deducer, Descriptor};
pub use error::{Result, SpindleError};
pub use inject::{construct, construct_chained, construct_spread, Callable, Synthesize};
pub use injectable::Injectable;
pub use lazy::Lazy;
pub use module::Module;
pub use source::{provide, Func, Object, Provide, Shared};
pub use type_key::TypeKey;

// Re-export macros
pub use spindle_macro::Injectable as DeriveInjectable;

/// Prelude module for convenient imports
///
/// ```
/// use spindle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::compose::{Cons, Nil, ProvideAt};
    pub use crate::container::{Container, ContainerBuilder, OverrideTarget};
    pub use crate::deduce::{AccessKind, Deducer, Descriptor};
    pub use crate::diagnose::{diagnose, Diagnosis, Finding};
    pub use crate::error::{Result, SpindleError};
    pub use crate::inject::{construct, construct_spread, Synthesize};
    pub use crate::lazy::Lazy;
    pub use crate::module::Module;
    pub use crate::source::{provide, Func, Object, Provide, Shared};
    pub use crate::type_key::TypeKey;
    pub use crate::DeriveInjectable as Injectable;
    pub use crate::compound;
    pub use std::sync::Arc;
}
