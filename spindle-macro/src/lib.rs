use proc_macro::TokenStream;

mod injectable;

/// Derive macro for making a struct constructible by the container.
///
/// Each field is resolved from the container in declaration order. The
/// field's type decides the delivery form: `Arc<T>` resolves the cached
/// single, `Arc<dyn Trait>` resolves the most recent override of the
/// trait, `Lazy<T>` defers resolution to first use, and a plain `T` is
/// constructed fresh.
///
/// # Example
/// ```ignore
/// use spindle::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     config: Arc<Config>,
/// }
/// ```
///
/// # Attributes
/// - `#[injectable(transient)]` — a fresh instance per resolution instead
///   of one cached single per container.
/// - `#[injectable(defaultable)]` — construct via `Default` with no
///   injected dependencies. Without this, a struct with no fields refuses
///   to construct.
/// - `#[injectable(implements(Trait, ...))]` — once constructed and
///   cached, register the instance as an override of each listed trait.
#[proc_macro_derive(Injectable, attributes(injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
