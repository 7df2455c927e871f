use std::sync::Arc;

use crate::compose::ProvideAt;

/// The one capability a source must have: produce a value of type `T`.
///
/// A type `S` is a source of `T` exactly when `S: Provide<T>`. There is no
/// runtime registry behind this; satisfiability is the trait bound itself,
/// so an unsatisfiable request fails to compile rather than erroring at
/// run time.
///
/// Sources take `&mut self` because providing may be stateful (a counter
/// source handing out `0, 1, 2, ...` is the canonical example).
pub trait Provide<T> {
    fn provide(&mut self) -> T;
}

/// Request a value of type `T` from a source or source composition.
///
/// The `I` parameter is the dispatch index into the composition and is
/// inferred at the call site. If no part of the composition can provide `T`
/// the call does not compile; if more than one part can, index inference is
/// ambiguous and the call does not compile either.
///
/// ```
/// use spindle::source::{Func, provide};
///
/// let mut counter = {
///     let mut n = 0u32;
///     Func::new(move || {
///         let v = n;
///         n += 1;
///         v
///     })
/// };
/// assert_eq!(provide::<u32, _, _>(&mut counter), 0);
/// assert_eq!(provide::<u32, _, _>(&mut counter), 1);
/// ```
pub fn provide<T, I, S>(source: &mut S) -> T
where
    S: ProvideAt<T, I> + ?Sized,
{
    source.provide_at()
}

/// Owning value source: provides clones of a held value.
#[derive(Debug, Clone)]
pub struct Object<T> {
    value: T,
}

impl<T> Object<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Clone> Provide<T> for Object<T> {
    fn provide(&mut self) -> T {
        self.value.clone()
    }
}

/// Provider-function source. Wraps any `FnMut() -> T`, which makes it the
/// building block for stateful providers.
pub struct Func<F> {
    f: F,
}

impl<F> Func<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F: FnMut() -> T> Provide<T> for Func<F> {
    fn provide(&mut self) -> T {
        (self.f)()
    }
}

/// Shared-handle source: provides `Arc<T>` clones of one externally owned
/// instance. This is the reference-source form — the source does not own a
/// private copy of the value, it aliases one that outlives any single
/// request.
#[derive(Debug)]
pub struct Shared<T: ?Sized> {
    handle: Arc<T>,
}

impl<T: ?Sized> Shared<T> {
    pub fn new(handle: Arc<T>) -> Self {
        Self { handle }
    }

    pub fn of(value: T) -> Self
    where
        T: Sized,
    {
        Self {
            handle: Arc::new(value),
        }
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<T: ?Sized> Provide<Arc<T>> for Shared<T> {
    fn provide(&mut self) -> Arc<T> {
        Arc::clone(&self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_provides_clones() {
        let mut source = Object::new(String::from("ready"));
        let a: String = source.provide();
        let b: String = source.provide();
        assert_eq!(a, "ready");
        assert_eq!(b, "ready");
    }

    #[test]
    fn func_source_is_stateful() {
        let mut n = 0;
        let mut source = Func::new(move || {
            let v = n;
            n += 1;
            v
        });
        assert_eq!(provide::<i32, _, _>(&mut source), 0);
        assert_eq!(provide::<i32, _, _>(&mut source), 1);
        assert_eq!(provide::<i32, _, _>(&mut source), 2);
    }

    #[test]
    fn shared_provides_aliases_of_one_instance() {
        let mut source = Shared::of(42u64);
        let a: Arc<u64> = source.provide();
        let b: Arc<u64> = source.provide();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
