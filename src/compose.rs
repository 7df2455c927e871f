//! Source composition.
//!
//! Sources compose into heterogeneous lists ([`Cons`]/[`Nil`], usually built
//! with the [`compound!`](crate::compound) macro). A request for `T` against
//! a compound source dispatches to whichever *exactly one* child can provide
//! `T`. Dispatch is resolved through [`ProvideAt`], whose index parameter is
//! inferred at the call site:
//!
//! - no child provides `T` — there is no impl, the request does not compile;
//! - two children provide `T` — two indices fit, inference is ambiguous and
//!   the request does not compile.
//!
//! Neither case is a runtime error, and neither is ever resolved by implicit
//! priority. Explicit priority between two sources goes through
//! [`construct_chained`](crate::inject::construct_chained).

use std::marker::PhantomData;

use crate::source::Provide;

/// Index-typed provider dispatch. `Index` encodes *where* in a composition
/// the provider of `T` sits; the compiler infers it, and a unique inference
/// solution is what "exactly one child matches" means here.
pub trait ProvideAt<T, Index> {
    fn provide_at(&mut self) -> T;
}

/// Index: the source itself provides `T` through its own [`Provide`] impl.
pub struct Direct;

/// Index: the head of a [`Cons`] provides `T`.
pub struct Here;

/// Index: the provider of `T` sits somewhere in the tail of a [`Cons`].
pub struct There<I>(PhantomData<I>);

/// Index: a wrapping source delegates the request verbatim to its inner
/// source.
pub struct Inner<I>(PhantomData<I>);

impl<T, S: Provide<T>> ProvideAt<T, Direct> for S {
    fn provide_at(&mut self) -> T {
        self.provide()
    }
}

/// Empty compound source. Provides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nil;

/// A compound source: a head source plus the rest of the list.
#[derive(Debug, Clone)]
pub struct Cons<H, R>(pub H, pub R);

impl<T, H: Provide<T>, R> ProvideAt<T, Here> for Cons<H, R> {
    fn provide_at(&mut self) -> T {
        self.0.provide()
    }
}

impl<T, H, R, I> ProvideAt<T, There<I>> for Cons<H, R>
where
    R: ProvideAt<T, I>,
{
    fn provide_at(&mut self) -> T {
        self.1.provide_at()
    }
}

/// Build a compound source from a list of sources.
///
/// ```
/// use spindle::compound;
/// use spindle::source::{Func, Object, provide};
///
/// let mut source = compound![Object::new(7u32), Func::new(|| String::from("eight"))];
/// assert_eq!(provide::<u32, _, _>(&mut source), 7);
/// assert_eq!(provide::<String, _, _>(&mut source), "eight");
/// ```
#[macro_export]
macro_rules! compound {
    [] => { $crate::compose::Nil };
    [$head:expr $(, $rest:expr)* $(,)?] => {
        $crate::compose::Cons($head, $crate::compound![$($rest),*])
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::source::{Func, Object, Shared, provide};

    #[test]
    fn dispatches_to_the_only_matching_child() {
        let mut source = compound![
            Object::new(1u8),
            Object::new(String::from("two")),
            Shared::of(3i64),
        ];
        assert_eq!(provide::<u8, _, _>(&mut source), 1);
        assert_eq!(provide::<String, _, _>(&mut source), "two");
        assert_eq!(*provide::<Arc<i64>, _, _>(&mut source), 3);
    }

    #[test]
    fn leaf_sources_answer_directly() {
        let mut leaf = Func::new(|| 9usize);
        assert_eq!(provide::<usize, _, _>(&mut leaf), 9);
    }

    #[test]
    fn single_child_compound_behaves_like_the_child() {
        let mut source = compound![Func::new(|| 3.5f64)];
        assert_eq!(provide::<f64, _, _>(&mut source), 3.5);
    }
}
