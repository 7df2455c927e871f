//! Injectors: drive a constructor against a source.
//!
//! An injector takes a callable (typically a constructor function) and
//! supplies every parameter by deduction against a bound source, strictly
//! left to right — construction order is observable when sources are
//! stateful, so arguments are always bound as sequential `let`s, never as a
//! tuple expression.
//!
//! Three strategies:
//!
//! - [`construct`] — *simple*: one deducer serves every parameter slot.
//! - [`construct_spread`] — *spread*: a distinct deducer per slot.
//! - [`construct_chained`] — *chained*: the leading parameters are claimed
//!   from a first source and the remainder from a second. This is the only
//!   sanctioned way to give one source priority over another; plain
//!   composition treats an overlap as an ambiguity error.
//!
//! A callable with a parameter no source can provide simply has no
//! [`Callable`] impl: the candidate is removed from consideration at
//! compile time, and invoking the injector with it is a compile error.

use crate::compose::{Inner, ProvideAt};
use crate::deduce::Deducer;
use crate::source::Provide;

/// A callable whose every parameter is providable from source `S`.
///
/// Implemented for `FnOnce` of arities 0 through 8. `Args` is the parameter
/// tuple; `Indices` is the per-slot dispatch index tuple, inferred at the
/// call site.
pub trait Callable<S: ?Sized, Args, Indices> {
    type Output;

    /// Invoke with a single deducer shared by every parameter slot.
    fn call_with(self, source: &mut S) -> Self::Output;

    /// Invoke with a fresh deducer instance per parameter slot.
    fn call_spread(self, source: &mut S) -> Self::Output;
}

impl<Src: ?Sized, Fun, Ret> Callable<Src, (), ()> for Fun
where
    Fun: FnOnce() -> Ret,
{
    type Output = Ret;

    fn call_with(self, _source: &mut Src) -> Ret {
        self()
    }

    fn call_spread(self, _source: &mut Src) -> Ret {
        self()
    }
}

macro_rules! impl_callable {
    ($(($Ty:ident, $bind:ident, $Ix:ident)),+) => {
        impl<Src: ?Sized, Fun, Ret, $($Ty, $Ix),+> Callable<Src, ($($Ty,)+), ($($Ix,)+)> for Fun
        where
            Fun: FnOnce($($Ty),+) -> Ret,
            $(Src: ProvideAt<$Ty, $Ix>,)+
        {
            type Output = Ret;

            fn call_with(self, source: &mut Src) -> Ret {
                let mut deducer = Deducer::new(source);
                $(let $bind: $Ty = deducer.deduce();)+
                self($($bind),+)
            }

            fn call_spread(self, source: &mut Src) -> Ret {
                $(let $bind: $Ty = Deducer::new(&mut *source).deduce();)+
                self($($bind),+)
            }
        }
    };
}

impl_callable!((A1, a1, X1));
impl_callable!((A1, a1, X1), (A2, a2, X2));
impl_callable!((A1, a1, X1), (A2, a2, X2), (A3, a3, X3));
impl_callable!((A1, a1, X1), (A2, a2, X2), (A3, a3, X3), (A4, a4, X4));
impl_callable!(
    (A1, a1, X1),
    (A2, a2, X2),
    (A3, a3, X3),
    (A4, a4, X4),
    (A5, a5, X5)
);
impl_callable!(
    (A1, a1, X1),
    (A2, a2, X2),
    (A3, a3, X3),
    (A4, a4, X4),
    (A5, a5, X5),
    (A6, a6, X6)
);
impl_callable!(
    (A1, a1, X1),
    (A2, a2, X2),
    (A3, a3, X3),
    (A4, a4, X4),
    (A5, a5, X5),
    (A6, a6, X6),
    (A7, a7, X7)
);
impl_callable!(
    (A1, a1, X1),
    (A2, a2, X2),
    (A3, a3, X3),
    (A4, a4, X4),
    (A5, a5, X5),
    (A6, a6, X6),
    (A7, a7, X7),
    (A8, a8, X8)
);

/// Call `constructor` with every parameter deduced from `source`, left to
/// right, through one shared deducer.
///
/// ```
/// use spindle::compound;
/// use spindle::inject::construct;
/// use spindle::source::Object;
///
/// struct Engine { power: u32, label: String }
///
/// fn engine(power: u32, label: String) -> Engine {
///     Engine { power, label }
/// }
///
/// let mut source = compound![Object::new(90u32), Object::new(String::from("flat-four"))];
/// let built = construct(&mut source, engine);
/// assert_eq!(built.power, 90);
/// assert_eq!(built.label, "flat-four");
/// ```
pub fn construct<Args, Ix, S: ?Sized, F>(source: &mut S, constructor: F) -> F::Output
where
    F: Callable<S, Args, Ix>,
{
    constructor.call_with(source)
}

/// Call `constructor` with a distinct deducer instance per parameter slot.
///
/// Observable behavior matches [`construct`]; the strategies are kept
/// separate because per-slot independence is part of the injector
/// architecture and custom `Callable` impls may distinguish them.
pub fn construct_spread<Args, Ix, S: ?Sized, F>(source: &mut S, constructor: F) -> F::Output
where
    F: Callable<S, Args, Ix>,
{
    constructor.call_spread(source)
}

/// A callable split across two sources: leading parameters from the first,
/// the rest from the second.
///
/// Implemented for splits of total arity up to 4. The split is part of the
/// trait instantiation, so when both sources could provide the same
/// parameter type the caller must name the split — priority is always
/// explicit, never silently inferred.
pub trait ChainCallable<P: ?Sized, S: ?Sized, Pre, Post, PreIx, PostIx> {
    type Output;

    fn call_chained(self, first: &mut P, second: &mut S) -> Self::Output;
}

macro_rules! impl_chain {
    ([$(($PT:ident, $pb:ident, $PI:ident)),*], [$(($ST:ident, $sb:ident, $SI:ident)),*]) => {
        impl<First: ?Sized, Second: ?Sized, Fun, Ret $(, $PT, $PI)* $(, $ST, $SI)*>
            ChainCallable<First, Second, ($($PT,)*), ($($ST,)*), ($($PI,)*), ($($SI,)*)> for Fun
        where
            Fun: FnOnce($($PT,)* $($ST),*) -> Ret,
            $(First: ProvideAt<$PT, $PI>,)*
            $(Second: ProvideAt<$ST, $SI>,)*
        {
            type Output = Ret;

            fn call_chained(self, _first: &mut First, _second: &mut Second) -> Ret {
                $(let $pb: $PT = Deducer::new(&mut *_first).deduce();)*
                $(let $sb: $ST = Deducer::new(&mut *_second).deduce();)*
                self($($pb,)* $($sb),*)
            }
        }
    };
}

impl_chain!([], []);
impl_chain!([(A1, a1, X1)], []);
impl_chain!([], [(B1, b1, Y1)]);
impl_chain!([(A1, a1, X1), (A2, a2, X2)], []);
impl_chain!([(A1, a1, X1)], [(B1, b1, Y1)]);
impl_chain!([], [(B1, b1, Y1), (B2, b2, Y2)]);
impl_chain!([(A1, a1, X1), (A2, a2, X2), (A3, a3, X3)], []);
impl_chain!([(A1, a1, X1), (A2, a2, X2)], [(B1, b1, Y1)]);
impl_chain!([(A1, a1, X1)], [(B1, b1, Y1), (B2, b2, Y2)]);
impl_chain!([], [(B1, b1, Y1), (B2, b2, Y2), (B3, b3, Y3)]);
impl_chain!(
    [(A1, a1, X1), (A2, a2, X2), (A3, a3, X3), (A4, a4, X4)],
    []
);
impl_chain!(
    [(A1, a1, X1), (A2, a2, X2), (A3, a3, X3)],
    [(B1, b1, Y1)]
);
impl_chain!(
    [(A1, a1, X1), (A2, a2, X2)],
    [(B1, b1, Y1), (B2, b2, Y2)]
);
impl_chain!(
    [(A1, a1, X1)],
    [(B1, b1, Y1), (B2, b2, Y2), (B3, b3, Y3)]
);
impl_chain!(
    [],
    [(B1, b1, Y1), (B2, b2, Y2), (B3, b3, Y3), (B4, b4, Y4)]
);

/// Call `constructor` with its leading parameters deduced from `first` and
/// the remainder from `second` — first-injector-wins, resolved left to
/// right within each group.
pub fn construct_chained<Pre, Post, PreIx, PostIx, First: ?Sized, Second: ?Sized, F>(
    first: &mut First,
    second: &mut Second,
    constructor: F,
) -> F::Output
where
    F: ChainCallable<First, Second, Pre, Post, PreIx, PostIx>,
{
    constructor.call_chained(first, second)
}

/// Recursive construction source: a wrapping source whose own `provide`
/// builds a value against the inner source, while requests it does not
/// handle itself delegate verbatim to the inner source.
///
/// Nesting `Synthesize` values gives recursive construction — each level's
/// build closure may itself call [`construct`] against the level below —
/// with termination guaranteed structurally, because every level is a
/// distinct, finite value rather than an unbounded re-entry.
pub struct Synthesize<F, S> {
    build: F,
    inner: S,
}

impl<F, S> Synthesize<F, S> {
    pub fn new(build: F, inner: S) -> Self {
        Self { build, inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<T, F, S> Provide<T> for Synthesize<F, S>
where
    F: FnMut(&mut S) -> T,
{
    fn provide(&mut self) -> T {
        (self.build)(&mut self.inner)
    }
}

impl<T, F, S, I> ProvideAt<T, Inner<I>> for Synthesize<F, S>
where
    S: ProvideAt<T, I>,
{
    fn provide_at(&mut self) -> T {
        self.inner.provide_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound;
    use crate::source::{Func, Object, provide};

    #[derive(Debug, PartialEq, Clone)]
    struct Engine {
        power: u32,
    }

    fn engine(power: u32) -> Engine {
        Engine { power }
    }

    #[derive(Debug, PartialEq)]
    struct Car {
        engine: Engine,
        name: String,
    }

    fn car(engine: Engine, name: String) -> Car {
        Car { engine, name }
    }

    #[test]
    fn constructs_with_deduced_arguments() {
        let mut source = compound![
            Object::new(Engine { power: 110 }),
            Object::new(String::from("wagon"))
        ];
        let built = construct(&mut source, car);
        assert_eq!(built.engine, Engine { power: 110 });
        assert_eq!(built.name, "wagon");
    }

    #[test]
    fn zero_arity_callables_need_nothing_from_the_source() {
        let mut source = compound![];
        let built = construct(&mut source, || 7i32);
        assert_eq!(built, 7);
    }

    #[test]
    fn arguments_bind_left_to_right() {
        fn pair(a: u32, b: u32) -> (u32, u32) {
            (a, b)
        }

        let mut n = 0u32;
        let mut source = Func::new(move || {
            let v = n;
            n += 1;
            v
        });
        let first = construct(&mut source, pair);
        assert_eq!(first, (0, 1));
        // Further top-level requests keep incrementing, never reset.
        let second = construct(&mut source, pair);
        assert_eq!(second, (2, 3));
    }

    #[test]
    fn spread_injection_matches_simple_injection() {
        fn pair(a: u32, b: u32) -> (u32, u32) {
            (a, b)
        }

        let mut n = 0u32;
        let mut source = Func::new(move || {
            let v = n;
            n += 1;
            v
        });
        assert_eq!(construct_spread(&mut source, pair), (0, 1));
    }

    #[test]
    fn chained_injection_claims_prefix_from_first_source() {
        fn tagged(a: u32, b: u32) -> (u32, u32) {
            (a, b)
        }

        let mut first = Object::new(1u32);
        let mut second = Object::new(2u32);
        // Both sources provide u32, so the split is named explicitly.
        let got = construct_chained::<(u32,), (u32,), _, _, _, _, _>(
            &mut first,
            &mut second,
            tagged,
        );
        assert_eq!(got, (1, 2));
    }

    type Leaf = crate::compose::Cons<
        Object<u32>,
        crate::compose::Cons<Object<String>, crate::compose::Nil>,
    >;

    #[test]
    fn synthesize_builds_against_its_inner_source() {
        let leaf: Leaf = compound![Object::new(95u32), Object::new(String::from("boxer"))];
        let mut engines = Synthesize::new(|s: &mut Leaf| construct(s, engine), leaf);
        let built: Engine = engines.provide();
        assert_eq!(built, Engine { power: 95 });
    }

    #[test]
    fn synthesize_nests_for_recursive_construction() {
        let leaf: Leaf = compound![Object::new(130u32), Object::new(String::from("kombi"))];
        let engines = Synthesize::new(|s: &mut Leaf| construct(s, engine), leaf);
        let mut cars = Synthesize::new(
            |s: &mut Synthesize<_, Leaf>| construct(s, car),
            engines,
        );
        let built: Car = cars.provide();
        assert_eq!(built.engine, Engine { power: 130 });
        assert_eq!(built.name, "kombi");
    }

    #[test]
    fn synthesize_delegates_unhandled_requests_inward() {
        let leaf: Leaf = compound![Object::new(42u32), Object::new(String::from("pass-through"))];
        let mut engines = Synthesize::new(|s: &mut Leaf| construct(s, engine), leaf);
        let s: String = provide::<String, _, _>(&mut engines);
        assert_eq!(s, "pass-through");
    }
}
