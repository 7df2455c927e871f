//! Resolution-cycle detection.
//!
//! Every resolution entry pushes the requested type onto a per-container
//! stack; re-entering a type that is already on the stack means the
//! dependency graph is cyclic, and the error carries the full
//! `A -> B -> A` path. A depth cap backstops pathological chains that never
//! literally repeat a type.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, SpindleError};
use crate::type_key::TypeKey;

/// Maximum resolution depth before giving up on a chain.
const MAX_RESOLUTION_DEPTH: usize = 100;

#[derive(Default)]
struct StackState {
    /// Types currently being resolved; O(1) membership.
    in_flight: HashSet<TypeId>,
    /// Resolution path, for rendering the cycle in errors.
    path: Vec<TypeKey>,
}

#[derive(Default)]
pub(crate) struct ResolutionStack {
    state: Mutex<StackState>,
}

impl ResolutionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the start of a resolution of `key`.
    ///
    /// The returned guard pops the entry when dropped, so early returns and
    /// error paths unwind the stack correctly.
    pub(crate) fn begin(&self, key: TypeKey) -> Result<ResolutionGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.path.len() >= MAX_RESOLUTION_DEPTH {
            return Err(SpindleError::DepthExceeded {
                depth: state.path.len(),
                type_name: key.name().to_string(),
            });
        }

        if state.in_flight.contains(&key.id()) {
            let cycle = render_cycle(&state.path, key);
            tracing::debug!("resolution cycle detected: {}", cycle);
            return Err(SpindleError::CircularDependency { cycle });
        }

        state.in_flight.insert(key.id());
        state.path.push(key);
        Ok(ResolutionGuard { stack: self, key })
    }

    /// Whether `id` is currently being resolved.
    pub(crate) fn is_resolving(&self, id: TypeId) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .contains(&id)
    }
}

fn render_cycle(path: &[TypeKey], repeated: TypeKey) -> String {
    let start = path
        .iter()
        .position(|k| k.id() == repeated.id())
        .unwrap_or(0);
    let mut names: Vec<&str> = path[start..].iter().map(|k| k.name()).collect();
    names.push(repeated.name());
    names.join(" -> ")
}

/// RAII guard: pops the tracked type when resolution finishes.
pub(crate) struct ResolutionGuard<'a> {
    stack: &'a ResolutionStack,
    key: TypeKey,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .stack
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.in_flight.remove(&self.key.id());
        if let Some(pos) = state.path.iter().rposition(|k| k.id() == self.key.id()) {
            state.path.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TypeA;
    struct TypeB;
    struct TypeC;

    #[test]
    fn re_entering_a_tracked_type_is_a_cycle() {
        let stack = ResolutionStack::new();
        let guard = stack.begin(TypeKey::of::<TypeA>()).unwrap();

        let result = stack.begin(TypeKey::of::<TypeA>());
        assert!(matches!(
            result,
            Err(SpindleError::CircularDependency { .. })
        ));

        drop(guard);
        assert!(stack.begin(TypeKey::of::<TypeA>()).is_ok());
    }

    #[test]
    fn cycle_error_renders_the_full_path() {
        let stack = ResolutionStack::new();
        let _a = stack.begin(TypeKey::of::<TypeA>()).unwrap();
        let _b = stack.begin(TypeKey::of::<TypeB>()).unwrap();
        let _c = stack.begin(TypeKey::of::<TypeC>()).unwrap();

        match stack.begin(TypeKey::of::<TypeA>()) {
            Err(SpindleError::CircularDependency { cycle }) => {
                assert!(cycle.contains("TypeA"));
                assert!(cycle.contains("TypeB"));
                assert!(cycle.contains("TypeC"));
                assert_eq!(cycle.matches("TypeA").count(), 2);
                assert_eq!(cycle.matches(" -> ").count(), 3);
            }
            other => panic!("expected CircularDependency, got {:?}", other.err()),
        }
    }

    #[test]
    fn guards_unwind_in_any_order() {
        let stack = ResolutionStack::new();
        let a = stack.begin(TypeKey::of::<TypeA>()).unwrap();
        let b = stack.begin(TypeKey::of::<TypeB>()).unwrap();
        drop(a);
        drop(b);
        assert!(!stack.is_resolving(TypeKey::of::<TypeA>().id()));
        assert!(!stack.is_resolving(TypeKey::of::<TypeB>().id()));
    }

    #[test]
    fn depth_cap_stops_unbounded_chains() {
        let stack = ResolutionStack::new();
        let mut guards = Vec::new();
        // Distinct keys per level; array types give unique TypeIds cheaply.
        macro_rules! level {
            ($($n:literal),*) => {
                $(guards.push(stack.begin(TypeKey::of::<[u8; $n]>()).unwrap());)*
            };
        }
        level!(
            0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22,
            23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43,
            44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64,
            65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85,
            86, 87, 88, 89, 90, 91, 92, 93, 94, 95, 96, 97, 98, 99
        );
        assert_eq!(guards.len(), 100);
        let result = stack.begin(TypeKey::of::<[u8; 200]>());
        assert!(matches!(result, Err(SpindleError::DepthExceeded { .. })));
    }
}
