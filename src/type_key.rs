use std::any::{TypeId, type_name};
use std::fmt;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Identity of a `'static` type, as seen by the container.
///
/// The [`TypeId`] is the authoritative map key; the compiler type name rides
/// along for error messages and diagnostics. [`TypeKey::stable_hash`] derives
/// a 64-bit FNV-1a hash from a normalized form of the name, which is
/// reproducible within one compiler but only best-effort stable across
/// compilers or compiler versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler-generated type name, unnormalized.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A 64-bit hash of the normalized type name.
    ///
    /// Identical types always hash identically; distinct types collide only
    /// with overwhelming improbability. Intended for display and external
    /// correlation, not as the lookup key.
    pub fn stable_hash(&self) -> u64 {
        stable_type_hash(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:016x}", self.name, self.stable_hash())
    }
}

/// FNV-1a over the normalized type name.
///
/// Normalization strips a leading `dyn ` and collapses ASCII whitespace so
/// that formatting differences between compiler versions do not perturb the
/// hash. Usable in `const` contexts.
pub const fn stable_type_hash(raw: &str) -> u64 {
    let bytes = raw.as_bytes();
    let mut i = 0;

    // Skip a leading "dyn " so a trait object and its bare-path spelling agree.
    if bytes.len() >= 4
        && bytes[0] == b'd'
        && bytes[1] == b'y'
        && bytes[2] == b'n'
        && bytes[3] == b' '
    {
        i = 4;
    }

    let mut hash = FNV_OFFSET;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b' ' && b != b'\t' && b != b'\n' {
            hash ^= b as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    struct Alpha;
    struct Beta;

    #[test]
    fn identical_types_share_identity() {
        assert_eq!(TypeKey::of::<Alpha>(), TypeKey::of::<Alpha>());
        assert_eq!(
            TypeKey::of::<Alpha>().stable_hash(),
            TypeKey::of::<Alpha>().stable_hash()
        );
    }

    #[test]
    fn distinct_types_have_distinct_identity() {
        assert_ne!(TypeKey::of::<Alpha>(), TypeKey::of::<Beta>());
        assert_ne!(
            TypeKey::of::<Alpha>().stable_hash(),
            TypeKey::of::<Beta>().stable_hash()
        );
    }

    #[test]
    fn hash_is_const_evaluable() {
        const H: u64 = stable_type_hash("spindle::Alpha");
        assert_eq!(H, stable_type_hash("spindle::Alpha"));
    }

    #[test]
    fn normalization_ignores_dyn_prefix_and_spaces() {
        assert_eq!(
            stable_type_hash("dyn my::Trait"),
            stable_type_hash("my::Trait")
        );
        assert_eq!(
            stable_type_hash("Map<String, u32>"),
            stable_type_hash("Map<String,u32>")
        );
    }

    #[test]
    fn trait_objects_are_keyable() {
        let key = TypeKey::of::<dyn Marker>();
        assert_eq!(key.id(), TypeId::of::<dyn Marker>());
    }
}
