//! Interned names for declarations, modules, and synthesized symbols.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name of a node in the lowered tree.
///
/// Module names, wire names, package-qualified names (`pkg::WIDTH`) and
/// synthesized names (`loop3::temp`, `$paramod\M\W=32'd8`) all share the same
/// interner, so comparing two names is a single `u32` comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw `u32` index.
    ///
    /// Intended for deserialization and tests; regular code goes through
    /// [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which always fits in a `usize` on supported
// targets, and `try_from_usize` rejects values that do not fit in a `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// String interner backed by [`lasso::ThreadedRodeo`].
///
/// The empty string is interned eagerly so that unnamed nodes (anonymous
/// blocks, constants) can carry [`Interner::empty`] without a lookup.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
    empty: Ident,
}

impl Interner {
    /// Creates a new interner containing only the empty string.
    pub fn new() -> Self {
        let rodeo = ThreadedRodeo::new();
        let empty = rodeo.get_or_intern("");
        Self { rodeo, empty }
    }

    /// Interns a string, returning its [`Ident`].
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Returns the identifier of an already-interned string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// The identifier of the empty string.
    pub fn empty(&self) -> Ident {
        self.empty
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Always `false`: the empty string is interned on construction.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("pkg::WIDTH");
        assert_eq!(interner.resolve(id), "pkg::WIDTH");
    }

    #[test]
    fn same_string_same_ident() {
        let interner = Interner::new();
        let a = interner.get_or_intern("loop0::i");
        let b = interner.get_or_intern("loop0::i");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_is_preinterned() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(interner.empty()), "");
        assert_eq!(interner.get(""), Some(interner.empty()));
        assert_eq!(interner.len(), 1);
        assert!(!interner.is_empty());
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        assert_eq!(interner.get("missing"), None);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
