//! String interning for names.
//!
//! Class names, type-parameter names and qualifier names are compared far
//! more often than they are printed. Interning turns every comparison into a
//! `u32` compare and keeps one copy of each string.

use rustc_hash::FxHashMap;

/// An interned string handle.
///
/// Only meaningful together with the [`Interner`] that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Single-threaded string interner.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    map: FxHashMap<String, Atom>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing atom if it was seen before.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(text.to_owned());
        self.map.insert(text.to_owned(), atom);
        atom
    }

    /// Look up an atom without interning.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    /// Resolve an atom back to its text.
    ///
    /// Atoms from a different interner resolve to the empty string.
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut interner = Interner::new();
        let a = interner.intern("Nullable");
        let b = interner.intern("NonNull");
        let c = interner.intern("Nullable");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn resolve_round_trips() {
        let mut interner = Interner::new();
        let atom = interner.intern("java.util.List");
        assert_eq!(interner.resolve(atom), "java.util.List");
        assert_eq!(interner.get("java.util.List"), Some(atom));
        assert_eq!(interner.get("java.util.Map"), None);
    }

    #[test]
    fn foreign_atom_resolves_empty() {
        let interner = Interner::new();
        assert!(interner.is_empty());
        assert_eq!(interner.resolve(Atom(42)), "");
    }
}
